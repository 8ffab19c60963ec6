use super::job::JobState;

#[derive(Debug, Clone)]
pub enum Progress {
    /// The queue is about to start its first pass.
    QueueStart { total: usize, concurrent: usize },

    /// A pending job was handed a free slot and launched.
    JobSubmitted {
        name: String,
        index: usize,
        total: usize,
    },

    /// A job reached a terminal state. Reported exactly once per job.
    JobFinished {
        name: String,
        state: JobState,
        index: usize,
        total: usize,
    },

    /// Every job is terminal and the queue is done.
    QueueDone { complete: usize, failed: usize },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
