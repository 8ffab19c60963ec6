use dockbench::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Adapts engine progress events to an indicatif bar on stderr: one tick per
/// finished job, with submission and completion lines printed above the bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::bar_style())
            .with_message("Waiting for jobs...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::QueueStart { total, concurrent } => {
                    pb.reset();
                    pb.set_length(total as u64);
                    pb.set_position(0);
                    pb.set_message(format!("max {} concurrent", concurrent));
                }
                Progress::JobSubmitted { name, index, total } => {
                    pb.println(format!("> Submitting {} [{}/{}]", name, index, total));
                }
                Progress::JobFinished {
                    name,
                    state,
                    index,
                    total,
                } => {
                    pb.inc(1);
                    pb.println(format!("> Job {} - {} [{}/{}]", name, state, index, total));
                }
                Progress::QueueDone { complete, failed } => {
                    pb.finish_with_message(format!("{} complete, {} failed", complete, failed));
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} jobs ({msg})")
            .expect("Failed to create bar style template")
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
