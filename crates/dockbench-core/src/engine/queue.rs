use super::config::{BatchConfig, SortPolicy};
use super::job::{Job, JobState};
use super::progress::{Progress, ProgressReporter};
use super::runner::ProcessRunner;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed-concurrency polling queue over a batch of jobs.
///
/// A single control thread drives the whole batch: each pass visits every
/// job in a fixed order, launches pending jobs into free slots, and retires
/// jobs whose process has exited. Concurrency exists only as multiple live
/// child processes; the loop itself never blocks except for the configured
/// sleep between passes.
pub struct Queue {
    jobs: Vec<Job>,
    concurrent: usize,
    poll_interval: Duration,
}

impl Queue {
    /// Take ownership of the job list and fix the submission order once.
    pub fn new(mut jobs: Vec<Job>, config: &BatchConfig) -> Self {
        sort_jobs(&mut jobs, config.sort_policy);
        Self {
            jobs,
            concurrent: config.concurrent,
            poll_interval: config.poll_interval,
        }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }

    fn is_done(&self) -> bool {
        self.jobs.iter().all(|job| job.state().is_terminal())
    }

    /// Drive every job to a terminal state. Blocks the calling thread until
    /// the batch is done; individual job failures never abort the batch.
    pub fn execute(&mut self, runner: &dyn ProcessRunner, reporter: &ProgressReporter) {
        let total = self.jobs.len();
        info!(
            total,
            max_concurrent = self.concurrent,
            "executing jobs in the queue"
        );
        reporter.report(Progress::QueueStart {
            total,
            concurrent: self.concurrent,
        });

        while !self.is_done() {
            self.pass(runner, reporter, total);
            if !self.is_done() {
                std::thread::sleep(self.poll_interval);
            }
        }

        let complete = self.count(JobState::Complete);
        let failed = self.count(JobState::Failed);
        info!(complete, failed, "queue drained");
        reporter.report(Progress::QueueDone { complete, failed });
    }

    /// One polling pass over the whole job list, in the fixed sorted order.
    ///
    /// The running count is read and written only here, so a slot freed by
    /// an earlier job in the pass is immediately available to a later one,
    /// and the count never exceeds the cap at any submission decision.
    fn pass(&mut self, runner: &dyn ProcessRunner, reporter: &ProgressReporter, total: usize) {
        let mut running = self
            .jobs
            .iter()
            .filter(|job| job.state() == JobState::Running)
            .count();

        for i in 0..self.jobs.len() {
            let index = i + 1;
            let before = self.jobs[i].state();
            let state = self.jobs[i].poll();

            match state {
                JobState::Pending if running < self.concurrent => {
                    info!(job = %self.jobs[i].name(), index, total, "> Submitting");
                    reporter.report(Progress::JobSubmitted {
                        name: self.jobs[i].name().to_string(),
                        index,
                        total,
                    });
                    match self.jobs[i].launch(runner) {
                        JobState::Running => running += 1,
                        // Spawn failure: terminal without ever holding a slot.
                        terminal => {
                            info!(job = %self.jobs[i].name(), state = %terminal, index, total, "> Job finished");
                            reporter.report(Progress::JobFinished {
                                name: self.jobs[i].name().to_string(),
                                state: terminal,
                                index,
                                total,
                            });
                        }
                    }
                }
                JobState::Pending => {
                    debug!(job = %self.jobs[i].name(), "no free slot, job stays pending");
                }
                JobState::Running => {}
                terminal if before == JobState::Running => {
                    running -= 1;
                    info!(job = %self.jobs[i].name(), state = %terminal, index, total, "> Job finished");
                    reporter.report(Progress::JobFinished {
                        name: self.jobs[i].name().to_string(),
                        state: terminal,
                        index,
                        total,
                    });
                }
                // Already retired in an earlier pass; nothing to do.
                _ => {}
            }
        }
    }

    fn count(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|job| job.state() == state).count()
    }
}

fn sort_jobs(jobs: &mut [Job], policy: SortPolicy) {
    match policy {
        SortPolicy::SmallestFirst => {
            jobs.sort_by(|a, b| {
                a.input_size()
                    .cmp(&b.input_size())
                    .then_with(|| a.name().cmp(b.name()))
            });
        }
        SortPolicy::LargestFirst => {
            jobs.sort_by(|a, b| {
                b.input_size()
                    .cmp(&a.input_size())
                    .then_with(|| a.name().cmp(b.name()))
            });
        }
        SortPolicy::Alphabetical => {
            jobs.sort_by(|a, b| a.name().cmp(b.name()));
        }
    }
}
