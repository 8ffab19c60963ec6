use super::runner::{CommandSpec, ProcessHandle, ProcessRunner, ProcessStatus};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Relative path whose presence in a run directory is the sole success
/// signal. HADDOCK writes it at the end of the water refinement stage; the
/// process exit code is deliberately ignored.
pub const COMPLETION_MARKER: &str = "structures/it1/water/file.list";

/// Captured stdout of the main run, inside the run directory.
pub const OUTPUT_FILE: &str = "haddock.out";

/// Captured stderr of the main run, inside the run directory.
pub const ERROR_FILE: &str = "haddock.err";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// No process has ever been started for this job.
    Pending,
    /// A child process is alive.
    Running,
    /// The process exited and the completion marker exists.
    Complete,
    /// The process exited without the marker, or could not be launched.
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Complete => "complete",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One scheduled HADDOCK invocation against one prepared run directory.
///
/// A job owns at most one live child process at any time. Its state is
/// re-derived on every poll from the child handle and the marker file;
/// terminal states are sticky and polling them again has no side effects.
pub struct Job {
    name: String,
    work_dir: PathBuf,
    command: CommandSpec,
    output_path: PathBuf,
    error_path: PathBuf,
    input_size: u64,
    state: JobState,
    child: Option<Box<dyn ProcessHandle>>,
}

impl Job {
    pub fn new(work_dir: PathBuf, command: CommandSpec) -> Self {
        let input_size = dir_size(&work_dir);
        Self {
            name: work_dir.display().to_string(),
            output_path: work_dir.join(OUTPUT_FILE),
            error_path: work_dir.join(ERROR_FILE),
            work_dir,
            command,
            input_size,
            state: JobState::Pending,
            child: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Total byte size of the run directory at construction time. Used only
    /// as the sort key for submission ordering; restraint complexity is not
    /// captured by this measure.
    pub fn input_size(&self) -> u64 {
        self.input_size
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn marker_path(&self) -> PathBuf {
        self.work_dir.join(COMPLETION_MARKER)
    }

    /// Re-derive the current state without blocking.
    ///
    /// While the child is alive this always yields `Running`, regardless of
    /// what is on disk. Once the child has exited, the job is classified
    /// exactly once: `Complete` if the marker file exists, `Failed` otherwise.
    pub fn poll(&mut self) -> JobState {
        if self.state.is_terminal() {
            return self.state;
        }
        let Some(child) = self.child.as_mut() else {
            return JobState::Pending;
        };
        match child.try_status() {
            Ok(ProcessStatus::Running) => JobState::Running,
            Ok(ProcessStatus::Exited) => {
                self.child = None;
                self.state = if self.marker_path().exists() {
                    JobState::Complete
                } else {
                    debug!(job = %self.name, "process exited without completion marker");
                    JobState::Failed
                };
                self.state
            }
            Err(e) => {
                warn!(job = %self.name, error = %e, "lost track of child process");
                self.child = None;
                self.state = JobState::Failed;
                self.state
            }
        }
    }

    /// Launch the external process for a pending job.
    ///
    /// On spawn failure the job goes straight to `Failed`; a missing binary
    /// or bad permissions are not transient, so there is no retry and the
    /// job never reports `Running`.
    pub fn launch(&mut self, runner: &dyn ProcessRunner) -> JobState {
        debug_assert_eq!(self.state, JobState::Pending);
        debug_assert!(self.child.is_none());
        match runner.launch(
            &self.command,
            &self.work_dir,
            &self.output_path,
            &self.error_path,
        ) {
            Ok(handle) => {
                self.child = Some(handle);
                self.state = JobState::Running;
            }
            Err(e) => {
                warn!(job = %self.name, error = %e, "failed to launch job");
                self.state = JobState::Failed;
            }
        }
        self.state
    }
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            match entry.metadata() {
                Ok(meta) if meta.is_dir() => dir_size(&path),
                Ok(meta) => meta.len(),
                Err(_) => 0,
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::runner::fake::{FakeOutcome, FakeRunner};
    use tempfile::tempdir;

    fn job_in(dir: &Path) -> Job {
        Job::new(dir.to_path_buf(), CommandSpec::new("haddock"))
    }

    #[test]
    fn new_job_is_pending_with_derived_paths() {
        let dir = tempdir().unwrap();
        let job = job_in(dir.path());
        assert_eq!(job.state(), JobState::Pending);
        assert_eq!(job.marker_path(), dir.path().join(COMPLETION_MARKER));
        assert_eq!(job.work_dir(), dir.path());
    }

    #[test]
    fn poll_before_launch_stays_pending() {
        let dir = tempdir().unwrap();
        let mut job = job_in(dir.path());
        assert_eq!(job.poll(), JobState::Pending);
        assert_eq!(job.poll(), JobState::Pending);
    }

    #[test]
    fn marker_present_at_exit_means_complete() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new();
        runner.script(dir.path(), FakeOutcome::RunFor { polls: 1, marker: true });

        let mut job = job_in(dir.path());
        assert_eq!(job.launch(&runner), JobState::Running);
        assert_eq!(job.poll(), JobState::Running);
        assert_eq!(job.poll(), JobState::Complete);
    }

    #[test]
    fn marker_absent_at_exit_means_failed_never_complete() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new();
        runner.script(dir.path(), FakeOutcome::RunFor { polls: 0, marker: false });

        let mut job = job_in(dir.path());
        job.launch(&runner);
        assert_eq!(job.poll(), JobState::Failed);
    }

    #[test]
    fn running_wins_over_marker_on_disk() {
        // Stale marker from a previous run must not complete a live job.
        let dir = tempdir().unwrap();
        let marker = dir.path().join(COMPLETION_MARKER);
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, "").unwrap();

        let runner = FakeRunner::new();
        runner.script(dir.path(), FakeOutcome::RunFor { polls: 2, marker: false });

        let mut job = job_in(dir.path());
        job.launch(&runner);
        assert_eq!(job.poll(), JobState::Running);
        assert_eq!(job.poll(), JobState::Running);
        assert_eq!(job.poll(), JobState::Complete);
    }

    #[test]
    fn spawn_failure_fails_without_passing_through_running() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new();
        runner.script(dir.path(), FakeOutcome::SpawnError);

        let mut job = job_in(dir.path());
        assert_eq!(job.launch(&runner), JobState::Failed);
        assert_eq!(job.state(), JobState::Failed);
    }

    #[test]
    fn terminal_states_are_idempotent_under_polling() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new();
        runner.script(dir.path(), FakeOutcome::RunFor { polls: 0, marker: true });

        let mut job = job_in(dir.path());
        job.launch(&runner);
        assert_eq!(job.poll(), JobState::Complete);
        for _ in 0..3 {
            assert_eq!(job.poll(), JobState::Complete);
        }
    }

    #[test]
    fn input_size_sums_nested_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdb"), vec![0u8; 100]).unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/b.pdb"), vec![0u8; 50]).unwrap();

        let job = job_in(dir.path());
        assert_eq!(job.input_size(), 150);
    }
}
