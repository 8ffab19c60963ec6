use crate::core::dataset::{Dataset, DatasetError};
use crate::core::haddock::{Haddock, HaddockError};
use crate::core::scenario::Scenario;
use crate::engine::config::BatchConfig;
use crate::engine::job::{Job, JobState};
use crate::engine::progress::ProgressReporter;
use crate::engine::queue::Queue;
use crate::engine::runner::ProcessRunner;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Haddock(#[from] HaddockError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a benchmark needs, assembled by the caller (the CLI merges
/// this from the TOML config file and command-line overrides).
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub haddock_path: PathBuf,
    pub python2: PathBuf,
    pub dataset_path: PathBuf,
    pub receptor_suffix: String,
    pub ligand_suffix: String,
    pub scenarios: Vec<Scenario>,
    pub batch: BatchConfig,
    /// Remove pre-existing run directories instead of aborting.
    pub force: bool,
}

/// Terminal outcome of one scheduled run.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub name: String,
    pub work_dir: PathBuf,
    pub state: JobState,
}

/// Per-job terminal states after the queue has drained. The scheduler itself
/// computes no aggregate verdict; summarizing is left to the caller.
#[derive(Debug, Clone, Default)]
pub struct BenchReport {
    pub jobs: Vec<JobOutcome>,
}

impl BenchReport {
    pub fn complete(&self) -> usize {
        self.count(JobState::Complete)
    }

    pub fn failed(&self) -> usize {
        self.count(JobState::Failed)
    }

    fn count(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|job| job.state == state).count()
    }
}

/// Run a full benchmark: validate, prepare, schedule, report.
///
/// Blocks the calling thread until every job is terminal. Configuration-time
/// problems (broken installation, malformed dataset, setup-phase failures)
/// abort before any job is scheduled; once the queue starts, individual job
/// failures are contained and the batch always runs to the end.
pub fn run(
    config: &BenchConfig,
    runner: &dyn ProcessRunner,
    reporter: &ProgressReporter,
) -> Result<BenchReport, BenchError> {
    let haddock = Haddock::locate(&config.haddock_path, &config.python2)?;
    probe_installation(&haddock)?;

    let dataset = Dataset::new(config.dataset_path.clone());
    dataset.check_input_files(&config.receptor_suffix, &config.ligand_suffix)?;

    let total_scenarios = config.scenarios.len();
    let mut prepared = Vec::new();
    for (i, scenario) in config.scenarios.iter().enumerate() {
        info!(
            scenario = %scenario.run_name,
            "setting up scenario {}/{}",
            i + 1,
            total_scenarios
        );
        let runs = dataset.setup(
            &haddock,
            scenario,
            &config.receptor_suffix,
            &config.ligand_suffix,
            config.force,
        )?;
        prepared.extend(runs);
    }

    info!(jobs = prepared.len(), "generating job list");
    let jobs: Vec<Job> = prepared
        .into_iter()
        .map(|run_dir| Job::new(run_dir, haddock.command().clone()))
        .collect();

    let mut queue = Queue::new(jobs, &config.batch);
    queue.execute(runner, reporter);

    let jobs = queue
        .into_jobs()
        .into_iter()
        .map(|job| JobOutcome {
            name: job.name().to_string(),
            work_dir: job.work_dir().to_path_buf(),
            state: job.state(),
        })
        .collect();
    Ok(BenchReport { jobs })
}

/// The executable probe needs somewhere to run that is not a prepared run
/// directory; a scratch directory under the system temp dir is used and
/// cleaned up unless the probe fails (its output is the error report).
pub fn probe_installation(haddock: &Haddock) -> Result<(), BenchError> {
    static PROBE_SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
    let scratch = std::env::temp_dir().join(format!(
        "dockbench-probe-{}-{}",
        std::process::id(),
        PROBE_SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&scratch)?;
    match haddock.probe(&scratch) {
        Ok(()) => {
            let _ = std::fs::remove_dir_all(&scratch);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
