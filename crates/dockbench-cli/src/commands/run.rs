use crate::cli::RunArgs;
use crate::config::{CliOverrides, PartialBenchConfig};
use crate::error::Result;
use crate::progress::CliProgressHandler;
use dockbench::engine::job::JobState;
use dockbench::engine::progress::ProgressReporter;
use dockbench::engine::runner::LocalProcessRunner;
use dockbench::workflows::bench;
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    let partial = PartialBenchConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial.merge_with_cli(&CliOverrides::from(&args))?;

    info!(
        scenarios = config.scenarios.len(),
        concurrent = config.batch.concurrent,
        poll_interval_secs = config.batch.poll_interval.as_secs(),
        sort = %config.batch.sort_policy,
        "configuration merged"
    );
    println!("Starting HADDOCK benchmark...");

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.callback());

    // The workflow is fully synchronous (the queue sleeps between polling
    // passes), so it runs on the blocking side of the runtime.
    let report =
        tokio::task::block_in_place(|| bench::run(&config, &LocalProcessRunner, &reporter))?;

    // A failed job is a result, not an error: the summary is the verdict
    // and the exit status stays zero.
    println!(
        "Benchmark finished: {} complete, {} failed ({} jobs).",
        report.complete(),
        report.failed(),
        report.jobs.len()
    );
    for job in report.jobs.iter().filter(|j| j.state == JobState::Failed) {
        warn!(job = %job.name, "job did not produce a completion marker");
        println!("  ✗ {}", job.name);
    }

    Ok(())
}
