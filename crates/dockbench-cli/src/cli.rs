use clap::{Args, Parser, Subcommand};
use dockbench::engine::config::SortPolicy;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "dockbench - A batch runner for HADDOCK docking benchmarks: prepares one run per dataset target and scenario, and drives them all through a fixed-concurrency queue.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full benchmark: validate, set up every scenario, execute the job queue.
    Run(RunArgs),
    /// Validate the configuration, the HADDOCK installation, and the dataset without starting any jobs.
    Check(CheckArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the benchmark configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Forcefully remove pre-existing run directories instead of aborting.
    #[arg(long)]
    pub force: bool,

    /// Override the maximum number of concurrently running jobs.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub concurrent: Option<usize>,

    /// Override the seconds slept between queue polling passes.
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Override the job submission order
    /// (smallest-first, largest-first, or alphabetical).
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortPolicy>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the benchmark configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse_with_overrides() {
        let cli = Cli::parse_from([
            "dockbench",
            "run",
            "-c",
            "bench.toml",
            "--force",
            "-j",
            "4",
            "--sort",
            "largest-first",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("bench.toml"));
                assert!(args.force);
                assert_eq!(args.concurrent, Some(4));
                assert_eq!(args.sort, Some(SortPolicy::LargestFirst));
                assert_eq!(args.poll_interval, None);
            }
            _ => panic!("expected 'run' subcommand"),
        }
    }

    #[test]
    fn invalid_sort_order_is_rejected() {
        let result = Cli::try_parse_from(["dockbench", "run", "-c", "x.toml", "--sort", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["dockbench", "-v", "-q", "check", "-c", "x.toml"]);
        assert!(result.is_err());
    }
}
