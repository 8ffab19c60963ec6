use crate::cli::CheckArgs;
use crate::config::{CliOverrides, PartialBenchConfig};
use crate::error::Result;
use dockbench::core::dataset::Dataset;
use dockbench::core::haddock::Haddock;
use dockbench::workflows::bench::probe_installation;
use tracing::info;

/// Validate everything a benchmark would need, without starting any jobs.
pub async fn run(args: CheckArgs) -> Result<()> {
    let partial = PartialBenchConfig::from_file(&args.config)?;
    let config = partial.merge_with_cli(&CliOverrides::default())?;
    println!(
        "✓ Configuration is valid ({} scenarios).",
        config.scenarios.len()
    );

    let haddock = Haddock::locate(&config.haddock_path, &config.python2)?;
    info!(root = %haddock.root().display(), "located HADDOCK installation");
    probe_installation(&haddock)?;
    println!("✓ HADDOCK can be executed.");

    let dataset = Dataset::new(config.dataset_path.clone());
    dataset.check_input_files(&config.receptor_suffix, &config.ligand_suffix)?;
    let targets = dataset.targets()?.len();
    println!(
        "✓ Dataset inputs match the configured suffixes ({} targets).",
        targets
    );
    println!(
        "  A full run would schedule {} jobs.",
        targets * config.scenarios.len()
    );

    Ok(())
}
