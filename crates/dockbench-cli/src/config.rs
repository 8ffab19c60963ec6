use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use dockbench::core::cns;
use dockbench::core::haddock::Haddock;
use dockbench::core::scenario::Scenario;
use dockbench::engine::config::{BatchConfigBuilder, SortPolicy};
use dockbench::workflows::bench::BenchConfig;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialGeneral {
    dataset_path: Option<PathBuf>,
    haddock_path: Option<PathBuf>,
    python2: Option<PathBuf>,
    receptor_suffix: Option<String>,
    ligand_suffix: Option<String>,
    concurrent_jobs: Option<usize>,
    poll_interval_seconds: Option<u64>,
    sort_jobs: Option<SortPolicy>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialBenchConfig {
    general: Option<PartialGeneral>,
    #[serde(default)]
    scenario: BTreeMap<String, Scenario>,
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides {
    pub concurrent: Option<usize>,
    pub poll_interval: Option<u64>,
    pub sort: Option<SortPolicy>,
    pub force: bool,
}

impl From<&RunArgs> for CliOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            concurrent: args.concurrent,
            poll_interval: args.poll_interval,
            sort: args.sort,
            force: args.force,
        }
    }
}

impl PartialBenchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Validate the parsed config and merge in the CLI overrides.
    ///
    /// All batch-fatal configuration checks happen here, before any run
    /// directory is touched: required keys, path existence, suffix
    /// normalization, unique run names, and scenario parameters against the
    /// installed `run.cns-conf`.
    pub fn merge_with_cli(mut self, overrides: &CliOverrides) -> Result<BenchConfig> {
        let general = self
            .general
            .take()
            .ok_or_else(|| CliError::Config("Header not found: general".to_string()))?;

        let dataset_path = require_path(general.dataset_path, "dataset_path")?;
        let haddock_path = require_path(general.haddock_path, "haddock_path")?;
        let python2 = require_path(general.python2, "python2")?;

        let receptor_suffix = require_suffix(general.receptor_suffix, "receptor_suffix")?;
        let ligand_suffix = require_suffix(general.ligand_suffix, "ligand_suffix")?;

        if self.scenario.is_empty() {
            return Err(CliError::Config(
                "No scenarios have been found".to_string(),
            ));
        }

        let mut run_names = BTreeSet::new();
        for scenario in self.scenario.values() {
            if !run_names.insert(scenario.run_name.as_str()) {
                return Err(CliError::Config(format!(
                    "Run name invalid: {} (duplicated)",
                    scenario.run_name
                )));
            }
        }

        // Every scenario key that is not reserved must be a real CNS
        // parameter, or HADDOCK would silently ignore the override.
        let haddock = Haddock::locate(&haddock_path, &python2)?;
        let cns_params = cns::load_cns_params(&haddock.run_cns_conf())
            .map_err(|e| CliError::Config(format!("Failed to load CNS parameters: {}", e)))?;
        for scenario in self.scenario.values() {
            for param in scenario.parameters.keys() {
                if !cns_params.contains(param) {
                    return Err(CliError::Config(format!("Parameter invalid: {}", param)));
                }
            }
        }

        let mut builder = BatchConfigBuilder::new();
        if let Some(n) = overrides.concurrent.or(general.concurrent_jobs) {
            builder = builder.concurrent(n);
        }
        if let Some(seconds) = overrides.poll_interval.or(general.poll_interval_seconds) {
            builder = builder.poll_interval(Duration::from_secs(seconds));
        }
        if let Some(sort) = overrides.sort.or(general.sort_jobs) {
            builder = builder.sort_policy(sort);
        }
        let batch = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(BenchConfig {
            haddock_path,
            python2,
            dataset_path,
            receptor_suffix,
            ligand_suffix,
            scenarios: self.scenario.into_values().collect(),
            batch,
            force: overrides.force,
        })
    }
}

fn require_path(value: Option<PathBuf>, key: &str) -> Result<PathBuf> {
    let path =
        value.ok_or_else(|| CliError::Config(format!("Config key not defined: {}", key)))?;
    if path.as_os_str().is_empty() {
        return Err(CliError::Config(format!("Config key is empty: {}", key)));
    }
    if !path.exists() {
        return Err(CliError::Config(format!(
            "Path not found: {}",
            path.display()
        )));
    }
    Ok(path)
}

fn require_suffix(value: Option<String>, key: &str) -> Result<String> {
    let suffix =
        value.ok_or_else(|| CliError::Config(format!("Config key not defined: {}", key)))?;
    if suffix.is_empty() {
        return Err(CliError::Config(format!("Config key is empty: {}", key)));
    }
    // Users write "_r_u.pdb" and "_r_u" interchangeably.
    Ok(suffix.replace(".pdb", ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A minimal on-disk installation: a main script and a run.cns-conf
    /// declaring the parameters scenarios may override.
    fn fake_layout(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
        let haddock = root.join("haddock2.4");
        fs::create_dir_all(haddock.join("Haddock")).unwrap();
        fs::write(haddock.join("Haddock/RunHaddock.py"), "").unwrap();
        fs::create_dir_all(haddock.join("protocols")).unwrap();
        fs::write(
            haddock.join("protocols/run.cns-conf"),
            "{===>} structures_0=1000;\n{===>} noecv=true;\n",
        )
        .unwrap();

        let dataset = root.join("dataset");
        fs::create_dir_all(&dataset).unwrap();

        let python2 = root.join("python2");
        fs::write(&python2, "").unwrap();

        (haddock, dataset, python2)
    }

    fn base_config(haddock: &Path, dataset: &Path, python2: &Path) -> String {
        format!(
            r#"
            [general]
            dataset_path = "{}"
            haddock_path = "{}"
            python2 = "{}"
            receptor_suffix = "_r_u.pdb"
            ligand_suffix = "_l_u"

            [scenario.true-interface]
            run_name = "ti"
            ambig_tbl = "ti.tbl"
            structures_0 = 200
            "#,
            dataset.display(),
            haddock.display(),
            python2.display(),
        )
    }

    fn parse(content: &str, dir: &Path) -> PartialBenchConfig {
        let path = dir.join("bench.toml");
        fs::write(&path, content).unwrap();
        PartialBenchConfig::from_file(&path).unwrap()
    }

    #[test]
    fn valid_config_merges_with_defaults() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let partial = parse(&base_config(&haddock, &dataset, &python2), dir.path());
        let config = partial.merge_with_cli(&CliOverrides::default()).unwrap();

        assert_eq!(config.receptor_suffix, "_r_u");
        assert_eq!(config.ligand_suffix, "_l_u");
        assert_eq!(config.batch.concurrent, 10);
        assert_eq!(config.batch.poll_interval, Duration::from_secs(60));
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].run_name, "ti");
        assert!(!config.force);
    }

    #[test]
    fn cli_overrides_win_over_file_values() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let content = base_config(&haddock, &dataset, &python2).replace(
            "[general]",
            "[general]\nconcurrent_jobs = 5\npoll_interval_seconds = 120\n",
        );

        let overrides = CliOverrides {
            concurrent: Some(2),
            poll_interval: None,
            sort: Some(SortPolicy::Alphabetical),
            force: true,
        };
        let partial = parse(&content, dir.path());
        let config = partial.merge_with_cli(&overrides).unwrap();

        assert_eq!(config.batch.concurrent, 2);
        assert_eq!(config.batch.poll_interval, Duration::from_secs(120));
        assert_eq!(config.batch.sort_policy, SortPolicy::Alphabetical);
        assert!(config.force);
    }

    #[test]
    fn missing_general_header_is_rejected() {
        let dir = TempDir::new().unwrap();
        let partial = parse("[scenario.a]\nrun_name = \"a\"\n", dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("general")),
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, _, python2) = fake_layout(dir.path());

        let content = format!(
            "[general]\nhaddock_path = \"{}\"\npython2 = \"{}\"\nreceptor_suffix = \"_r_u\"\nligand_suffix = \"_l_u\"\n\n[scenario.a]\nrun_name = \"a\"\n",
            haddock.display(),
            python2.display(),
        );
        let partial = parse(&content, dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => {
                assert_eq!(msg, "Config key not defined: dataset_path");
            }
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn nonexistent_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, _, python2) = fake_layout(dir.path());

        let content = base_config(&haddock, &dir.path().join("no-such-dataset"), &python2);
        let partial = parse(&content, dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => assert!(msg.starts_with("Path not found:")),
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let content =
            base_config(&haddock, &dataset, &python2).replace("\"_l_u\"", "\"\"");
        let partial = parse(&content, dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => {
                assert_eq!(msg, "Config key is empty: ligand_suffix");
            }
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn config_without_scenarios_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let content = base_config(&haddock, &dataset, &python2);
        let content = &content[..content.find("[scenario").unwrap()];
        let partial = parse(content, dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => {
                assert_eq!(msg, "No scenarios have been found");
            }
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn duplicated_run_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let mut content = base_config(&haddock, &dataset, &python2);
        content.push_str("\n[scenario.second]\nrun_name = \"ti\"\n");
        let partial = parse(&content, dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("duplicated")),
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn unknown_cns_parameter_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let content = base_config(&haddock, &dataset, &python2)
            .replace("structures_0 = 200", "not_a_cns_param = 1");
        let partial = parse(&content, dir.path());
        let result = partial.merge_with_cli(&CliOverrides::default());
        match result {
            Err(CliError::Config(msg)) => {
                assert_eq!(msg, "Parameter invalid: not_a_cns_param");
            }
            other => panic!("expected Config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (haddock, dataset, python2) = fake_layout(dir.path());

        let partial = parse(&base_config(&haddock, &dataset, &python2), dir.path());
        let overrides = CliOverrides {
            concurrent: Some(0),
            ..Default::default()
        };
        let result = partial.merge_with_cli(&overrides);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn malformed_toml_reports_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.toml");
        fs::write(&path, "[general\ndataset_path =").unwrap();
        let result = PartialBenchConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
