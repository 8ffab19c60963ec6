use serde::Deserialize;
use std::collections::BTreeMap;

/// A named set of parameter overrides applied to every dataset target.
///
/// Each scenario produces one run directory per target, named
/// `run-<run_name>`. Besides the two reserved keys, every entry in a
/// scenario table is a CNS parameter override and is validated against the
/// installed `run.cns-conf` before any job starts.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub run_name: String,
    /// Ambiguous-restraints table, passed through to `run.param` untouched.
    pub ambig_tbl: Option<String>,
    #[serde(flatten)]
    pub parameters: BTreeMap<String, toml::Value>,
}
