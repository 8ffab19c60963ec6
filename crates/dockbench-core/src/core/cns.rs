use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// CNS parameter lines look like `{===>} structures_0=1000;`.
static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{===>\}\s(\w*)=(.*);").unwrap());

#[derive(Debug, Error)]
pub enum CnsError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collect every parameter name declared in a CNS configuration file
/// (`protocols/run.cns-conf`). Used to validate scenario overrides before
/// any run is prepared.
pub fn load_cns_params(path: &Path) -> Result<BTreeSet<String>, CnsError> {
    let content = std::fs::read_to_string(path).map_err(|source| CnsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .filter_map(|line| PARAM_RE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect())
}

/// Render an override value the way CNS expects it: booleans lowercase,
/// everything else as written in the TOML scenario.
pub fn format_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Rewrite a `run.cns`, substituting the scenario overrides into matching
/// `{===>}` parameter lines; every other line is preserved verbatim.
///
/// The rewritten copy is placed next to the original as `run.cns-edit` and
/// its path returned; the caller decides when to move it over the original.
pub fn edit_run_cns(
    run_cns: &Path,
    parameters: &BTreeMap<String, toml::Value>,
) -> Result<PathBuf, CnsError> {
    let content = std::fs::read_to_string(run_cns).map_err(|source| CnsError::Read {
        path: run_cns.to_path_buf(),
        source,
    })?;

    let mut edited = String::with_capacity(content.len());
    for line in content.lines() {
        if line.starts_with("{===>}") {
            if let Some(caps) = PARAM_RE.captures(line) {
                let (param, value) = (&caps[1], &caps[2]);
                if let Some(custom) = parameters.get(param) {
                    let custom = format_value(custom);
                    if custom != value {
                        debug!(param, from = value, to = %custom, "changing CNS parameter");
                        edited.push_str(&format!("{{===>}} {}={};\n", param, custom));
                        continue;
                    }
                }
            }
        }
        edited.push_str(line);
        edited.push('\n');
    }

    let edited_path = run_cns.with_file_name("run.cns-edit");
    std::fs::write(&edited_path, edited).map_err(|source| CnsError::Write {
        path: edited_path.clone(),
        source,
    })?;
    Ok(edited_path)
}
