use super::cns;
use super::haddock::{Haddock, HaddockError};
use super::scenario::Scenario;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("No PDB input matches the suffix: {suffix} at folder {target}/")]
    SuffixNotFound { target: String, suffix: String },

    #[error(
        "Run folder already exists: {path} (resuming is not supported, remove it or pass --force)",
        path = path.display()
    )]
    RunExists { path: PathBuf },

    #[error(transparent)]
    Haddock(#[from] HaddockError),

    #[error(transparent)]
    Cns(#[from] cns::CnsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A benchmark dataset: one subdirectory per docking target, each holding
/// receptor and ligand PDB files distinguished by configurable suffixes.
pub struct Dataset {
    path: PathBuf,
}

impl Dataset {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Target directories in deterministic (sorted) order. Plain files at
    /// the dataset root are ignored.
    pub fn targets(&self) -> Result<Vec<PathBuf>, DatasetError> {
        let mut targets: Vec<PathBuf> = std::fs::read_dir(&self.path)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        targets.sort();
        Ok(targets)
    }

    /// Check that every target holds at least one receptor and one ligand
    /// matching the configured suffixes. Violations are batch-fatal: they
    /// are reported before any run directory is created.
    pub fn check_input_files(
        &self,
        receptor_suffix: &str,
        ligand_suffix: &str,
    ) -> Result<(), DatasetError> {
        for target in self.targets()? {
            for suffix in [receptor_suffix, ligand_suffix] {
                if pdb_matches(&target, suffix)?.is_empty() {
                    return Err(DatasetError::SuffixNotFound {
                        target: target
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        suffix: suffix.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Prepare one run per target for a scenario and return the created run
    /// directories, ready to be scheduled.
    ///
    /// For each target this writes `run.param-<run_name>` (and `run.param`),
    /// drives the HADDOCK setup phase, rewrites the generated `run.cns` with
    /// the scenario overrides (keeping a `run.cns-ori` backup), and copies
    /// custom ligand topology/parameter files into the run when present.
    pub fn setup(
        &self,
        haddock: &Haddock,
        scenario: &Scenario,
        receptor_suffix: &str,
        ligand_suffix: &str,
        force: bool,
    ) -> Result<Vec<PathBuf>, DatasetError> {
        let mut prepared = Vec::new();

        for target in self.targets()? {
            debug!(target = %target.display(), "setting up target");
            let run_dir = target.join(format!("run-{}", scenario.run_name));

            if run_dir.exists() {
                warn!(run_dir = %run_dir.display(), "run folder already exists");
                if force {
                    warn!(run_dir = %run_dir.display(), "force removing");
                    std::fs::remove_dir_all(&run_dir)?;
                } else {
                    return Err(DatasetError::RunExists { path: run_dir });
                }
            }

            let receptors = require_matches(&target, receptor_suffix)?;
            let ligands = require_matches(&target, ligand_suffix)?;

            let run_param = self.write_run_param(
                haddock,
                scenario,
                &target,
                &receptors,
                receptor_suffix,
                &ligands,
                ligand_suffix,
            )?;
            std::fs::copy(&run_param, target.join("run.param"))?;

            // Custom ligand toppar is detected before setup so it can be
            // copied into the run directory the setup phase creates.
            let ligand_top = target.join("ligand.top");
            let ligand_param = target.join("ligand.param");
            let has_toppar = ligand_top.exists() && ligand_param.exists();

            haddock.setup_run(&target, &scenario.run_name)?;

            let run_cns = run_dir.join("run.cns");
            std::fs::copy(&run_cns, run_dir.join("run.cns-ori"))?;
            let edited = cns::edit_run_cns(&run_cns, &scenario.parameters)?;
            std::fs::copy(&edited, &run_cns)?;

            if has_toppar {
                debug!("ligand param/top found, adding it to run");
                std::fs::copy(&ligand_top, run_dir.join("toppar/ligand.top"))?;
                std::fs::copy(&ligand_param, run_dir.join("toppar/ligand.param"))?;
            }

            prepared.push(run_dir);
        }

        Ok(prepared)
    }

    #[allow(clippy::too_many_arguments)]
    fn write_run_param(
        &self,
        haddock: &Haddock,
        scenario: &Scenario,
        target: &Path,
        receptors: &[PathBuf],
        receptor_suffix: &str,
        ligands: &[PathBuf],
        ligand_suffix: &str,
    ) -> Result<PathBuf, DatasetError> {
        let mut content = String::new();
        if let Some(ambig) = &scenario.ambig_tbl {
            content.push_str(&format!("AMBIG_TBL={}\n", ambig));
        }
        content.push_str(&format!("PDB_FILE1={}\n", receptors[0].display()));
        content.push_str(&format!("PDB_FILE2={}\n", ligands[0].display()));

        if receptors.len() > 1 {
            let list = self.write_ensemble_list(target, receptors, receptor_suffix)?;
            content.push_str(&format!("PDB_LIST1={}\n", list.display()));
        }
        if ligands.len() > 1 {
            let list = self.write_ensemble_list(target, ligands, ligand_suffix)?;
            content.push_str(&format!("PDB_LIST2={}\n", list.display()));
        }

        content.push_str(&format!("PROJECT_DIR={}\n", target.display()));
        content.push_str("N_COMP=2\n");
        content.push_str(&format!("RUN_NUMBER=-{}\n", scenario.run_name));
        content.push_str(&format!("HADDOCK_DIR={}\n", haddock.root().display()));
        content.push_str("PROT_SEGID_1=A\n");
        content.push_str("PROT_SEGID_2=B\n");

        let path = target.join(format!("run.param-{}", scenario.run_name));
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Multiple PDBs sharing a suffix form an ensemble: HADDOCK takes them
    /// as a `.list` file of quoted absolute paths.
    fn write_ensemble_list(
        &self,
        target: &Path,
        members: &[PathBuf],
        suffix: &str,
    ) -> Result<PathBuf, DatasetError> {
        let first = members[0]
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = first.split(suffix).next().unwrap_or_default();
        let list_path = target.join(format!("{}{}.list", stem, suffix));

        let mut content = String::new();
        for member in members {
            content.push_str(&format!("\"{}\"\n", member.display()));
        }
        std::fs::write(&list_path, content)?;
        Ok(list_path)
    }
}

fn require_matches(target: &Path, suffix: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let matches = pdb_matches(target, suffix)?;
    if matches.is_empty() {
        return Err(DatasetError::SuffixNotFound {
            target: target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            suffix: suffix.to_string(),
        });
    }
    Ok(matches)
}

/// PDB files in a target matching a suffix, either plain (`1abc_r_u.pdb`) or
/// numbered ensemble members (`1abc_r_u_3.pdb`). Coarse-grained variants
/// (file names containing `cg`) are excluded. Sorted, so ensemble member
/// order is stable.
fn pdb_matches(target: &Path, suffix: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let pattern = format!(r"(.*{}_?)(\d.pdb|.pdb)", regex::escape(suffix));
    let re = Regex::new(&pattern).expect("escaped suffix always forms a valid pattern");

    let mut found: Vec<PathBuf> = std::fs::read_dir(target)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.ends_with("pdb") && !name.contains("cg") && re.is_match(name)
                })
        })
        .collect();
    found.sort();
    Ok(found)
}
