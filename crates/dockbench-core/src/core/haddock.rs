use crate::engine::runner::CommandSpec;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tracing::{debug, info};

/// Expected in the probe output of a runnable HADDOCK invoked without a
/// `run.param`; anything else means the installation cannot execute at all.
pub const PROBE_EXPECT: &str = "run.cns OR run.param";

/// Lines in the setup-phase output that make that target's setup fatal.
pub const SETUP_ERROR_MARKERS: [&str; 3] = [
    "already exists => HADDOCK stopped",
    "could not",
    "does not contain an END statement",
];

#[derive(Debug, Error)]
pub enum HaddockError {
    #[error("{path} does not contain HADDOCK", path = path.display())]
    NotFound { path: PathBuf },

    #[error("HADDOCK could not be executed: {source}")]
    NotExecutable {
        #[source]
        source: std::io::Error,
    },

    #[error("HADDOCK could not be executed, check: {output}", output = output.display())]
    ProbeFailed { output: PathBuf },

    #[error("HADDOCK setup stopped: {line}")]
    SetupFailed { line: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An installed HADDOCK2.x: the installation root and the interpreter
/// command used to invoke its main script.
#[derive(Debug, Clone)]
pub struct Haddock {
    root: PathBuf,
    command: CommandSpec,
}

impl Haddock {
    /// Locate the main script (`*/*addock.py` under the installation root)
    /// and build the run command: `<python2> <script>` with `PYTHONPATH`
    /// pointing at the root.
    pub fn locate(root: &Path, python2: &Path) -> Result<Self, HaddockError> {
        let script = find_main_script(root).ok_or_else(|| HaddockError::NotFound {
            path: root.to_path_buf(),
        })?;
        debug!(script = %script.display(), "located HADDOCK main script");

        let command = CommandSpec::new(python2)
            .arg(&script)
            .env("PYTHONPATH", root);
        Ok(Self {
            root: root.to_path_buf(),
            command,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The command every job runs; the working directory is supplied per run.
    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// The CNS configuration file scenario overrides are validated against.
    pub fn run_cns_conf(&self) -> PathBuf {
        self.root.join("protocols/run.cns-conf")
    }

    /// Run HADDOCK once in a scratch directory with no `run.param` and check
    /// that it complains the expected way. Exit codes are meaningless here;
    /// only the probe output tells a working installation from a broken one.
    pub fn probe(&self, scratch: &Path) -> Result<(), HaddockError> {
        let output_path = scratch.join("haddock-probe.out");
        let out = File::create(&output_path)?;

        info!("checking that HADDOCK can be executed");
        self.command
            .command(scratch)
            .stdin(Stdio::null())
            .stdout(out)
            .stderr(Stdio::null())
            .status()
            .map_err(|source| HaddockError::NotExecutable { source })?;

        let content = std::fs::read_to_string(&output_path)?;
        if content.contains(PROBE_EXPECT) {
            let _ = std::fs::remove_file(&output_path);
            Ok(())
        } else {
            // Keep the output file so the user can inspect what went wrong.
            Err(HaddockError::ProbeFailed {
                output: output_path,
            })
        }
    }

    /// Execute the setup phase in a target directory, capturing stdout to
    /// `haddock.out-<run_name>`, then scan the capture for fatal markers.
    /// Returns the capture path on success.
    pub fn setup_run(&self, target: &Path, run_name: &str) -> Result<PathBuf, HaddockError> {
        let output_path = target.join(format!("haddock.out-{}", run_name));
        let out = File::create(&output_path)?;

        debug!(target = %target.display(), run_name, "running HADDOCK setup phase");
        self.command
            .command(target)
            .stdin(Stdio::null())
            .stdout(out)
            .status()
            .map_err(|source| HaddockError::NotExecutable { source })?;

        let content = std::fs::read_to_string(&output_path)?;
        for line in content.lines() {
            if SETUP_ERROR_MARKERS
                .iter()
                .any(|marker| line.contains(marker))
            {
                return Err(HaddockError::SetupFailed {
                    line: line.trim().to_string(),
                });
            }
        }
        Ok(output_path)
    }
}

fn find_main_script(root: &Path) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|dir| std::fs::read_dir(dir.path()).ok())
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with("addock.py"))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}
