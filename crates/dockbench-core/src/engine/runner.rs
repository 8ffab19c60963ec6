use super::error::EngineError;
use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tracing::debug;

/// An external command: program, arguments, and extra environment variables.
///
/// The working directory is not baked in; it is passed explicitly at launch
/// time so one command can be reused across every run directory of a
/// benchmark.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Build a std [`Command`] with the working directory set explicitly.
    pub fn command(&self, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(work_dir);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Observed state of a launched process. Success and failure are not
/// distinguished here: the exit code of the wrapped tool is not a reliable
/// signal, so classification is done by the job from filesystem artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Exited,
}

/// Owned handle to one live child process.
pub trait ProcessHandle: Send {
    /// Non-blocking status check; never waits for exit.
    fn try_status(&mut self) -> Result<ProcessStatus, EngineError>;
}

/// The seam between the queue and the operating system. Jobs are launched
/// through a runner capability rather than owning process management
/// themselves, so tests can substitute a scripted implementation.
pub trait ProcessRunner {
    /// Start `command` asynchronously in `work_dir`, with stdout and stderr
    /// redirected to freshly truncated files at the given paths.
    fn launch(
        &self,
        command: &CommandSpec,
        work_dir: &Path,
        stdout_path: &Path,
        stderr_path: &Path,
    ) -> Result<Box<dyn ProcessHandle>, EngineError>;
}

/// Launches commands as local OS child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcessRunner;

impl ProcessRunner for LocalProcessRunner {
    fn launch(
        &self,
        command: &CommandSpec,
        work_dir: &Path,
        stdout_path: &Path,
        stderr_path: &Path,
    ) -> Result<Box<dyn ProcessHandle>, EngineError> {
        let capture = |path: &Path| -> Result<File, EngineError> {
            File::create(path).map_err(|source| EngineError::Capture {
                path: path.to_path_buf(),
                source,
            })
        };
        let stdout = capture(stdout_path)?;
        let stderr = capture(stderr_path)?;

        let child = command
            .command(work_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: command.program().to_string_lossy().into_owned(),
                source,
            })?;

        debug!(
            pid = child.id(),
            work_dir = %work_dir.display(),
            "spawned child process"
        );
        Ok(Box::new(LocalProcessHandle { child }))
    }
}

struct LocalProcessHandle {
    child: Child,
}

impl ProcessHandle for LocalProcessHandle {
    fn try_status(&mut self) -> Result<ProcessStatus, EngineError> {
        match self.child.try_wait() {
            Ok(None) => Ok(ProcessStatus::Running),
            Ok(Some(_)) => Ok(ProcessStatus::Exited),
            Err(source) => Err(EngineError::Poll(source)),
        }
    }
}
