use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to create capture file '{path}': {source}", path = path.display())]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to poll child process: {0}")]
    Poll(#[source] std::io::Error),
}
