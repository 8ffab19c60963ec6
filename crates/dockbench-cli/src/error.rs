use dockbench::core::dataset::DatasetError;
use dockbench::core::haddock::HaddockError;
use dockbench::workflows::bench::BenchError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Bench(#[from] BenchError),

    #[error(transparent)]
    Haddock(#[from] HaddockError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
