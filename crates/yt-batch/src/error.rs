use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write audit record: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not extract a video ID from comment target '{0}'")]
    InvalidTarget(String),
}

impl BatchError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BatchError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BatchError::Write {
            path: path.into(),
            source,
        }
    }
}
