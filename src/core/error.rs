use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the comparison library layer.
///
/// Command entry points wrap these in `anyhow::Error`; the engine matches on
/// them to decide whether a unit of work is skipped or the run stops.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("MODE must be one of 'A_to_B', 'B_to_A', or 'BOTH' (got '{0}')")]
    InvalidMode(String),

    #[error("Folder does not exist or is not a directory: {}", .0.display())]
    MissingFolder(PathBuf),

    #[error("Error reading file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CompareError {
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CompareError::FileRead {
            path: path.into(),
            source,
        }
    }
}

pub type CompareResult<T> = std::result::Result<T, CompareError>;
