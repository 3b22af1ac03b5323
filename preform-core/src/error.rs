//! Error taxonomy for pipeline stages

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input spreadsheet or folder is absent.
    #[error("required input not found: {0}")]
    MissingFile(PathBuf),

    /// A table has fewer columns than the consuming stage requires.
    #[error("table has {found} columns but the stage requires at least {required}")]
    MalformedTable { found: usize, required: usize },

    /// An output spreadsheet could not be written.
    #[error("failed to persist {path}: {reason}")]
    PersistFailure { path: PathBuf, reason: String },
}
