//! Pipeline error type.
//!
//! Every failure that aborts an upload run is a [`PipelineError`]. Failures of
//! a single item inside an otherwise successful remote call are never errors
//! here; they travel as [`crate::contract::AddResult`] entries instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::ServiceError;

/// Errors that abort an upload run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No path or URL was given at all.
    #[error("Nothing to upload")]
    NoInputs,

    /// Resolution finished but every input was skipped or empty.
    #[error("Nothing to upload in {}", .roots.join(", "))]
    NothingToUpload { roots: Vec<String> },

    /// Walking a filesystem root failed.
    #[error("Error while finding files in {root}: {source}")]
    Walk {
        root: String,
        #[source]
        source: walkdir::Error,
    },

    /// A URL input could not be parsed.
    #[error("Could not parse URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request header was not in `Key: Value` form.
    #[error("Invalid request header {0:?}: expected \"Key: Value\"")]
    InvalidHeader(String),

    /// The ledger store exists but could not be read.
    #[error("Could not read ledger {}: {source}", .path.display())]
    LedgerLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote service client could not be constructed.
    #[error("Could not connect to photo service: {0}")]
    Connect(ServiceError),

    /// The album lookup, album creation or batch add call itself failed.
    #[error("{0}")]
    Remote(ServiceError),

    /// The remote service answered with a result list that does not line up with the items.
    #[error("Photo service returned {actual} results for {expected} items")]
    ResultCountMismatch { expected: usize, actual: usize },

    /// Writing the pre-flight listing or the report failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Discovery,
    RemoteBatch,
    Io,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NoInputs
            | PipelineError::NothingToUpload { .. }
            | PipelineError::InvalidHeader(_)
            | PipelineError::LedgerLoad { .. }
            | PipelineError::Connect(_) => ErrorKind::Configuration,
            PipelineError::Walk { .. } | PipelineError::InvalidUrl { .. } => ErrorKind::Discovery,
            PipelineError::Remote(_) | PipelineError::ResultCountMismatch { .. } => {
                ErrorKind::RemoteBatch
            }
            PipelineError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
