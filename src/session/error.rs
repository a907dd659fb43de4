use thiserror::Error;

use crate::base::PositionError;

/// Errors returned by [`DocumentSession`](super::DocumentSession) operations.
///
/// Evaluation and registry failures are not here: they are absorbed into
/// diagnostics, logs and empty suggestion sets.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation needs state the session does not currently hold.
    #[error("{0} is not loaded")]
    NotLoaded(&'static str),

    #[error(transparent)]
    OutOfRange(#[from] PositionError),

    /// Cancellation was requested; any result produced meanwhile was dropped.
    #[error("operation cancelled")]
    Cancelled,

    /// Reading the document from storage failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}
