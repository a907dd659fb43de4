use std::future::Future;
use std::path::Path;

use thiserror::Error;

use super::object::{EvaluatedObject, SourceLocation};
use crate::base::Position;

/// Errors reported by an [`EvaluationEngine`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The engine rejected the document (bad XML, unknown element...).
    /// Becomes exactly one diagnostic.
    #[error("{message}")]
    InvalidProject {
        message: String,
        code: String,
        /// Where the reported range starts.
        location: Option<SourceLocation>,
        /// One-based end of the reported range, in the same file as
        /// `location`, when the engine knows it.
        end: Option<Position>,
    },

    /// Anything else the engine could not handle. Logged, never shown as a
    /// diagnostic.
    #[error("evaluation engine failure: {0}")]
    Internal(String),
}

impl EvaluationError {
    pub fn invalid_project(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::InvalidProject {
            message: message.into(),
            code: code.into(),
            location: None,
            end: None,
        }
    }

    /// Attach a location to an `InvalidProject` error; other errors are
    /// returned unchanged.
    pub fn at(self, location: SourceLocation) -> Self {
        match self {
            Self::InvalidProject {
                message, code, end, ..
            } => Self::InvalidProject {
                message,
                code,
                location: Some(location),
                end,
            },
            other => other,
        }
    }

    /// Attach the one-based end of the reported range. A zero line or
    /// column means the engine does not know it and leaves the end unset.
    pub fn through(self, end_line: u32, end_column: u32) -> Self {
        match self {
            Self::InvalidProject {
                message,
                code,
                location,
                ..
            } => {
                let end = Position::one_based(end_line, end_column);
                Self::InvalidProject {
                    message,
                    code,
                    location,
                    end: end.is_valid().then_some(end),
                }
            }
            other => other,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// A loaded, evaluated project.
pub trait EvaluatedProject {
    fn objects(&self) -> &[EvaluatedObject];
}

/// The external build-evaluation engine.
///
/// Calls may take a long time (imports, SDK resolution). Once started they run
/// to completion; callers decide afterwards whether to keep the result.
pub trait EvaluationEngine: Send + Sync + 'static {
    type Project: EvaluatedProject + Send + Sync + 'static;

    /// Evaluate the project file as it is stored on disk.
    fn load_from_path(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Self::Project, EvaluationError>> + Send;

    /// Re-evaluate an already loaded project from in-memory text, keeping
    /// whatever the engine caches between evaluations (resolved imports...).
    fn reconcile_from_text(
        &self,
        project: &mut Self::Project,
        text: &str,
    ) -> impl Future<Output = Result<(), EvaluationError>> + Send;

    /// Release a project back to the engine.
    fn unload(&self, project: Self::Project) -> Result<(), EvaluationError>;
}
