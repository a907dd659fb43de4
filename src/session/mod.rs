//! Document sessions.
//!
//! A [`DocumentSession`] moves through
//!
//! ```text
//! Empty ──load/update──▶ Evaluated
//!   ▲                       │ engine rejects / fails
//!   │                       ▼
//!   └──────unload────── EvaluationFailed (tree still usable)
//! ```
//!
//! and a [`Workspace`] keeps one session per open document.

mod document;
mod error;
mod state;
mod workspace;

pub use document::DocumentSession;
pub use error::SessionError;
pub use state::SessionStatus;
pub use workspace::Workspace;
