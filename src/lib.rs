//! # msbuild-lsp-core
//!
//! Positional engine behind an editor service for MSBuild project files:
//! what sits at an offset, what can be completed there, and which diagnostic
//! applies to a span, kept current while the document is edited.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! session     → DocumentSession, Workspace (one session per open document)
//!   ↓
//! lookup      → correlation index (span ↔ evaluated object)
//!   ↓
//! model       → build-evaluation engine interface
//! packages    → package-registry interface, versions, suggestion cache
//! diagnostics → Severity, Diagnostic, DiagnosticCollector
//!   ↓
//! expression  → expression parser and arena-backed AST
//! xml         → tolerant, lossless XML syntax tree (logos + rowan)
//!   ↓
//! base        → Position, Range, LineIndex, TextRange
//! config      → client settings + change notification
//! ```
//!
//! The evaluation engine and the registry client are supplied by the host
//! through [`EvaluationEngine`] and [`PackageRegistry`]. No transport, no
//! logging subscriber: the host installs its own.

// ============================================================================
// MODULES (dependency order: base → xml → expression → model → lookup → session)
// ============================================================================

/// Foundation types: Position, Range, LineIndex, TextRange
pub mod base;

/// Client settings and change notification
pub mod config;

/// XML syntax tree: logos lexer, recursive-descent parser, typed wrappers
pub mod xml;

/// Expression sub-language of attribute and text values
pub mod expression;

/// Diagnostics reported against a document
pub mod diagnostics;

/// Build-evaluation engine interface and evaluated objects
pub mod model;

/// Package-registry interface and suggestion caching
pub mod packages;

/// Span ↔ evaluated-object correlation
pub mod lookup;

/// Per-document state machine and the workspace of open documents
pub mod session;

// Re-export foundation types
pub use base::{LineIndex, Position, PositionBase, PositionError, Range, TextRange, TextSize};

pub use config::{Configuration, ConfigurationHandler, LogLevel};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity};
pub use expression::{Expression, ExpressionKind, NodeId, parse_expression};
pub use lookup::{CorrelationIndex, LookupEntry};
pub use model::{
    EvaluatedObject, EvaluatedProject, EvaluationEngine, EvaluationError, ObjectHandle, ObjectKind,
    SourceLocation,
};
pub use packages::{PackageRegistry, PackageSource, PackageVersion, RegistryError};
pub use session::{DocumentSession, SessionError, SessionStatus, Workspace};
