//! Diagnostics: problems reported against one project document.
//!
//! A session refills its collector on every load or update; nothing is ever
//! appended across cycles.

use std::sync::Arc;

use text_size::TextRange;

use crate::base::Range;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Path of the document the diagnostic belongs to.
    pub source: Arc<str>,
    /// Absolute byte span.
    pub span: TextRange,
    /// The same location as zero-based line/column positions.
    pub range: Range,
    pub severity: Severity,
    /// Error/warning code (e.g., "MSB4025").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        source: impl Into<Arc<str>>,
        span: TextRange,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        let message = message.into();
        debug_assert!(!message.trim().is_empty(), "diagnostic message must not be blank");
        Self {
            source: source.into(),
            span,
            range: range.to_zero_based(),
            severity,
            code: None,
            message,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(
        source: impl Into<Arc<str>>,
        span: TextRange,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(Severity::Error, source, span, range, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(
        source: impl Into<Arc<str>>,
        span: TextRange,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(Severity::Warning, source, span, range, message)
    }

    pub fn info(
        source: impl Into<Arc<str>>,
        span: TextRange,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(Severity::Info, source, span, range, message)
    }

    pub fn hint(
        source: impl Into<Arc<str>>,
        span: TextRange,
        range: Range,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(Severity::Hint, source, span, range, message)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Codes used when the evaluation engine does not supply one.
pub mod codes {
    /// The project file could not be loaded.
    pub const INVALID_PROJECT: &str = "MSB4025";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one load/update cycle.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Clear all diagnostics.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}
