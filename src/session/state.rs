use std::sync::Arc;

use rowan::GreenNode;

use crate::base::LineIndex;
use crate::diagnostics::DiagnosticCollector;
use crate::lookup::CorrelationIndex;
use crate::packages::PackageSource;
use crate::xml::{self, SyntaxError, SyntaxNode};

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Nothing loaded.
    Empty,
    /// Syntax tree only; no evaluation attempted yet (or it was cancelled).
    Loaded,
    /// Syntax tree plus evaluated project and correlation index.
    Evaluated,
    /// Syntax tree only; the last evaluation failed.
    EvaluationFailed,
}

/// One text revision: its tree and the line index built from the same text.
///
/// The green tree is stored rather than a `SyntaxNode` so the state stays
/// `Send + Sync`; roots are rebuilt on demand.
pub(super) struct LoadedDocument {
    pub(super) text: Arc<str>,
    pub(super) green: GreenNode,
    pub(super) syntax_errors: Vec<SyntaxError>,
    pub(super) line_index: LineIndex,
}

impl LoadedDocument {
    pub(super) fn parse(text: &str) -> Self {
        let parse = xml::parse(text);
        Self {
            text: Arc::from(text),
            green: parse.green,
            syntax_errors: parse.errors,
            line_index: LineIndex::new(text),
        }
    }

    pub(super) fn root(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }
}

/// An evaluated project and the index built from it. Always replaced as a
/// pair.
pub(super) struct Evaluation<P> {
    pub(super) project: P,
    pub(super) lookup: CorrelationIndex,
}

pub(super) struct SessionState<P> {
    pub(super) document: Option<LoadedDocument>,
    pub(super) evaluation: Option<Evaluation<P>>,
    pub(super) evaluation_failed: bool,
    pub(super) diagnostics: DiagnosticCollector,
    pub(super) dirty: bool,
    pub(super) package_sources: Vec<PackageSource>,
}

impl<P> Default for SessionState<P> {
    fn default() -> Self {
        Self {
            document: None,
            evaluation: None,
            evaluation_failed: false,
            diagnostics: DiagnosticCollector::new(),
            dirty: false,
            package_sources: Vec::new(),
        }
    }
}

impl<P> SessionState<P> {
    pub(super) fn status(&self) -> SessionStatus {
        match (&self.document, &self.evaluation) {
            (None, _) => SessionStatus::Empty,
            (Some(_), Some(_)) => SessionStatus::Evaluated,
            (Some(_), None) if self.evaluation_failed => SessionStatus::EvaluationFailed,
            (Some(_), None) => SessionStatus::Loaded,
        }
    }
}
