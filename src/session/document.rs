//! One open project document.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rowan::NodeOrToken;
use text_size::{TextRange, TextSize};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info_span, trace, warn};

use super::error::SessionError;
use super::state::{Evaluation, LoadedDocument, SessionState, SessionStatus};
use crate::base::{Position, Range};
use crate::config::Configuration;
use crate::diagnostics::{Diagnostic, codes};
use crate::expression::{Expression, parse_expression};
use crate::lookup::{self, CorrelationIndex, LookupEntry};
use crate::model::{EvaluationEngine, EvaluationError, SourceLocation};
use crate::packages::{PackageRegistry, PackageSource, PackageVersion, SuggestionCache};
use crate::xml::{self, SyntaxKind, SyntaxNode, ast::AstNode};

/// The content an element closes at `end_tag`, when it is text or blank.
fn content_before(text: &str, end_tag: &SyntaxNode) -> Option<Expression> {
    if let Some(NodeOrToken::Node(previous)) = end_tag.prev_sibling_or_token() {
        if let Some(content) = xml::ast::Text::cast(previous) {
            return Some(parse_expression(&content.value(), content.range().start()));
        }
    }
    let element = end_tag.parent()?;
    let start_tag = element.children().find(|child| child.kind() == SyntaxKind::START_TAG)?;
    let content = TextRange::new(start_tag.text_range().end(), end_tag.text_range().start());
    let blank = element
        .children_with_tokens()
        .filter(|child| content.contains_range(child.text_range()))
        .all(|child| child.kind() == SyntaxKind::WHITESPACE);
    blank.then(|| parse_expression(&text[content], content.start()))
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), SessionError> {
    if cancel.is_cancelled() {
        Err(SessionError::Cancelled)
    } else {
        Ok(())
    }
}

/// Syntax tree, evaluation, correlation index and diagnostics of one document,
/// kept consistent across load / update / unload.
///
/// `load`, `update` and `unload` take the state lock exclusively; lookups and
/// suggestions share it. A tree and the evaluation built from it are always
/// swapped together under the exclusive lock, so readers never see a mix of
/// two revisions.
///
/// Cancellation is cooperative: it is checked before waiting for the lock and
/// right after acquiring it. An engine or registry call that has started runs
/// to completion, and its result is dropped if cancellation was requested
/// meanwhile.
pub struct DocumentSession<E: EvaluationEngine, R: PackageRegistry> {
    path: PathBuf,
    source: Arc<str>,
    engine: Arc<E>,
    registry: Arc<R>,
    configuration: watch::Receiver<Configuration>,
    state: RwLock<SessionState<E::Project>>,
    cache: SuggestionCache,
    span: tracing::Span,
}

impl<E: EvaluationEngine, R: PackageRegistry> DocumentSession<E, R> {
    pub fn new(
        path: impl Into<PathBuf>,
        engine: Arc<E>,
        registry: Arc<R>,
        configuration: watch::Receiver<Configuration>,
    ) -> Self {
        let path = path.into();
        let source: Arc<str> = Arc::from(path.display().to_string());
        let span = info_span!("document", path = %source);
        Self {
            path,
            source,
            engine,
            registry,
            configuration,
            state: RwLock::new(SessionState::default()),
            cache: SuggestionCache::new(),
            span,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Load / update / unload
    // =========================================================================

    /// Replace the text, then evaluate the project from storage.
    ///
    /// Any previous evaluation is released first. Ends in `Evaluated` or
    /// `EvaluationFailed`; package sources are refreshed afterwards.
    pub async fn load(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionStatus, SessionError> {
        self.load_inner(text, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn load_inner(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionStatus, SessionError> {
        check_cancelled(cancel)?;
        let mut state = self.state.write().await;
        check_cancelled(cancel)?;

        self.replace_document(&mut state, text);
        state.dirty = false;
        if let Some(previous) = state.evaluation.take() {
            self.release(previous.project);
        }

        let result = self.engine.load_from_path(&self.path).await;
        self.finish_evaluation(&mut state, result, cancel)?;

        check_cancelled(cancel)?;
        self.refresh_package_sources(&mut state).await;

        let status = state.status();
        debug!(?status, diagnostics = state.diagnostics.len(), "document loaded");
        Ok(status)
    }

    /// Read the document from storage, then [`load`](Self::load) it.
    pub async fn load_from_disk(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SessionStatus, SessionError> {
        check_cancelled(cancel)?;
        let text = tokio::fs::read_to_string(&self.path)
            .instrument(self.span.clone())
            .await?;
        self.load(&text, cancel).await
    }

    /// Replace the text with an in-memory revision and mark the session dirty.
    ///
    /// With a previous evaluation the engine reconciles it from the new text;
    /// without one the project is evaluated from storage and then reconciled.
    pub async fn update(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionStatus, SessionError> {
        self.update_inner(text, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn update_inner(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionStatus, SessionError> {
        check_cancelled(cancel)?;
        let mut state = self.state.write().await;
        check_cancelled(cancel)?;

        state.dirty = true;
        self.replace_document(&mut state, text);

        let result = match state.evaluation.take() {
            Some(Evaluation { project, .. }) => {
                trace!("reconciling existing evaluation");
                self.reconcile(project, text).await
            }
            None => match self.engine.load_from_path(&self.path).await {
                Ok(project) => self.reconcile(project, text).await,
                Err(err) => Err(err),
            },
        };
        self.finish_evaluation(&mut state, result, cancel)?;

        let status = state.status();
        debug!(?status, diagnostics = state.diagnostics.len(), "document updated");
        Ok(status)
    }

    /// Release the evaluation and drop the tree. Idempotent.
    pub async fn unload(&self) {
        self.unload_inner().instrument(self.span.clone()).await
    }

    async fn unload_inner(&self) {
        let mut state = self.state.write().await;
        if let Some(evaluation) = state.evaluation.take() {
            self.release(evaluation.project);
        }
        state.document = None;
        state.dirty = false;
        state.evaluation_failed = false;
        state.diagnostics.clear();
        trace!("document unloaded");
    }

    /// Ask the registry for the package sources configured around the
    /// document, keeping HTTP feeds only. Returns whether that succeeded.
    pub async fn configure_package_sources(
        &self,
        cancel: &CancellationToken,
    ) -> Result<bool, SessionError> {
        check_cancelled(cancel)?;
        let mut state = self.state.write().instrument(self.span.clone()).await;
        check_cancelled(cancel)?;
        Ok(self
            .refresh_package_sources(&mut state)
            .instrument(self.span.clone())
            .await)
    }

    fn replace_document(&self, state: &mut SessionState<E::Project>, text: &str) {
        state.diagnostics.clear();
        state.evaluation_failed = false;
        let document = LoadedDocument::parse(text);
        if !document.syntax_errors.is_empty() {
            trace!(errors = document.syntax_errors.len(), "document has syntax errors");
        }
        state.document = Some(document);
    }

    /// Reconcile a project from text; a project the engine fails to reconcile
    /// is released.
    async fn reconcile(&self, mut project: E::Project, text: &str) -> Result<E::Project, EvaluationError> {
        match self.engine.reconcile_from_text(&mut project, text).await {
            Ok(()) => {
                trace!("reconciled project from in-memory text");
                Ok(project)
            }
            Err(err) => {
                self.release(project);
                Err(err)
            }
        }
    }

    /// Install a finished evaluation, or record why there is none.
    fn finish_evaluation(
        &self,
        state: &mut SessionState<E::Project>,
        result: Result<E::Project, EvaluationError>,
        cancel: &CancellationToken,
    ) -> Result<(), SessionError> {
        if cancel.is_cancelled() {
            if let Ok(project) = result {
                self.release(project);
            }
            debug!("evaluation finished after cancellation; result dropped");
            return Err(SessionError::Cancelled);
        }

        let Some(document) = state.document.as_ref() else {
            return Err(SessionError::NotLoaded("document"));
        };

        match result {
            Ok(project) => {
                let lookup =
                    CorrelationIndex::build(&project, &self.path, &document.root(), &document.line_index);
                trace!(entries = lookup.len(), "correlation index built");
                state.evaluation = Some(Evaluation { project, lookup });
                state.evaluation_failed = false;
            }
            Err(EvaluationError::InvalidProject {
                message,
                code,
                location,
                end,
            }) => {
                let diagnostic =
                    self.invalid_project_diagnostic(document, &message, &code, location.as_ref(), end);
                debug!(code = %code, %message, "project rejected by evaluation engine");
                state.diagnostics.add(diagnostic);
                state.evaluation_failed = true;
            }
            Err(EvaluationError::Internal(message)) => {
                error!(%message, "error loading project");
                state.evaluation_failed = true;
            }
        }
        Ok(())
    }

    fn invalid_project_diagnostic(
        &self,
        document: &LoadedDocument,
        message: &str,
        code: &str,
        location: Option<&SourceLocation>,
        end: Option<Position>,
    ) -> Diagnostic {
        let line_index = &document.line_index;
        let span = self.failure_span(document, location, end);
        let range = line_index
            .span_to_range(span)
            .unwrap_or_else(|_| Range::from_coords(0, 0, 0, 0));
        let message = if message.trim().is_empty() {
            "the project could not be evaluated"
        } else {
            message
        };
        let code = if code.is_empty() {
            codes::INVALID_PROJECT
        } else {
            code
        };
        Diagnostic::error(Arc::clone(&self.source), span, range, message).with_code(code)
    }

    /// The range the engine reported. Without a usable end, the element or
    /// attribute starting at the reported location; the whole document when
    /// there is no usable location in this file.
    fn failure_span(
        &self,
        document: &LoadedDocument,
        location: Option<&SourceLocation>,
        end: Option<Position>,
    ) -> TextRange {
        let line_index = &document.line_index;
        let full = line_index.full_span();
        let Some(location) = location.filter(|l| l.is_in(&self.path)) else {
            return full;
        };
        let Ok(start) = line_index.position_to_offset(location.position()) else {
            return full;
        };

        let reported_end = end.and_then(|end| line_index.position_to_offset(end).ok());
        match reported_end {
            Some(end) if end > start => TextRange::new(start, end),
            _ => lookup::anchor(&document.root(), start)
                .map(|(span, _)| span)
                .unwrap_or_else(|| TextRange::empty(start)),
        }
    }

    fn release(&self, project: E::Project) {
        if let Err(err) = self.engine.unload(project) {
            error!(%err, "error unloading project");
        }
    }

    async fn refresh_package_sources(&self, state: &mut SessionState<E::Project>) -> bool {
        state.package_sources.clear();
        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        match self.registry.configured_sources(directory).await {
            Ok(sources) => {
                state.package_sources = sources.into_iter().filter(PackageSource::is_http).collect();
                debug!(sources = state.package_sources.len(), "package sources configured");
                true
            }
            Err(err) => {
                error!(%err, "error configuring package sources");
                false
            }
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Innermost syntax node at a position.
    pub async fn find_syntax_at(&self, position: Position) -> Result<Option<SyntaxNode>, SessionError> {
        let state = self.state.read().await;
        let document = state.document.as_ref().ok_or(SessionError::NotLoaded("document"))?;
        let offset = document.line_index.position_to_offset(position)?;
        Ok(xml::node_at_offset(&document.root(), offset))
    }

    /// Innermost evaluated object at a position.
    pub async fn find_evaluated_at(&self, position: Position) -> Result<Option<LookupEntry>, SessionError> {
        let state = self.state.read().await;
        let document = state.document.as_ref().ok_or(SessionError::NotLoaded("document"))?;
        let evaluation = state
            .evaluation
            .as_ref()
            .ok_or(SessionError::NotLoaded("evaluation"))?;
        Ok(evaluation.lookup.find_at(position, &document.line_index)?.cloned())
    }

    /// Parse a value that starts at `base` in this document.
    pub fn parse_expression(&self, value: &str, base: TextSize) -> Expression {
        parse_expression(value, base)
    }

    /// The expression of the attribute value or element text at a position.
    pub async fn expression_at(&self, position: Position) -> Result<Option<Expression>, SessionError> {
        let state = self.state.read().await;
        let document = state.document.as_ref().ok_or(SessionError::NotLoaded("document"))?;
        let offset = document.line_index.position_to_offset(position)?;
        let Some(node) = xml::node_at_offset(&document.root(), offset) else {
            return Ok(None);
        };
        let expression = match node.kind() {
            SyntaxKind::ATTRIBUTE_VALUE => xml::ast::AttributeValue::cast(node)
                .map(|value| parse_expression(&value.text(), value.content_range().start())),
            SyntaxKind::TEXT => {
                xml::ast::Text::cast(node).map(|text| parse_expression(&text.value(), text.range().start()))
            }
            SyntaxKind::END_TAG if node.text_range().start() == offset => content_before(&document.text, &node),
            _ => None,
        };
        Ok(expression)
    }

    // =========================================================================
    // Package suggestions
    // =========================================================================

    /// Package ids starting with `prefix`. Registry failures yield an empty
    /// set.
    pub async fn suggest_package_ids(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<String>, SessionError> {
        self.suggest_package_ids_inner(prefix, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn suggest_package_ids_inner(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<String>, SessionError> {
        check_cancelled(cancel)?;
        let state = self.state.read().await;
        check_cancelled(cancel)?;
        if state.document.is_none() {
            return Err(SessionError::NotLoaded("document"));
        }
        if let Some(cached) = self.cache.ids(prefix) {
            trace!(prefix, "package id suggestions from cache");
            return Ok(cached);
        }

        let include_prerelease = self.include_prerelease();
        let result = self
            .registry
            .suggest_ids(&state.package_sources, prefix, include_prerelease)
            .await;
        check_cancelled(cancel)?;

        match result {
            Ok(ids) => {
                self.cache.store_ids(prefix, &ids);
                Ok(ids)
            }
            Err(err) => {
                warn!(prefix, %err, "package id suggestions unavailable");
                Ok(BTreeSet::new())
            }
        }
    }

    /// Versions of a package. Registry failures yield an empty set.
    pub async fn suggest_package_versions(
        &self,
        package_id: &str,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<PackageVersion>, SessionError> {
        self.suggest_package_versions_inner(package_id, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn suggest_package_versions_inner(
        &self,
        package_id: &str,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<PackageVersion>, SessionError> {
        check_cancelled(cancel)?;
        let state = self.state.read().await;
        check_cancelled(cancel)?;
        if state.document.is_none() {
            return Err(SessionError::NotLoaded("document"));
        }
        if let Some(cached) = self.cache.versions(package_id) {
            trace!(package_id, "package version suggestions from cache");
            return Ok(cached);
        }

        let include_prerelease = self.include_prerelease();
        let result = self
            .registry
            .suggest_versions(&state.package_sources, package_id, include_prerelease)
            .await;
        check_cancelled(cancel)?;

        match result {
            Ok(versions) => {
                self.cache.store_versions(package_id, &versions);
                Ok(versions)
            }
            Err(err) => {
                warn!(package_id, %err, "package version suggestions unavailable");
                Ok(BTreeSet::new())
            }
        }
    }

    fn include_prerelease(&self) -> bool {
        self.configuration.borrow().include_prerelease
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status()
    }

    /// Diagnostics from the last load or update.
    pub async fn diagnostics(&self) -> Vec<Diagnostic> {
        self.state.read().await.diagnostics.diagnostics().to_vec()
    }

    pub async fn has_diagnostics(&self) -> bool {
        !self.state.read().await.diagnostics.is_empty()
    }

    /// Whether the text was changed in memory since the last load.
    pub async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }

    /// Whether a syntax tree is loaded.
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.document.is_some()
    }

    pub async fn has_evaluation(&self) -> bool {
        self.state.read().await.evaluation.is_some()
    }

    /// Text of the loaded revision.
    pub async fn text(&self) -> Option<Arc<str>> {
        self.state
            .read()
            .await
            .document
            .as_ref()
            .map(|d| Arc::clone(&d.text))
    }

    pub async fn package_sources(&self) -> Vec<PackageSource> {
        self.state.read().await.package_sources.clone()
    }
}
