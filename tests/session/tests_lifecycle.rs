//! Load / update / unload transitions and the diagnostics they leave behind.

use std::sync::Arc;

use msbuild_lsp::diagnostics::codes;
use msbuild_lsp::model::{EvaluationError, SourceLocation};
use msbuild_lsp::{
    ConfigurationHandler, DocumentSession, LineIndex, Position, Range, SessionError, SessionStatus,
    Severity,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::fixtures::{PROJECT, PROJECT_EDITED, harness, offset_of, project_path};
use crate::helpers::mock_engine::MockEngine;
use crate::helpers::mock_registry::MockRegistry;

fn token() -> CancellationToken {
    CancellationToken::new()
}

// ============================================================================
// LOAD
// ============================================================================

#[tokio::test]
async fn test_load_evaluates_project() {
    let h = harness();
    assert_eq!(h.session.status().await, SessionStatus::Empty);

    let status = h.session.load(PROJECT, &token()).await.unwrap();

    assert_eq!(status, SessionStatus::Evaluated);
    assert!(h.session.has_evaluation().await);
    assert!(!h.session.has_diagnostics().await);
    assert!(!h.session.is_dirty().await);
    assert_eq!(h.session.text().await.as_deref(), Some(PROJECT));
    assert_eq!(h.engine.loads(), 1);
}

#[tokio::test]
async fn test_rejected_project_reports_engine_range() {
    let h = harness();
    h.engine.fail_loads(
        EvaluationError::invalid_project("The attribute \"Condition\" is malformed.", "MSB4092")
            .at(SourceLocation::new(project_path(), 4, 10))
            .through(4, 36),
    );

    let status = h.session.load(PROJECT, &token()).await.unwrap();
    assert_eq!(status, SessionStatus::EvaluationFailed);
    assert!(!h.session.has_evaluation().await);

    let diagnostics = h.session.diagnostics().await;
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.code.as_deref(), Some("MSB4092"));
    assert_eq!(&*diagnostic.message, "The attribute \"Condition\" is malformed.");
    assert_eq!(&*diagnostic.source, project_path().display().to_string());
    assert_eq!(&PROJECT[diagnostic.span], "Condition=\"'$(Bar)' == ''\"");
    assert_eq!(diagnostic.range, Range::from_coords(3, 9, 3, 35));
}

#[tokio::test]
async fn test_rejection_without_end_covers_element() {
    let h = harness();
    h.engine.fail_loads(
        EvaluationError::invalid_project("The element is malformed.", "MSB4067")
            .at(SourceLocation::new(project_path(), 4, 5)),
    );

    h.session.load(PROJECT, &token()).await.unwrap();

    let diagnostics = h.session.diagnostics().await;
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    let foo_start = offset_of(PROJECT, "<Foo");
    let foo_end = offset_of(PROJECT, "</Foo>") + "</Foo>".len() as u32;
    assert_eq!(u32::from(diagnostic.span.start()), foo_start);
    assert_eq!(u32::from(diagnostic.span.end()), foo_end);
    assert_eq!(diagnostic.range.start, Position::new(3, 4));
}

#[tokio::test]
async fn test_reported_range_counts_characters() {
    let text = "<Project>\n  <PropertyGroup><Title>Économie</Title><Bad/></PropertyGroup>\n</Project>\n";
    let h = harness();
    // `<Bad/>` starts at character 41 of line 2 and ends before character 47.
    h.engine.fail_loads(
        EvaluationError::invalid_project("Unknown element.", "MSB4067")
            .at(SourceLocation::new(project_path(), 2, 41))
            .through(2, 47),
    );

    h.session.load(text, &token()).await.unwrap();

    let diagnostics = h.session.diagnostics().await;
    assert_eq!(&text[diagnostics[0].span], "<Bad/>");
    assert_eq!(diagnostics[0].range, Range::from_coords(1, 40, 1, 46));
}

#[tokio::test]
async fn test_rejection_without_location_covers_document() {
    let h = harness();
    h.engine.fail_loads(EvaluationError::invalid_project("  ", ""));

    h.session.load(PROJECT, &token()).await.unwrap();

    let diagnostics = h.session.diagnostics().await;
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code.as_deref(), Some(codes::INVALID_PROJECT));
    assert!(!diagnostic.message.trim().is_empty());
    assert_eq!(diagnostic.span, LineIndex::new(PROJECT).full_span());
    assert_eq!(diagnostic.range.start, Position::new(0, 0));
}

#[tokio::test]
async fn test_rejection_in_imported_file_covers_document() {
    let h = harness();
    h.engine.fail_loads(
        EvaluationError::invalid_project("Imported project is invalid.", "MSB4024")
            .at(SourceLocation::new("/sdk/Sdk.targets", 12, 3)),
    );

    h.session.load(PROJECT, &token()).await.unwrap();

    let diagnostics = h.session.diagnostics().await;
    assert_eq!(diagnostics[0].span, LineIndex::new(PROJECT).full_span());
}

#[tokio::test]
async fn test_engine_failure_is_logged_not_reported() {
    let h = harness();
    h.engine.fail_loads(EvaluationError::internal("engine crashed"));

    let status = h.session.load(PROJECT, &token()).await.unwrap();

    assert_eq!(status, SessionStatus::EvaluationFailed);
    assert!(h.session.diagnostics().await.is_empty());
    assert!(h.session.is_loaded().await);
}

#[tokio::test]
async fn test_reload_replaces_diagnostics_and_releases_project() {
    let h = harness();
    h.engine.fail_loads(EvaluationError::invalid_project("bad", "MSB4025"));
    h.session.load(PROJECT, &token()).await.unwrap();
    assert!(h.session.has_diagnostics().await);

    h.engine.succeed();
    assert_eq!(h.session.load(PROJECT, &token()).await.unwrap(), SessionStatus::Evaluated);
    assert!(!h.session.has_diagnostics().await);

    h.session.load(PROJECT, &token()).await.unwrap();
    assert_eq!(h.engine.loads(), 2);
    assert_eq!(h.engine.live_projects(), 1);
}

#[tokio::test]
async fn test_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lib.csproj");
    std::fs::write(&path, PROJECT).unwrap();

    let engine = Arc::new(MockEngine::new());
    let configuration = ConfigurationHandler::default();
    let session = DocumentSession::new(
        &path,
        Arc::clone(&engine),
        Arc::new(MockRegistry::new()),
        configuration.subscribe(),
    );

    let status = session.load_from_disk(&token()).await.unwrap();
    assert_eq!(status, SessionStatus::Evaluated);
    assert_eq!(session.text().await.as_deref(), Some(PROJECT));
    assert_eq!(session.path(), path.as_path());
}

#[tokio::test]
async fn test_load_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let session = DocumentSession::new(
        dir.path().join("missing.csproj"),
        Arc::new(MockEngine::new()),
        Arc::new(MockRegistry::new()),
        ConfigurationHandler::default().subscribe(),
    );

    let err = session.load_from_disk(&token()).await.unwrap_err();
    assert!(matches!(err, SessionError::Io(_)));
    assert_eq!(session.status().await, SessionStatus::Empty);
}

// ============================================================================
// UPDATE
// ============================================================================

#[tokio::test]
async fn test_update_reconciles_existing_evaluation() {
    let h = harness();
    h.session.load(PROJECT, &token()).await.unwrap();

    let status = h.session.update(PROJECT_EDITED, &token()).await.unwrap();

    assert_eq!(status, SessionStatus::Evaluated);
    assert!(h.session.is_dirty().await);
    assert_eq!(h.session.text().await.as_deref(), Some(PROJECT_EDITED));
    assert_eq!(h.engine.loads(), 1);
    assert_eq!(h.engine.reconciles(), 1);
    assert_eq!(h.engine.live_projects(), 1);

    h.session.load(PROJECT, &token()).await.unwrap();
    assert!(!h.session.is_dirty().await);
}

#[tokio::test]
async fn test_update_without_evaluation_loads_then_reconciles() {
    let h = harness();

    let status = h.session.update(PROJECT_EDITED, &token()).await.unwrap();

    assert_eq!(status, SessionStatus::Evaluated);
    assert_eq!(h.engine.loads(), 1);
    assert_eq!(h.engine.reconciles(), 1);
    assert!(h.session.is_dirty().await);
}

#[tokio::test]
async fn test_failed_reconcile_releases_project() {
    let h = harness();
    h.session.load(PROJECT, &token()).await.unwrap();
    h.engine.fail_reconciles(
        EvaluationError::invalid_project("Unexpected element.", "MSB4067")
            .at(SourceLocation::new(project_path(), 3, 5)),
    );

    let status = h.session.update(PROJECT_EDITED, &token()).await.unwrap();

    assert_eq!(status, SessionStatus::EvaluationFailed);
    assert_eq!(h.engine.live_projects(), 0);
    let diagnostics = h.session.diagnostics().await;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range.start, Position::new(2, 4));
}

// ============================================================================
// UNLOAD
// ============================================================================

#[tokio::test]
async fn test_unload_is_idempotent() {
    let h = harness();
    h.session.load(PROJECT, &token()).await.unwrap();

    h.session.unload().await;
    h.session.unload().await;

    assert_eq!(h.session.status().await, SessionStatus::Empty);
    assert!(!h.session.is_loaded().await);
    assert_eq!(h.session.text().await, None);
    assert_eq!(h.engine.unloads(), 1);
    assert_eq!(h.engine.live_projects(), 0);
}

#[tokio::test]
async fn test_unload_clears_failure() {
    let h = harness();
    h.engine.fail_loads(EvaluationError::invalid_project("bad", "MSB4025"));
    h.session.load(PROJECT, &token()).await.unwrap();

    h.session.unload().await;

    assert_eq!(h.session.status().await, SessionStatus::Empty);
    assert!(!h.session.has_diagnostics().await);
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_start_changes_nothing() {
    let h = harness();
    let cancel = token();
    cancel.cancel();

    let err = h.session.load(PROJECT, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(h.session.status().await, SessionStatus::Empty);
    assert_eq!(h.engine.loads(), 0);
}

#[tokio::test]
async fn test_cancelled_during_evaluation_drops_result() {
    let h = harness();
    let cancel = token();
    h.engine.cancel_during_evaluation(cancel.clone());

    let err = h.session.load(PROJECT, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(h.session.status().await, SessionStatus::Loaded);
    assert!(!h.session.has_evaluation().await);
    assert_eq!(h.engine.loads(), 1);
    assert_eq!(h.engine.live_projects(), 0);
}

#[tokio::test]
async fn test_cancelled_update_keeps_new_text() {
    let h = harness();
    h.session.load(PROJECT, &token()).await.unwrap();
    let cancel = token();
    h.engine.cancel_during_evaluation(cancel.clone());

    let err = h.session.update(PROJECT_EDITED, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(h.session.text().await.as_deref(), Some(PROJECT_EDITED));
    assert_eq!(h.session.status().await, SessionStatus::Loaded);
    assert_eq!(h.engine.live_projects(), 0);
}
