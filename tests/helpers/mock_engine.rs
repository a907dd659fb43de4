//! Scriptable in-memory evaluation engine.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use msbuild_lsp::model::{EvaluatedObject, EvaluatedProject, EvaluationEngine, EvaluationError};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct MockProject {
    pub objects: Vec<EvaluatedObject>,
    /// Text of the last reconciliation, if any.
    pub reconciled_with: Option<String>,
}

impl EvaluatedProject for MockProject {
    fn objects(&self) -> &[EvaluatedObject] {
        &self.objects
    }
}

#[derive(Default)]
pub struct MockEngine {
    objects: Mutex<Vec<EvaluatedObject>>,
    load_failure: Mutex<Option<EvaluationError>>,
    reconcile_failure: Mutex<Option<EvaluationError>>,
    cancel_during_evaluation: Mutex<Option<CancellationToken>>,
    pub loads: AtomicUsize,
    pub reconciles: AtomicUsize,
    pub unloads: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: Vec<EvaluatedObject>) -> Self {
        let engine = Self::new();
        *engine.objects.lock() = objects;
        engine
    }

    /// Every following `load_from_path` fails with `error`.
    pub fn fail_loads(&self, error: EvaluationError) {
        *self.load_failure.lock() = Some(error);
    }

    /// Every following `reconcile_from_text` fails with `error`.
    pub fn fail_reconciles(&self, error: EvaluationError) {
        *self.reconcile_failure.lock() = Some(error);
    }

    pub fn succeed(&self) {
        *self.load_failure.lock() = None;
        *self.reconcile_failure.lock() = None;
    }

    /// Cancel `token` while the next evaluation is in flight.
    pub fn cancel_during_evaluation(&self, token: CancellationToken) {
        *self.cancel_during_evaluation.lock() = Some(token);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn reconciles(&self) -> usize {
        self.reconciles.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }

    /// Projects handed out and not yet released.
    pub fn live_projects(&self) -> usize {
        self.loads() - self.unloads()
    }

    fn fire_cancellation(&self) {
        if let Some(token) = self.cancel_during_evaluation.lock().take() {
            token.cancel();
        }
    }
}

impl EvaluationEngine for MockEngine {
    type Project = MockProject;

    async fn load_from_path(&self, _path: &Path) -> Result<MockProject, EvaluationError> {
        self.fire_cancellation();
        if let Some(error) = self.load_failure.lock().clone() {
            return Err(error);
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(MockProject {
            objects: self.objects.lock().clone(),
            reconciled_with: None,
        })
    }

    async fn reconcile_from_text(
        &self,
        project: &mut MockProject,
        text: &str,
    ) -> Result<(), EvaluationError> {
        self.fire_cancellation();
        self.reconciles.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.reconcile_failure.lock().clone() {
            return Err(error);
        }
        project.objects = self.objects.lock().clone();
        project.reconciled_with = Some(text.to_string());
        Ok(())
    }

    fn unload(&self, _project: MockProject) -> Result<(), EvaluationError> {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
