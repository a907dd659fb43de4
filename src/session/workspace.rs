use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use super::document::DocumentSession;
use crate::config::Configuration;
use crate::model::EvaluationEngine;
use crate::packages::PackageRegistry;

/// The open documents, one independent [`DocumentSession`] each, in the order
/// they were opened.
pub struct Workspace<E: EvaluationEngine, R: PackageRegistry> {
    engine: Arc<E>,
    registry: Arc<R>,
    configuration: watch::Receiver<Configuration>,
    sessions: RwLock<IndexMap<PathBuf, Arc<DocumentSession<E, R>>>>,
}

impl<E: EvaluationEngine, R: PackageRegistry> Workspace<E, R> {
    pub fn new(engine: Arc<E>, registry: Arc<R>, configuration: watch::Receiver<Configuration>) -> Self {
        Self {
            engine,
            registry,
            configuration,
            sessions: RwLock::new(IndexMap::new()),
        }
    }

    /// The session for `path`, created empty if the document was not open.
    pub fn open(&self, path: impl Into<PathBuf>) -> Arc<DocumentSession<E, R>> {
        let path = path.into();
        if let Some(existing) = self.sessions.read().get(&path) {
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write();
        let session = sessions.entry(path).or_insert_with_key(|path| {
            debug!(path = %path.display(), "document opened");
            Arc::new(DocumentSession::new(
                path.clone(),
                Arc::clone(&self.engine),
                Arc::clone(&self.registry),
                self.configuration.clone(),
            ))
        });
        Arc::clone(session)
    }

    pub fn get(&self, path: &Path) -> Option<Arc<DocumentSession<E, R>>> {
        self.sessions.read().get(path).cloned()
    }

    /// Forget a document and unload its session. Returns whether it was open.
    pub async fn close(&self, path: &Path) -> bool {
        let removed = self.sessions.write().shift_remove(path);
        match removed {
            Some(session) => {
                session.unload().await;
                debug!(path = %path.display(), "document closed");
                true
            }
            None => false,
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.sessions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
