//! Scriptable package registry.

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use msbuild_lsp::packages::{PackageRegistry, PackageSource, PackageVersion, RegistryError};
use parking_lot::Mutex;

/// Answers are consumed in order; once the script runs out every call
/// answers with an empty set.
#[derive(Default)]
pub struct MockRegistry {
    sources: Mutex<Option<Vec<PackageSource>>>,
    ids: Mutex<VecDeque<Result<BTreeSet<String>, RegistryError>>>,
    versions: Mutex<VecDeque<Result<BTreeSet<PackageVersion>, RegistryError>>>,
    last_include_prerelease: Mutex<Option<bool>>,
    pub id_calls: AtomicUsize,
    pub version_calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources returned by `configured_sources`; `None` makes it fail.
    pub fn set_sources(&self, sources: Option<Vec<PackageSource>>) {
        *self.sources.lock() = sources;
    }

    pub fn push_ids(&self, ids: &[&str]) {
        self.ids
            .lock()
            .push_back(Ok(ids.iter().map(|s| s.to_string()).collect()));
    }

    pub fn push_id_error(&self) {
        self.ids
            .lock()
            .push_back(Err(RegistryError::unavailable("feed offline")));
    }

    pub fn push_versions(&self, versions: &[&str]) {
        self.versions.lock().push_back(Ok(versions
            .iter()
            .map(|v| v.parse().unwrap())
            .collect()));
    }

    pub fn id_calls(&self) -> usize {
        self.id_calls.load(Ordering::SeqCst)
    }

    pub fn version_calls(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    pub fn last_include_prerelease(&self) -> Option<bool> {
        *self.last_include_prerelease.lock()
    }
}

impl PackageRegistry for MockRegistry {
    async fn configured_sources(&self, _project_dir: &Path) -> Result<Vec<PackageSource>, RegistryError> {
        self.sources
            .lock()
            .clone()
            .ok_or_else(|| RegistryError::unavailable("no feed configuration"))
    }

    async fn suggest_ids(
        &self,
        _sources: &[PackageSource],
        _prefix: &str,
        include_prerelease: bool,
    ) -> Result<BTreeSet<String>, RegistryError> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_include_prerelease.lock() = Some(include_prerelease);
        self.ids.lock().pop_front().unwrap_or_else(|| Ok(BTreeSet::new()))
    }

    async fn suggest_versions(
        &self,
        _sources: &[PackageSource],
        _package_id: &str,
        include_prerelease: bool,
    ) -> Result<BTreeSet<PackageVersion>, RegistryError> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_include_prerelease.lock() = Some(include_prerelease);
        self.versions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(BTreeSet::new()))
    }
}
