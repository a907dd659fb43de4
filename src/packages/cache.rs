use std::collections::BTreeSet;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::version::PackageVersion;

/// Suggestion caches for one document session.
///
/// Keys are compared exactly. Only non-empty answers are stored, so an empty
/// (possibly transient) answer is asked for again next time while a non-empty
/// one sticks until the cache is dropped. No eviction.
#[derive(Debug, Default)]
pub struct SuggestionCache {
    ids: Mutex<FxHashMap<SmolStr, BTreeSet<String>>>,
    versions: Mutex<FxHashMap<SmolStr, BTreeSet<PackageVersion>>>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self, prefix: &str) -> Option<BTreeSet<String>> {
        self.ids.lock().get(prefix).cloned()
    }

    /// Returns whether the answer was stored.
    pub fn store_ids(&self, prefix: &str, ids: &BTreeSet<String>) -> bool {
        if ids.is_empty() {
            return false;
        }
        self.ids.lock().insert(SmolStr::new(prefix), ids.clone());
        true
    }

    pub fn versions(&self, package_id: &str) -> Option<BTreeSet<PackageVersion>> {
        self.versions.lock().get(package_id).cloned()
    }

    /// Returns whether the answer was stored.
    pub fn store_versions(&self, package_id: &str, versions: &BTreeSet<PackageVersion>) -> bool {
        if versions.is_empty() {
            return false;
        }
        self.versions
            .lock()
            .insert(SmolStr::new(package_id), versions.clone());
        true
    }
}
