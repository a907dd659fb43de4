use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;

use smol_str::SmolStr;
use thiserror::Error;

use super::version::PackageVersion;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry (or a source) could not be reached.
    #[error("package registry unavailable: {0}")]
    Unavailable(String),

    /// Reading local package-source configuration failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// A configured package feed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageSource {
    pub name: SmolStr,
    pub url: String,
}

impl PackageSource {
    pub fn new(name: impl Into<SmolStr>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Remote feed reachable over HTTP(S), as opposed to a local folder.
    pub fn is_http(&self) -> bool {
        let url = self.url.trim_start();
        ["http://", "https://"].iter().any(|scheme| {
            url.get(..scheme.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
        })
    }
}

/// The package-registry client used for completion.
pub trait PackageRegistry: Send + Sync + 'static {
    /// Sources configured for a project directory (feed configuration files
    /// found from that directory upwards).
    fn configured_sources(
        &self,
        project_dir: &Path,
    ) -> impl Future<Output = Result<Vec<PackageSource>, RegistryError>> + Send;

    /// Package ids starting with `prefix`.
    fn suggest_ids(
        &self,
        sources: &[PackageSource],
        prefix: &str,
        include_prerelease: bool,
    ) -> impl Future<Output = Result<BTreeSet<String>, RegistryError>> + Send;

    /// Available versions of one package.
    fn suggest_versions(
        &self,
        sources: &[PackageSource],
        package_id: &str,
        include_prerelease: bool,
    ) -> impl Future<Output = Result<BTreeSet<PackageVersion>, RegistryError>> + Send;
}
