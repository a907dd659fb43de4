//! Package suggestions for completion.
//!
//! The registry client itself is external ([`PackageRegistry`]); this module
//! holds the data it exchanges and the per-session [`SuggestionCache`].

mod cache;
mod registry;
mod version;

pub use cache::SuggestionCache;
pub use registry::{PackageRegistry, PackageSource, RegistryError};
pub use version::{PackageVersion, ParseVersionError};
