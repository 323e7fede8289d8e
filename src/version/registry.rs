//! Source of a full package -> version listing

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::PackageVersions;

/// Something that can produce the versions of every package it knows about
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageSource: Send + Sync {
    /// Short human-readable name, e.g. "AUR"
    fn label(&self) -> &'static str;

    /// Fetch the complete listing
    ///
    /// # Returns
    /// * `Ok(PackageVersions)` - Every package with its current version
    /// * `Err(RegistryError)` - If any part of the fetch fails; no partial results
    async fn fetch_package_versions(&self) -> Result<PackageVersions, RegistryError>;
}
