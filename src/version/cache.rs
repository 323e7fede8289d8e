//! On-disk snapshot of the AUR listing
//!
//! The snapshot is a single JSON object mapping package name to version. It
//! is only ever replaced as a whole, never merged.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::storage::{Loaded, StorageError, read_json, write_json_atomic};
use crate::version::error::CacheError;
use crate::version::registry::PackageSource;
use crate::version::types::PackageVersions;

pub struct ArchiveCache {
    path: PathBuf,
}

impl ArchiveCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot has ever been written
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the snapshot
    ///
    /// Every error here is recoverable for callers that can work with an
    /// empty listing.
    pub fn load(&self) -> Result<PackageVersions, CacheError> {
        debug!("Loading AUR cache from {:?}", self.path);
        let packages = read_snapshot(&self.path)?;
        if packages.is_empty() {
            return Err(CacheError::Empty(self.path.clone()));
        }

        info!("Loaded {} packages from cache", packages.len());
        Ok(packages)
    }

    /// Replace the snapshot with `packages`
    pub fn store(&self, packages: &PackageVersions) -> Result<(), CacheError> {
        write_json_atomic(&self.path, packages).map_err(|source| CacheError::Persist {
            path: self.path.clone(),
            source,
        })?;

        info!("Wrote {} packages to {:?}", packages.len(), self.path);
        Ok(())
    }

    /// Fetch a fresh listing from `source` and store it
    ///
    /// An existing snapshot is only replaced when `force` is set; otherwise
    /// nothing is fetched and [`CacheError::AlreadyPresent`] is returned.
    pub async fn refresh(
        &self,
        source: &dyn PackageSource,
        force: bool,
    ) -> Result<PackageVersions, CacheError> {
        self.ensure_replaceable(force)?;

        info!("Refreshing cache from {}", source.label());
        let packages = source.fetch_package_versions().await?;
        self.store(&packages)?;

        Ok(packages)
    }

    /// Seed the cache from a snapshot file written elsewhere
    pub fn import(&self, snapshot: &Path, force: bool) -> Result<PackageVersions, CacheError> {
        self.ensure_replaceable(force)?;

        let packages = read_snapshot(snapshot)?;
        if packages.is_empty() {
            return Err(CacheError::Empty(snapshot.to_path_buf()));
        }

        info!("Importing {} packages from {:?}", packages.len(), snapshot);
        self.store(&packages)?;

        Ok(packages)
    }

    fn ensure_replaceable(&self, force: bool) -> Result<(), CacheError> {
        if self.exists() && !force {
            return Err(CacheError::AlreadyPresent(self.path.clone()));
        }
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<PackageVersions, CacheError> {
    match read_json::<PackageVersions>(path) {
        Ok(Loaded::Parsed(packages)) => Ok(packages),
        Ok(Loaded::Absent) => Err(CacheError::Missing(path.to_path_buf())),
        Ok(Loaded::Empty) => Err(CacheError::Empty(path.to_path_buf())),
        Err(StorageError::Io(source)) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
        Err(StorageError::Parse(source)) => Err(CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        }),
    }
}
