//! Temporary augur installation for end-to-end tests

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tempfile::TempDir;

use augur::config::Paths;
use augur::version::error::RegistryError;
use augur::version::registry::PackageSource;
use augur::version::types::PackageVersions;

/// Paths rooted in a fresh temporary directory
pub fn create_test_paths() -> (TempDir, Paths) {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::rooted(temp_dir.path());
    (temp_dir, paths)
}

pub fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Write a local configuration pointing both URLs at `base_url`
pub fn write_config(paths: &Paths, base_url: &str) {
    write_file(
        &paths.local_config(),
        &format!(r#"{{"AURUrl": "{base_url}", "Mirror": "{base_url}", "PerPage": 50}}"#),
    );
}

pub fn packages(entries: &[(&str, &str)]) -> PackageVersions {
    entries.iter().copied().collect()
}

/// Source that always returns the same listing
pub struct StaticSource {
    packages: PackageVersions,
}

impl StaticSource {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            packages: packages(entries),
        }
    }
}

#[async_trait]
impl PackageSource for StaticSource {
    fn label(&self) -> &'static str {
        "static"
    }

    async fn fetch_package_versions(&self) -> Result<PackageVersions, RegistryError> {
        Ok(self.packages.clone())
    }
}
