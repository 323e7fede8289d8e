//! One entry point per CLI verb
//!
//! Commands print the `=> ...` progress lines users see and return typed
//! errors; deciding exit codes is left to the binary.

use std::io::{self, Write};
use std::path::Path;

use tracing::warn;

use crate::blacklist::{BlacklistStore, ExclusionList, Origin};
use crate::config::{ConfigLoader, Configuration, Paths};
use crate::error::AugurError;
use crate::version::cache::ArchiveCache;
use crate::version::checker::{self, ComparisonReport};
use crate::version::registries::{AurRegistry, MirrorRegistry};
use crate::version::registry::PackageSource;
use crate::version::types::PackageVersions;
use crate::version::vercmp::{AlpmVercmp, ExternalVercmp, VersionComparator};

pub struct App {
    paths: Paths,
}

impl App {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Create the cache, either by scraping the AUR or from a snapshot file
    ///
    /// `confirm` is asked before an existing cache is replaced.
    pub async fn init(&self, seed: Option<&Path>, confirm: &dyn Fn() -> bool) -> Result<(), AugurError> {
        let Some(seed) = seed else {
            return self.update(confirm).await;
        };

        let cache = self.cache();
        let force = confirm_overwrite(&cache, confirm)?;

        println!("=> Importing cache from {}", seed.display());
        let packages = cache.import(seed, force)?;
        println!("=> Cache initialized with {} packages.", packages.len());

        Ok(())
    }

    /// Scrape the AUR and replace the cache
    pub async fn update(&self, confirm: &dyn Fn() -> bool) -> Result<(), AugurError> {
        let config = self.load_config()?;
        let cache = self.cache();
        let force = confirm_overwrite(&cache, confirm)?;

        let registry = AurRegistry::new(&config.aur_url, config.per_page)?.with_progress(
            |done, total| {
                print!("\r    => Scraping page {} of {}", done, total);
                let _ = io::stdout().flush();
            },
        );

        println!("=> Now scraping the packages from the AUR");
        let packages = cache.refresh(&registry, force).await?;
        println!("\r    => Finished scraping.           ");
        println!("=> Update complete, {} packages cached.", packages.len());

        Ok(())
    }

    /// Compare the mirror database against the cached AUR listing
    pub async fn check(&self) -> Result<ComparisonReport, AugurError> {
        let config = self.load_config()?;
        let exclusions = self.load_blacklist();

        println!("=> Loading AUR packages from cache");
        let archive = match self.cache().load() {
            Ok(packages) => packages,
            Err(e) => {
                warn!("Continuing without AUR packages: {}", e);
                println!("=> Error! {}. Please update it (-u).", e);
                PackageVersions::new()
            }
        };

        if archive.is_empty() {
            let report = ComparisonReport::default();
            print!("{}", report);
            return Ok(report);
        }

        let mirror = MirrorRegistry::new(&config.mirror, &config.repository)?;
        println!("=> Downloading database from {}", mirror.label());
        let mirror_packages = mirror.fetch_package_versions().await?;

        println!("=> Parsing packages to compare");
        let comparator = comparator_for(&config);
        let report = checker::compare(&mirror_packages, &archive, &exclusions, comparator.as_ref())?;
        print!("{}", report);

        Ok(report)
    }

    pub fn blacklist_add(&self, name: &str) -> Result<(), AugurError> {
        BlacklistStore::new(&self.paths).add(name)?;
        println!("=> Added {} to blacklist", name);
        Ok(())
    }

    pub fn whitelist(&self, name: &str) -> Result<(), AugurError> {
        BlacklistStore::new(&self.paths).remove(name)?;
        println!("=> Whitelisted {}", name);
        Ok(())
    }

    pub fn print_blacklist(&self) {
        let list = self.load_blacklist();

        if list.is_empty() {
            println!("=> Nothing blacklisted.");
            return;
        }

        println!("=> Blacklisted:");
        for name in list.names() {
            println!("    => {}", name);
        }
    }

    fn load_config(&self) -> Result<Configuration, AugurError> {
        Ok(ConfigLoader::new(&self.paths).load()?)
    }

    fn load_blacklist(&self) -> ExclusionList {
        let list = BlacklistStore::new(&self.paths).list();
        if list.origin() == Origin::None {
            println!("=> Error! No global or local blacklist found.");
        }
        list
    }

    fn cache(&self) -> ArchiveCache {
        ArchiveCache::new(self.paths.cache_file())
    }
}

/// `Ok(true)` when an existing cache may be replaced, `Ok(false)` when there
/// is nothing to replace
fn confirm_overwrite(cache: &ArchiveCache, confirm: &dyn Fn() -> bool) -> Result<bool, AugurError> {
    if !cache.exists() {
        println!("=> No cache found, creating one.");
        return Ok(false);
    }

    if confirm() {
        Ok(true)
    } else {
        Err(AugurError::Declined)
    }
}

fn comparator_for(config: &Configuration) -> Box<dyn VersionComparator> {
    match &config.vercmp {
        Some(program) => Box::new(ExternalVercmp::new(program.clone())),
        None => Box::new(AlpmVercmp),
    }
}
