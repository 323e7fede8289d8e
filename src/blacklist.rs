//! Exclusion list ("blacklist") of packages the check must ignore
//!
//! Stored as `{"blacklist": [...]}`. The per-user file wins over the global
//! one; every change is written to the per-user file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Paths;
use crate::storage::{Loaded, read_json, write_json_atomic};

#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("Package {0} already blacklisted.")]
    AlreadyExcluded(String),

    #[error("Package {0} not blacklisted.")]
    NotExcluded(String),

    #[error("Could not write to blacklist {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a loaded list came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    Local,
    Global,
    /// Neither file produced a list
    #[default]
    None,
}

/// Package names excluded from comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionList {
    #[serde(default)]
    blacklist: Vec<String>,
    #[serde(skip)]
    origin: Origin,
}

impl ExclusionList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blacklist: names.into_iter().map(Into::into).collect(),
            origin: Origin::None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blacklist.iter().any(|n| n == name)
    }

    /// Names in file order
    pub fn names(&self) -> &[String] {
        &self.blacklist
    }

    pub fn len(&self) -> usize {
        self.blacklist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blacklist.is_empty()
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }
}

/// Reads and writes the exclusion list files
pub struct BlacklistStore {
    local: PathBuf,
    global: PathBuf,
}

impl BlacklistStore {
    pub fn new(paths: &Paths) -> Self {
        Self::with_paths(paths.local_blacklist(), paths.global_blacklist())
    }

    pub fn with_paths(local: PathBuf, global: PathBuf) -> Self {
        Self { local, global }
    }

    /// Load the current list
    ///
    /// A local file that is unreadable or empty falls back to the global one.
    /// When neither yields a list the result is empty with [`Origin::None`].
    pub fn load(&self) -> ExclusionList {
        if let Some(list) = read_list(&self.local, "Local") {
            return list.with_origin(Origin::Local);
        }
        if let Some(list) = read_list(&self.global, "Global") {
            return list.with_origin(Origin::Global);
        }

        warn!("No global or local blacklist found");
        ExclusionList::default()
    }

    /// Same as [`load`](Self::load); named after the print verb
    pub fn list(&self) -> ExclusionList {
        self.load()
    }

    /// Exclude `name`, returning the updated list
    pub fn add(&self, name: &str) -> Result<ExclusionList, BlacklistError> {
        let mut list = self.load();
        if list.contains(name) {
            return Err(BlacklistError::AlreadyExcluded(name.to_string()));
        }

        list.blacklist.push(name.to_string());
        self.persist(&list)?;
        info!("Added {} to blacklist", name);

        Ok(list.with_origin(Origin::Local))
    }

    /// Stop excluding `name`, returning the updated list
    pub fn remove(&self, name: &str) -> Result<ExclusionList, BlacklistError> {
        let mut list = self.load();
        if !list.contains(name) {
            return Err(BlacklistError::NotExcluded(name.to_string()));
        }

        list.blacklist.retain(|n| n != name);
        self.persist(&list)?;
        info!("Removed {} from blacklist", name);

        Ok(list.with_origin(Origin::Local))
    }

    fn persist(&self, list: &ExclusionList) -> Result<(), BlacklistError> {
        write_json_atomic(&self.local, list).map_err(|source| BlacklistError::Persist {
            path: self.local.clone(),
            source,
        })
    }
}

fn read_list(path: &Path, label: &str) -> Option<ExclusionList> {
    match read_json::<ExclusionList>(path) {
        Ok(Loaded::Parsed(list)) => {
            debug!("{} blacklist loaded from {:?}", label, path);
            Some(list)
        }
        Ok(Loaded::Absent) => None,
        Ok(Loaded::Empty) => {
            warn!("{} blacklist found at {:?} but empty", label, path);
            None
        }
        Err(e) => {
            warn!("{} blacklist found at {:?} but not readable: {}", label, path, e);
            None
        }
    }
}
