use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache not found at {0:?}")]
    Missing(PathBuf),

    #[error("Cache at {0:?} is empty")]
    Empty(PathBuf),

    #[error("Cache at {path:?} is not readable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache at {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("A cache is already present at {0:?}")]
    AlreadyPresent(PathBuf),

    #[error("Could not write to cache {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] RegistryError),
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("vercmp failed: {0}")]
    Tool(String),
}
