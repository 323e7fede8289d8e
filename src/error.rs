use thiserror::Error;

use crate::blacklist::BlacklistError;
use crate::config::ConfigError;
use crate::version::error::{CacheError, CompareError, RegistryError};

/// Every failure a command can end with
#[derive(Debug, Error)]
pub enum AugurError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blacklist(#[from] BlacklistError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Compare(#[from] CompareError),

    /// The user did not confirm overwriting the cache
    #[error("Cache overwrite declined")]
    Declined,
}
