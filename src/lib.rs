//! augur watches a pacman repository mirror for packages that drifted away
//! from their AUR versions.
//!
//! - [`config`]: path resolution and configuration loading
//! - [`blacklist`]: the user-maintained exclusion list
//! - [`version`]: fetching, caching and comparing package versions
//! - [`storage`]: JSON file helpers with atomic replace
//! - [`commands`]: one function per CLI verb
//! - [`error`]: the error type seen by the binary

pub mod blacklist;
pub mod commands;
pub mod config;
pub mod error;
pub mod storage;
pub mod version;
