//! Package sources: the AUR listing and the mirror database

pub mod aur;
pub mod mirror;

pub use aur::AurRegistry;
pub use mirror::MirrorRegistry;

use std::time::Duration;

use crate::config::FETCH_TIMEOUT_MS;
use crate::version::error::RegistryError;

const USER_AGENT: &str = concat!("augur/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by both sources: fixed user agent, bounded timeout
fn http_client() -> Result<reqwest::Client, RegistryError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
        .build()?;

    Ok(client)
}
