//! Mirror repository database reader
//!
//! A pacman repository database (`<repo>.db`) is a tar archive with one
//! top-level directory per package named `<name>-<pkgver>-<pkgrel>`. Only
//! those directory names are needed here. repo-add compresses it with gzip
//! by default, or with xz or bzip2 depending on the extension it was given;
//! the format is detected from the leading bytes.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Component;

use async_trait::async_trait;
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use xz2::read::XzDecoder;

use crate::config::DEFAULT_REPOSITORY;
use crate::version::error::RegistryError;
use crate::version::registries::http_client;
use crate::version::registry::PackageSource;
use crate::version::types::PackageVersions;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const BZIP2_MAGIC: &[u8] = b"BZh";
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

/// Compression wrapped around the database tar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Gzip,
    Xz,
    Bzip2,
    Zstd,
    Plain,
}

impl Codec {
    fn detect(header: &[u8]) -> Self {
        if header.starts_with(GZIP_MAGIC) {
            Codec::Gzip
        } else if header.starts_with(XZ_MAGIC) {
            Codec::Xz
        } else if header.starts_with(BZIP2_MAGIC) {
            Codec::Bzip2
        } else if header.starts_with(ZSTD_MAGIC) {
            Codec::Zstd
        } else {
            Codec::Plain
        }
    }
}

/// Reads package versions from a mirror's repository database
pub struct MirrorRegistry {
    client: reqwest::Client,
    base_url: String,
    repository: String,
}

impl MirrorRegistry {
    pub fn new(base_url: &str, repository: &str) -> Result<Self, RegistryError> {
        let repository = if repository.is_empty() {
            DEFAULT_REPOSITORY
        } else {
            repository
        };

        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
        })
    }

    /// `<mirror>/<repo>/<repo>.db`
    fn database_url(&self) -> String {
        format!(
            "{}/{}/{}.db",
            self.base_url, self.repository, self.repository
        )
    }
}

#[async_trait]
impl PackageSource for MirrorRegistry {
    fn label(&self) -> &'static str {
        "mirror"
    }

    async fn fetch_package_versions(&self) -> Result<PackageVersions, RegistryError> {
        let url = self.database_url();
        info!("Downloading mirror database from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(url));
        }

        if !status.is_success() {
            warn!("Mirror returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes of database", bytes.len());

        let mut download = NamedTempFile::new()?;
        download.write_all(&bytes)?;
        download.flush()?;

        let packages = parse_database(download.reopen()?)?;
        info!(
            "Found {} packages in {} database",
            packages.len(),
            self.repository
        );

        Ok(packages)
    }
}

/// Read every top-level member of a plain, gzip, xz or bzip2 database
///
/// zstd databases are rejected with [`RegistryError::InvalidResponse`].
pub fn parse_database<R: Read>(reader: R) -> Result<PackageVersions, RegistryError> {
    let mut reader = BufReader::new(reader);
    let codec = Codec::detect(reader.fill_buf()?);
    debug!("Database compression: {:?}", codec);

    match codec {
        Codec::Gzip => list_members(GzDecoder::new(reader)),
        Codec::Xz => list_members(XzDecoder::new(reader)),
        Codec::Bzip2 => list_members(BzDecoder::new(reader)),
        Codec::Zstd => Err(RegistryError::InvalidResponse(
            "unsupported database compression: zstd".to_string(),
        )),
        Codec::Plain => list_members(reader),
    }
}

fn list_members<R: Read>(reader: R) -> Result<PackageVersions, RegistryError> {
    let mut archive = tar::Archive::new(reader);
    let mut packages = PackageVersions::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let path = entry.path()?;

        // nested files such as `<member>/desc` are skipped
        let mut components = path.components();
        let (Some(Component::Normal(member)), None) = (components.next(), components.next())
        else {
            continue;
        };

        let Some(member) = member.to_str() else {
            warn!("Skipping non UTF-8 database member {:?}", member);
            continue;
        };

        match split_member(member) {
            Some((name, version)) => {
                packages.insert(name, version);
            }
            None => warn!("Skipping malformed database member {:?}", member),
        }
    }

    Ok(packages)
}

/// Split `<name>-<pkgver>-<pkgrel>` on the last two hyphens
///
/// The name itself may contain hyphens: `foo-bar-2.0-1` is `foo-bar` at `2.0-1`.
pub fn split_member(member: &str) -> Option<(&str, &str)> {
    let mut parts = member.rsplitn(3, '-');
    let release = parts.next()?;
    let version = parts.next()?;
    let name = parts.next()?;

    if name.is_empty() || version.is_empty() || release.is_empty() {
        return None;
    }

    Some((name, &member[name.len() + 1..]))
}
