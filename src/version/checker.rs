//! Version drift between the mirror and the AUR

use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, info, warn};

use crate::blacklist::ExclusionList;
use crate::version::error::CompareError;
use crate::version::types::PackageVersions;
use crate::version::vercmp::VersionComparator;

/// Direction of a version difference, seen from the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    /// The AUR has a newer version
    Upgrade,
    /// The mirror is ahead of the AUR
    Downgrade,
}

impl Drift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Drift::Upgrade => "Upgrade",
            Drift::Downgrade => "Downgrade",
        }
    }
}

/// One package whose versions differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    pub name: String,
    pub mirror_version: String,
    pub archive_version: String,
    pub drift: Drift,
}

/// Result of comparing the mirror against the AUR
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonReport {
    /// Differing packages, sorted by name
    pub entries: Vec<DriftEntry>,
    /// Packages present on both sides
    pub shared: usize,
    /// Shared packages skipped because they are blacklisted
    pub excluded: usize,
}

impl ComparisonReport {
    /// Whether any upgrade or downgrade was found
    pub fn has_drift(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn upgrades(&self) -> impl Iterator<Item = &DriftEntry> {
        self.entries.iter().filter(|e| e.drift == Drift::Upgrade)
    }

    pub fn downgrades(&self) -> impl Iterator<Item = &DriftEntry> {
        self.entries.iter().filter(|e| e.drift == Drift::Downgrade)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_drift() {
            return writeln!(f, "=> There are no updates or downgrades available.");
        }

        for entry in &self.entries {
            writeln!(f, "    => {}: {}", entry.drift.as_str(), entry.name)?;
            writeln!(f, "        => mirror: {}", entry.mirror_version)?;
            writeln!(f, "        => AUR:    {}", entry.archive_version)?;
        }
        Ok(())
    }
}

/// Compare every package present in both `mirror` and `archive`
///
/// Blacklisted names are skipped. Equal versions are not reported. The
/// comparator is asked for `ordering(mirror_version, archive_version)`.
pub fn compare<C: VersionComparator + ?Sized>(
    mirror: &PackageVersions,
    archive: &PackageVersions,
    exclusions: &ExclusionList,
    comparator: &C,
) -> Result<ComparisonReport, CompareError> {
    if archive.is_empty() {
        warn!("AUR listing is empty, nothing to compare against");
    }

    let mut report = ComparisonReport::default();

    for (name, mirror_version) in mirror.iter() {
        let Some(archive_version) = archive.get(name) else {
            continue;
        };
        report.shared += 1;

        if exclusions.contains(name) {
            debug!("Skipping blacklisted package {}", name);
            report.excluded += 1;
            continue;
        }

        let drift = match comparator.ordering(mirror_version, archive_version)? {
            Ordering::Less => Drift::Upgrade,
            Ordering::Greater => Drift::Downgrade,
            Ordering::Equal => continue,
        };

        report.entries.push(DriftEntry {
            name: name.to_string(),
            mirror_version: mirror_version.to_string(),
            archive_version: archive_version.to_string(),
            drift,
        });
    }

    info!(
        "Compared {} shared packages ({} blacklisted), {} differ",
        report.shared,
        report.excluded,
        report.entries.len()
    );

    Ok(report)
}
