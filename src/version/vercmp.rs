//! pacman-style version ordering
//!
//! Versions have the shape `[epoch:]pkgver[-pkgrel]`. The epoch is compared
//! first, then `pkgver`, then `pkgrel` when both sides carry one. Each part is
//! compared with the rpmvercmp segment rules used by `vercmp(8)`.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::process::Command;

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::version::error::CompareError;

/// Three-way ordering between two package versions
#[cfg_attr(test, automock)]
pub trait VersionComparator: Send + Sync {
    /// Order `a` relative to `b`
    fn ordering(&self, a: &str, b: &str) -> Result<Ordering, CompareError>;
}

/// In-process implementation of `alpm_pkg_vercmp`
#[derive(Debug, Clone, Copy, Default)]
pub struct AlpmVercmp;

impl VersionComparator for AlpmVercmp {
    fn ordering(&self, a: &str, b: &str) -> Result<Ordering, CompareError> {
        Ok(vercmp(a, b))
    }
}

/// Delegates to an external `vercmp` binary, which prints `-1`, `0` or `1`
#[derive(Debug, Clone)]
pub struct ExternalVercmp {
    program: PathBuf,
}

impl ExternalVercmp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl VersionComparator for ExternalVercmp {
    fn ordering(&self, a: &str, b: &str) -> Result<Ordering, CompareError> {
        let output = Command::new(&self.program)
            .arg(a)
            .arg(b)
            .output()
            .map_err(|e| CompareError::Tool(format!("cannot run {:?}: {}", self.program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let answer = stdout.trim();
        debug!("{:?} {} {} -> {}", self.program, a, b, answer);

        answer
            .parse::<i32>()
            .map(|n| n.cmp(&0))
            .map_err(|_| CompareError::Tool(format!("unexpected output {:?}", answer)))
    }
}

/// Compare two full version strings
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (epoch_a, version_a, release_a) = parse_evr(a);
    let (epoch_b, version_b, release_b) = parse_evr(b);

    rpmvercmp(epoch_a, epoch_b)
        .then_with(|| rpmvercmp(version_a, version_b))
        .then_with(|| match (release_a, release_b) {
            (Some(x), Some(y)) => rpmvercmp(x, y),
            _ => Ordering::Equal,
        })
}

/// Split `[epoch:]version[-release]`; a missing epoch reads as `0`
fn parse_evr(evr: &str) -> (&str, &str, Option<&str>) {
    let digits = evr.bytes().take_while(u8::is_ascii_digit).count();

    let (epoch, version) = match evr[digits..].strip_prefix(':') {
        Some(rest) if digits > 0 => (&evr[..digits], rest),
        Some(rest) => ("0", rest),
        None => ("0", evr),
    };

    match version.rfind('-') {
        Some(dash) => (epoch, &version[..dash], Some(&version[dash + 1..])),
        None => (epoch, version, None),
    }
}

fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let (segment_end_a, segment_end_b) = (i, j);
        while i < a.len() && !a[i].is_ascii_alphanumeric() {
            i += 1;
        }
        while j < b.len() && !b[j].is_ascii_alphanumeric() {
            j += 1;
        }

        if i >= a.len() || j >= b.len() {
            break;
        }

        // differing separator runs decide on their own
        let (sep_a, sep_b) = (i - segment_end_a, j - segment_end_b);
        if sep_a != sep_b {
            return sep_a.cmp(&sep_b);
        }

        let numeric = a[i].is_ascii_digit();
        let same_class: fn(&u8) -> bool = if numeric {
            u8::is_ascii_digit
        } else {
            u8::is_ascii_alphabetic
        };
        let end_a = i + a[i..].iter().take_while(|c| same_class(c)).count();
        let end_b = j + b[j..].iter().take_while(|c| same_class(c)).count();

        // numeric segments beat alpha ones
        if end_b == j {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut segment_a = &a[i..end_a];
        let mut segment_b = &b[j..end_b];
        if numeric {
            segment_a = trim_leading_zeros(segment_a);
            segment_b = trim_leading_zeros(segment_b);
            match segment_a.len().cmp(&segment_b.len()) {
                Ordering::Equal => {}
                longer => return longer,
            }
        }

        match segment_a.cmp(segment_b) {
            Ordering::Equal => {}
            other => return other,
        }

        i = end_a;
        j = end_b;
    }

    let (rest_a, rest_b) = (&a[i..], &b[j..]);
    if rest_a.is_empty() && rest_b.is_empty() {
        return Ordering::Equal;
    }

    // a trailing alpha segment never beats the end of the string
    let a_is_older = match (rest_a.first(), rest_b.first()) {
        (None, Some(c)) => !c.is_ascii_alphabetic(),
        (Some(c), _) => c.is_ascii_alphabetic(),
        (None, None) => false,
    };

    if a_is_older {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn trim_leading_zeros(segment: &[u8]) -> &[u8] {
    let zeros = segment.iter().take_while(|&&c| c == b'0').count();
    &segment[zeros..]
}
