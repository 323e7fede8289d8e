//! JSON file helpers shared by the cache and the blacklist
//!
//! Reads distinguish a missing file from an empty one, since both callers
//! fall back differently on each. Writes always go through a temporary file
//! in the destination directory followed by a rename, so a crash mid-write
//! never leaves a truncated file behind.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Outcome of reading a JSON file that may legitimately be absent
#[derive(Debug, PartialEq, Eq)]
pub enum Loaded<T> {
    /// No file at the path
    Absent,
    /// File exists but holds nothing (or only whitespace / `null`)
    Empty,
    Parsed(T),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Loaded<T>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Loaded::Absent),
        Err(e) => return Err(e.into()),
    };

    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Loaded::Empty);
    }

    Ok(Loaded::Parsed(serde_json::from_str(trimmed)?))
}

/// Serialize `value` to `path`, replacing any existing file atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn read_json_reports_absent_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = read_json::<BTreeMap<String, String>>(&temp_dir.path().join("nope.json"));

        assert!(matches!(result, Ok(Loaded::Absent)));
    }

    #[test]
    fn read_json_reports_whitespace_only_file_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blank.json");
        fs::write(&path, "  \n").unwrap();

        let result = read_json::<BTreeMap<String, String>>(&path);

        assert!(matches!(result, Ok(Loaded::Empty)));
    }

    #[test]
    fn read_json_reports_invalid_json_as_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{\"a\": ").unwrap();

        let result = read_json::<BTreeMap<String, String>>(&path);

        assert!(matches!(result, Err(StorageError::Parse(_))));
    }

    #[test]
    fn write_json_atomic_creates_parent_directories_and_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/data.json");

        let first = BTreeMap::from([("a".to_string(), "1".to_string())]);
        write_json_atomic(&path, &first).unwrap();
        let second = BTreeMap::from([("b".to_string(), "2".to_string())]);
        write_json_atomic(&path, &second).unwrap();

        let loaded = read_json::<BTreeMap<String, String>>(&path).unwrap();
        assert_eq!(loaded, Loaded::Parsed(second));

        // only the final file remains, no stray temporaries
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
