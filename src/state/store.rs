// JSON load/save helpers shared by the state documents.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

/// Load a JSON document, or `T::default()` if the file doesn't exist yet.
///
/// A file that exists but can't be parsed is an error: silently starting
/// from empty state would re-alert on every post in the ledger.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!(path = %path.display(), "State file absent, starting empty");
        return Ok(T::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&raw).with_context(|| {
        format!(
            "Failed to parse {}. Fix or remove the file to start over.",
            path.display()
        )
    })
}

/// Write a JSON document atomically: temp file in the same directory, fsync,
/// then rename over `path`.
pub fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path)
        .with_context(|| format!("Failed to move temp file into {}", path.display()))?;

    debug!(path = %path.display(), "State file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: BTreeMap<String, u64> = load_json(&dir.path().join("nope.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/history.json");
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u64);

        save_json_atomic(&path, &value).unwrap();
        let loaded: BTreeMap<String, u64> = load_json(&path).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let result: Result<BTreeMap<String, u64>> = load_json(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{\"old\": 1}").unwrap();

        let mut value = BTreeMap::new();
        value.insert("new".to_string(), 2u64);
        save_json_atomic(&path, &value).unwrap();

        let loaded: BTreeMap<String, u64> = load_json(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("new"), Some(&2));
    }
}
