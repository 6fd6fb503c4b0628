//! Durable-state file helpers.
//!
//! Every whole-file write goes through [`write_atomic`]: the bytes land in a
//! temporary file in the target's directory, which is then renamed over the
//! target. Readers see either the previous contents or the new contents.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::errors::CoreError;

/// Create the parent directory of `path` if it has one.
///
/// # Errors
///
/// Returns `CoreError::Io` if the directory cannot be created.
pub fn ensure_parent(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
    }
    Ok(())
}

/// Replace `path` with `bytes` via write-then-rename.
///
/// # Errors
///
/// Returns `CoreError::Io` if the temporary file cannot be written, flushed,
/// or renamed over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    ensure_parent(path)?;
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => std::env::current_dir().map_err(|e| CoreError::io(".", e))?,
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| CoreError::io(&dir, e))?;
    tmp.write_all(bytes).map_err(|e| CoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| CoreError::io(path, e.error))?;
    Ok(())
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// # Errors
///
/// Returns `CoreError` on serialization or write failure.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

/// Read a whole JSON file.
///
/// # Errors
///
/// Returns `CoreError` if the file is unreadable or not valid JSON for `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let bytes = std::fs::read(path).map_err(|e| CoreError::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Append one line (a trailing newline is added) to a text file.
///
/// # Errors
///
/// Returns `CoreError::Io` if the file cannot be opened or written.
pub fn append_line(path: &Path, line: &str) -> Result<(), CoreError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CoreError::io(path, e))?;
    writeln!(file, "{line}").map_err(|e| CoreError::io(path, e))?;
    Ok(())
}

/// Append one record to a line-delimited JSON file.
///
/// # Errors
///
/// Returns `CoreError::Io` if the file cannot be opened or written.
pub fn append_json_line<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    ensure_parent(path)?;
    serde_jsonlines::append_json_lines(path, [value]).map_err(|e| CoreError::io(path, e))
}

/// Read every record of a line-delimited JSON file.
///
/// # Errors
///
/// Returns `CoreError` if the file is unreadable or a line fails to decode.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CoreError> {
    serde_jsonlines::json_lines(path)
        .map_err(|e| CoreError::io(path, e))?
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| CoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_contents_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/model.json");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
        let entries = std::fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn append_line_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs/notifications.log");

        append_line(&log, "one").unwrap();
        append_line(&log, "two").unwrap();

        assert_eq!(std::fs::read_to_string(&log).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn json_lines_roundtrip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("checks.json");

        append_json_line(&log, &serde_json::json!({"n": 1, "flag": true})).unwrap();
        append_json_line(&log, &serde_json::json!({"n": 2, "flag": false})).unwrap();

        let rows: Vec<serde_json::Value> = read_json_lines(&log).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["flag"], serde_json::Value::Bool(true));
        assert_eq!(rows[1]["n"], 2);
    }
}
