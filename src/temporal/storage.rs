//! Persisted records: JSON files and byte payloads.
//!
//! Every strategy persists a serde record. The same bytes are written to disk
//! by `save` and embedded in exported arrays, so a record read back from
//! either place goes through one decoding path.
use crate::temporal::errors::{TemporalError, TemporalResult};
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// `path` with `suffix` appended to its final component (`model` → `modelpos`).
pub fn companion_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn to_bytes<T: Serialize>(record: &T) -> TemporalResult<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|err| TemporalError::InconsistentState { reason: err.to_string() })
}

pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> TemporalResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|err| TemporalError::InconsistentState { reason: err.to_string() })
}

/// Serialize `record` and write it to `path`.
///
/// # Errors
/// - [`TemporalError::PersistenceFailed`] if the file cannot be written.
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> TemporalResult<()> {
    let bytes = to_bytes(record)?;
    fs::write(path, bytes).map_err(|err| TemporalError::PersistenceFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "record written");
    Ok(())
}

/// Read and decode the record stored at `path`.
///
/// # Errors
/// - [`TemporalError::PersistenceUnavailable`] if the file is missing,
///   unreadable, or does not decode as `T`.
pub fn read_record<T: DeserializeOwned>(path: &Path) -> TemporalResult<T> {
    let unavailable = |reason: String| TemporalError::PersistenceUnavailable {
        path: path.display().to_string(),
        reason,
    };
    let bytes = fs::read(path).map_err(|err| unavailable(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| unavailable(err.to_string()))
}
