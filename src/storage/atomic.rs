use crate::error::StorageError;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Replace `path` so readers see either the old or the new content, never a mix.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating state directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("failed writing temp file: {}", temp_path.display()))?;

    if let Err(rename_error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(rename_error)
            .with_context(|| format!("failed replacing file atomically: {}", path.display()));
    }

    Ok(())
}

pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed serializing {}", path.display()))?;
    write_atomic(path, &body)
}

/// `Ok(None)` when the file does not exist; an error when it exists but is
/// unreadable or malformed.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(StorageError::Read {
                path: path.display().to_string(),
                message: error.to_string(),
            }
            .into());
        }
    };

    serde_json::from_str(&raw).map(Some).map_err(|error| {
        StorageError::Decode {
            path: path.display().to_string(),
            message: error.to_string(),
        }
        .into()
    })
}

/// Soft load: absent or corrupt files fall back to `T::default()`.
pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(error) => {
            tracing::warn!(path = %path.display(), "resetting unreadable state file: {error:#}");
            T::default()
        }
    }
}
