//! JSON file helpers with atomic replacement.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CollectError;

/// Read and deserialize a JSON file. A missing file is `MissingInput`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CollectError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CollectError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(CollectError::io(path, e)),
    };

    serde_json::from_str(&content).map_err(|source| CollectError::InvalidInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`read_json`], but a missing file yields `None`.
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CollectError> {
    match read_json(path) {
        Ok(value) => Ok(Some(value)),
        Err(CollectError::MissingInput { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write pretty JSON to `path` without ever exposing a partial file.
///
/// The content goes to a sibling `.partial` file, is synced, then renamed over
/// `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CollectError> {
    let content = serde_json::to_string_pretty(value)?;
    write_atomic(path, content.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CollectError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CollectError::io(parent, e))?;
    }

    let partial = partial_path(path);
    {
        let mut file = fs::File::create(&partial).map_err(|e| CollectError::io(&partial, e))?;
        file.write_all(bytes)
            .map_err(|e| CollectError::io(&partial, e))?;
        file.sync_all().map_err(|e| CollectError::io(&partial, e))?;
    }

    rename(&partial, path)
}

/// Rename `from` over `to`, replacing any existing file.
pub fn rename(from: &Path, to: &Path) -> Result<(), CollectError> {
    fs::rename(from, to).map_err(|e| CollectError::io(to, e))
}

/// Delete a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<(), CollectError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CollectError::io(path, e)),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
