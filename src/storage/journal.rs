//! Append-only JSON Lines journal.
//!
//! Each append is one line, flushed and synced before returning. Reading
//! stops at the first line that does not parse, which is how a torn write
//! from a crash shows up.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::files::remove_if_exists;
use crate::error::CollectError;

pub struct Journal<T> {
    path: PathBuf,
    _entry: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Journal<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _entry: PhantomData,
        }
    }

    pub fn append(&self, entry: &T) -> Result<(), CollectError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CollectError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| CollectError::io(&self.path, e))?;
        file.sync_data()
            .map_err(|e| CollectError::io(&self.path, e))
    }

    /// All complete entries, oldest first. A missing journal is empty.
    pub fn read_all(&self) -> Result<Vec<T>, CollectError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CollectError::io(&self.path, e)),
        };

        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut line = Vec::new();
        let mut line_no = 0;
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Stopping journal read at {}: {}", self.path.display(), e);
                    break;
                }
            }
            line_no += 1;
            if line.trim_ascii().is_empty() {
                continue;
            }
            match serde_json::from_slice(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(
                        "Ignoring journal tail at {}:{}: {}",
                        self.path.display(),
                        line_no,
                        e
                    );
                    break;
                }
            }
        }
        Ok(entries)
    }

    /// Drop every entry.
    pub fn truncate(&self) -> Result<(), CollectError> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::write(&self.path, b"").map_err(|e| CollectError::io(&self.path, e))
    }

    pub fn remove(&self) -> Result<(), CollectError> {
        remove_if_exists(&self.path)
    }
}
