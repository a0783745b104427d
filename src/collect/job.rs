//! Resumable batch job.
//!
//! Persistence follows a write-ahead order:
//! 1. every record outcome is appended to the journal,
//! 2. every `batch_size` outcomes the results go to the temp file, then the
//!    checkpoint is rewritten and the journal truncated,
//! 3. on completion the temp file is renamed over the canonical output,
//! 4. the checkpoint and journal are deleted.
//!
//! Opening a job while a checkpoint exists resumes it: the temp snapshot (or
//! the canonical output, when the crash hit between steps 3 and 4) is loaded
//! and the journal replayed on top.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CollectError;
use crate::storage::{Journal, read_json_if_exists, remove_if_exists, rename, write_json_atomic};

/// A result the job can store, keyed by its position in the target list.
pub trait JobRecord: Clone + Serialize + DeserializeOwned {
    fn index(&self) -> usize;
}

/// A target that could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEntry {
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// Persisted progress of an in-flight run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Indices collected successfully. Disjoint from `failed_entries`.
    pub processed_indices: Vec<usize>,
    pub failed_entries: Vec<FailedEntry>,
    pub total: usize,
    pub start_time: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(total: usize, start_time: DateTime<Utc>) -> Self {
        Self {
            processed_indices: Vec::new(),
            failed_entries: Vec::new(),
            total,
            start_time,
        }
    }
}

/// Files owned by one job.
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub output: PathBuf,
    pub temp_output: PathBuf,
    pub checkpoint: PathBuf,
    pub journal: PathBuf,
}

/// Options for opening a job.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub total: usize,
    pub batch_size: usize,
    /// Forget failures recorded by a previous run so they are attempted again.
    pub retry_failed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
enum JournalEntry<R> {
    Success { record: R },
    Failure { entry: FailedEntry },
}

/// Final state of a completed job.
#[derive(Debug, Clone)]
pub struct JobOutcome<R> {
    pub results: Vec<R>,
    pub failed: Vec<FailedEntry>,
    pub start_time: DateTime<Utc>,
    pub resumed: bool,
}

pub struct ResumableJob<R: JobRecord> {
    paths: JobPaths,
    batch_size: usize,
    total: usize,
    start_time: DateTime<Utc>,
    results: BTreeMap<usize, R>,
    failed: BTreeMap<usize, FailedEntry>,
    journal: Journal<JournalEntry<R>>,
    pending: usize,
    resumed: bool,
}

impl<R: JobRecord> ResumableJob<R> {
    /// Open a job, resuming from disk when a checkpoint exists.
    pub fn open(
        paths: JobPaths,
        options: JobOptions,
        now: DateTime<Utc>,
    ) -> Result<Self, CollectError> {
        let journal = Journal::new(&paths.journal);
        let checkpoint: Option<Checkpoint> = read_json_if_exists(&paths.checkpoint)?;

        let mut job = Self {
            batch_size: options.batch_size.max(1),
            total: options.total,
            start_time: now,
            results: BTreeMap::new(),
            failed: BTreeMap::new(),
            journal,
            pending: 0,
            resumed: checkpoint.is_some(),
            paths,
        };

        match checkpoint {
            Some(checkpoint) => job.restore(checkpoint, options.retry_failed)?,
            None => {
                remove_if_exists(&job.paths.temp_output)?;
                job.journal.remove()?;
                job.write_checkpoint()?;
                debug!("Created checkpoint {}", job.paths.checkpoint.display());
            }
        }

        Ok(job)
    }

    fn restore(&mut self, checkpoint: Checkpoint, retry_failed: bool) -> Result<(), CollectError> {
        info!(
            "Loaded checkpoint: {}/{} processed, {} failed",
            checkpoint.processed_indices.len(),
            checkpoint.total,
            checkpoint.failed_entries.len()
        );
        if checkpoint.total != self.total {
            warn!(
                "Checkpoint total {} differs from listing size {}",
                checkpoint.total, self.total
            );
        }
        self.start_time = checkpoint.start_time;

        let snapshot_path = if self.paths.temp_output.exists() {
            &self.paths.temp_output
        } else {
            &self.paths.output
        };
        let snapshot: Vec<R> = read_json_if_exists(snapshot_path)?.unwrap_or_default();
        if !snapshot.is_empty() {
            info!(
                "Loaded {} saved results from {}",
                snapshot.len(),
                snapshot_path.display()
            );
        }

        let processed: BTreeSet<usize> = checkpoint.processed_indices.iter().copied().collect();
        for record in snapshot {
            if processed.contains(&record.index()) {
                self.results.insert(record.index(), record);
            }
        }
        let missing = processed.len() - self.results.len();
        if missing > 0 {
            warn!("{} checkpointed results missing from snapshot; they will be collected again", missing);
        }

        for entry in checkpoint.failed_entries {
            self.failed.insert(entry.index, entry);
        }

        let replayed = self.journal.read_all()?;
        if !replayed.is_empty() {
            info!("Replaying {} journal entries", replayed.len());
        }
        for entry in replayed {
            self.apply(entry);
        }

        if retry_failed && !self.failed.is_empty() {
            info!("Retrying {} previously failed entries", self.failed.len());
            self.failed.clear();
        }

        self.flush()
    }

    fn apply(&mut self, entry: JournalEntry<R>) {
        match entry {
            JournalEntry::Success { record } => {
                self.failed.remove(&record.index());
                self.results.insert(record.index(), record);
            }
            JournalEntry::Failure { entry } => {
                self.results.remove(&entry.index);
                self.failed.insert(entry.index, entry);
            }
        }
    }

    pub fn is_done(&self, index: usize) -> bool {
        self.results.contains_key(&index) || self.failed.contains_key(&index)
    }

    pub fn resumed(&self) -> bool {
        self.resumed
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn completed(&self) -> usize {
        self.results.len() + self.failed.len()
    }

    pub fn results(&self) -> impl Iterator<Item = &R> {
        self.results.values()
    }

    pub fn record_success(&mut self, record: R) -> Result<(), CollectError> {
        self.record(JournalEntry::Success { record })
    }

    pub fn record_failure(&mut self, entry: FailedEntry) -> Result<(), CollectError> {
        self.record(JournalEntry::Failure { entry })
    }

    fn record(&mut self, entry: JournalEntry<R>) -> Result<(), CollectError> {
        self.journal.append(&entry)?;
        self.apply(entry);
        self.pending += 1;

        if self.pending >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Persist results and checkpoint, then truncate the journal.
    pub fn flush(&mut self) -> Result<(), CollectError> {
        self.write_snapshot()?;
        self.write_checkpoint()?;
        self.journal.truncate()?;
        self.pending = 0;

        info!(
            "Saved: {} ok, {} failed",
            self.results.len(),
            self.failed.len()
        );
        Ok(())
    }

    /// Promote the temp snapshot to the canonical output and clean up.
    pub fn finalize(mut self) -> Result<JobOutcome<R>, CollectError> {
        self.flush()?;
        rename(&self.paths.temp_output, &self.paths.output)?;
        remove_if_exists(&self.paths.checkpoint)?;
        self.journal.remove()?;
        info!("Wrote {}", self.paths.output.display());

        Ok(JobOutcome {
            results: self.results.into_values().collect(),
            failed: self.failed.into_values().collect(),
            start_time: self.start_time,
            resumed: self.resumed,
        })
    }

    fn write_snapshot(&self) -> Result<(), CollectError> {
        let results: Vec<&R> = self.results.values().collect();
        write_json_atomic(&self.paths.temp_output, &results)
    }

    fn write_checkpoint(&self) -> Result<(), CollectError> {
        let checkpoint = Checkpoint {
            processed_indices: self.results.keys().copied().collect(),
            failed_entries: self.failed.values().cloned().collect(),
            total: self.total,
            start_time: self.start_time,
        };
        write_json_atomic(&self.paths.checkpoint, &checkpoint)
    }
}
