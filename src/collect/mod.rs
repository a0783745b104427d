//! Resumable collection of detail pages for every listed mob.

pub mod job;
pub mod orchestrator;

pub use job::{Checkpoint, FailedEntry, JobPaths, ResumableJob};
pub use orchestrator::{CollectionSummary, Collector, CollectorSettings};
