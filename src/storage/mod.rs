//! JSON file storage for collected data
//!
//! Provides atomic JSON writes for snapshots and outputs, and an append-only
//! journal for per-record progress.

pub mod files;
pub mod journal;

pub use files::{read_json, read_json_if_exists, remove_if_exists, rename, write_json_atomic};
pub use journal::Journal;
