//! Core data types for the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Counters reported by an engine instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatistics {
    /// Live documents across all segments
    pub num_docs: u64,

    /// Searchable segments
    pub num_segments: usize,

    /// Bytes on disk
    pub size_bytes: u64,
}

/// Snapshot of one open handle, for listings and diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleInfo {
    pub name: String,
    pub dir: PathBuf,
    pub online: bool,
    pub true_replicate: bool,
    pub members: Vec<String>,
    pub opened_at: DateTime<Utc>,
    pub statistics: IndexStatistics,
}

/// Outcome of a committed swap or merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapReport {
    /// Index that received new content
    pub name: String,

    /// Files recovered from trash via the diff manifest
    pub files_reused: usize,

    /// Composite indices closed for the duration of the swap
    pub dependents: Vec<String>,

    /// Wall time from admission to unlock
    pub duration_ms: u64,
}
