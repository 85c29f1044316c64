//! Index engine collaborator interface.
//!
//! The catalog never looks inside an index directory. Everything it
//! needs from the search engine goes through these two traits, so the
//! swap machinery can be driven by the Tantivy engine in production and
//! by a counting fake in tests.
//!
//! # Architecture
//!
//! - **IndexEngine**: opens instances and runs engine-level merges
//! - **EngineInstance**: one opened index (plain or composite)
//! - **TantivyEngine**: default engine backed by Tantivy

mod tantivy;

use crate::core::error::Result;
use crate::core::types::IndexStatistics;
use std::path::{Path, PathBuf};

pub use self::tantivy::{IndexDocument, TantivyEngine, TantivyIndex};

/// An opened index instance
///
/// Instances are owned by exactly one `IndexHandle` and are closed by
/// consuming the box.
pub trait EngineInstance: Send + Sync {
    /// Pick up changes committed to the directory since open
    fn reload(&self) -> Result<()>;

    /// Document, segment and size counters
    fn statistics(&self) -> Result<IndexStatistics>;

    /// Release every file the instance holds open
    fn close(self: Box<Self>) -> Result<()>;
}

/// Factory and maintenance operations of the search engine
pub trait IndexEngine: Send + Sync {
    /// Open the index stored in `dir`, creating an empty one when the
    /// directory holds no index yet
    fn open(&self, dir: &Path) -> Result<Box<dyn EngineInstance>>;

    /// Open a composite view reading through the given member directories
    fn open_composite(&self, dir: &Path, members: &[PathBuf]) -> Result<Box<dyn EngineInstance>>;

    /// Merge the index in `incoming` into the index in `target`
    ///
    /// Neither directory may be held open by any instance while this runs.
    fn merge(&self, target: &Path, incoming: &Path) -> Result<()>;
}
