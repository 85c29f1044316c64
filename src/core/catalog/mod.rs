//! Process-wide catalog of open indices.
//!
//! # Architecture
//!
//! - **CatalogRegistry**: name -> directory -> live handle, plus the
//!   set of directories locked by an in-flight swap
//! - **IndexHandle**: one opened engine instance bound to a directory
//! - **DirLock**: reader/writer lock with unlock notification
//! - **dependents**: composite declarations and dependent lookup
//!
//! The registry owns the only path from a name to a handle. While a
//! directory is locked nothing hands it out; `get` waits for the unlock
//! (bounded by the configured timeout) instead.

mod dependents;
mod handle;
mod lock;
mod registry;

pub use dependents::{read_members, write_members, CompositeConfig};
pub use handle::IndexHandle;
pub use lock::DirLock;
pub use registry::{Admission, CatalogRegistry, OpenAllReport};

use std::sync::Arc;

/// Change notifications delivered to `CatalogListener`s
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    /// A handle was closed and removed from the catalog
    Closed { handle: Arc<IndexHandle> },

    /// New content was swapped in; `previous` is the handle it superseded
    Swapped {
        name: String,
        previous: Option<Arc<IndexHandle>>,
    },

    /// Incremental content was merged in
    Merged {
        name: String,
        previous: Option<Arc<IndexHandle>>,
    },

    /// The index directory was deleted
    Erased { name: String },
}

impl CatalogEvent {
    /// Name of the index the event concerns
    pub fn name(&self) -> &str {
        match self {
            CatalogEvent::Closed { handle } => handle.name(),
            CatalogEvent::Swapped { name, .. }
            | CatalogEvent::Merged { name, .. }
            | CatalogEvent::Erased { name } => name,
        }
    }
}

/// Sink for "catalog changed" notifications (caches, UI)
///
/// Called without any registry lock held.
pub trait CatalogListener: Send + Sync {
    fn catalog_changed(&self, event: &CatalogEvent);
}
