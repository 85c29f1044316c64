//! reshelve - replicated index catalog
//!
//! A catalog of independently replaceable Tantivy indices, and the
//! receive side of a push replication protocol that updates a
//! follower's on-disk index without taking it offline and without
//! retransmitting unchanged files.
//!
//! # Architecture
//!
//! - **core**: Domain logic (transport-agnostic)
//!   - config, error, types, xdg, layout
//!   - engine (IndexEngine traits, Tantivy)
//!   - catalog (registry, handles, dependents)
//!   - replication (staging, swap, receiver, recovery, targets)
//!   - services (unified service container)
//!
//! - **cli**: Command-line adapter (depends on core)
//!
//! # Key Guarantees
//!
//! - At most one live handle per index directory
//! - Readers never observe a half-swapped index
//! - Composite indices are closed and reopened around member swaps
//! - Unchanged files are recovered from trash, never resent

pub mod cli;
pub mod core;

// Re-export commonly used types for convenience
pub use core::catalog::{CatalogEvent, CatalogListener, CatalogRegistry, IndexHandle};
pub use core::config::Config;
pub use core::error::{Result, ReshelveError};
pub use core::replication::{ReplicationReceiver, SwapEngine};
pub use core::services::Services;
pub use core::types::*;
