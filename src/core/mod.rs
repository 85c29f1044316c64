//! Core domain logic (transport-agnostic)
//!
//! This module contains the catalog and the receive side of push
//! replication. Nothing here knows how bytes arrive over the network.
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Domain data structures
//! - **xdg**: XDG directory handling
//! - **layout**: Data root naming rules and sibling directories
//! - **engine**: Index engine traits and the Tantivy implementation
//! - **catalog**: Registry of open index handles
//! - **replication**: Staging, swap, merge and recovery
//! - **services**: Unified service container

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod replication;
pub mod services;
pub mod types;
pub mod xdg;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use config::Config;
pub use error::{Result, ReshelveError};
pub use services::Services;
