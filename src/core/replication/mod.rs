//! Push replication into the catalog.
//!
//! # Architecture
//!
//! - **StagingArea / DiffManifest**: `.D` receive directory, `._D`
//!   trash and the list of unchanged files to recover at swap time
//! - **SwapEngine**: full replace (`switch_in`) and incremental merge
//!   (`merge_in`) under a registry admission
//! - **ReplicationReceiver**: the name-addressed protocol surface
//! - **RecoveryInspector**: finds and repairs leftovers of interrupted
//!   sessions
//! - **ReplicationTarget**: outbound target descriptors, stored for the
//!   external push driver
//!
//! Staging and trash are siblings of the live directory, so every rename
//! stays on one filesystem and is metadata-only.

mod descriptor;
mod receiver;
mod recovery;
mod staging;
mod swap;

pub use descriptor::{ReplicationDescriptor, ReplicationKind, ReplicationTarget};
pub use receiver::ReplicationReceiver;
pub use recovery::{RecoveryInspector, RecoveryReport, RepairAction};
pub use staging::{mtime_millis, DiffManifest, StagingArea};
pub use swap::SwapEngine;
