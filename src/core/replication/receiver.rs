//! Name-addressed receive surface for a follower node.
//!
//! A push arrives as `init`, then any number of `mkdir`, `file_exists`
//! and `put_file` calls, and ends with `switch_in`, `merge_in` or
//! `abort`. Staging calls are refused while a swap owns the directory.

use crate::core::catalog::CatalogRegistry;
use crate::core::error::Result;
use crate::core::replication::staging::StagingArea;
use crate::core::replication::swap::SwapEngine;
use crate::core::types::SwapReport;
use std::io::Read;
use std::sync::Arc;
use std::time::SystemTime;

pub struct ReplicationReceiver {
    registry: Arc<CatalogRegistry>,
    swap: SwapEngine,
}

impl ReplicationReceiver {
    pub fn new(registry: Arc<CatalogRegistry>) -> Self {
        let swap = SwapEngine::new(Arc::clone(&registry));
        Self { registry, swap }
    }

    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    /// Run `op` on the staging area of `name`, refused while a swap holds it
    ///
    /// A swap of `name` cannot begin until `op` returns.
    fn with_area<T>(&self, name: &str, op: impl FnOnce(&StagingArea) -> Result<T>) -> Result<T> {
        let _pass = self.registry.enter_staging(name)?;
        let dir = self.registry.layout().index_dir(name)?;
        op(&StagingArea::new(&dir)?)
    }

    /// Start (or restart) a receive session for `name`
    pub fn init(&self, name: &str) -> Result<()> {
        self.with_area(name, |area| area.begin_receive())?;
        tracing::info!("Receive session started for '{}'", name);
        Ok(())
    }

    pub fn mkdir(&self, name: &str, rel: &str) -> Result<()> {
        self.with_area(name, |area| area.mkdir(rel))
    }

    /// True when the live copy of `rel` matches; the sender then skips the body
    pub fn file_exists(&self, name: &str, rel: &str, mtime: SystemTime, size: u64) -> Result<bool> {
        self.with_area(name, |area| area.file_unchanged(rel, mtime, size))
    }

    pub fn put_file(&self, name: &str, rel: &str, mtime: SystemTime, body: impl Read) -> Result<u64> {
        self.with_area(name, |area| area.receive_file(rel, mtime, body))
    }

    pub fn switch_in(&self, name: &str) -> Result<SwapReport> {
        self.swap.switch_in(name)
    }

    pub fn merge_in(&self, name: &str) -> Result<SwapReport> {
        self.swap.merge_in(name)
    }

    /// Discard the session; never touches the live handle
    pub fn abort(&self, name: &str) -> Result<()> {
        self.with_area(name, |area| area.abort())
    }
}
