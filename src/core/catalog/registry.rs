//! The catalog registry.
//!
//! Holds `live` (directory -> handle) and `locked` (directories owned by
//! an in-flight swap) behind one `DirLock`. Handles are created lazily by
//! `get` with a double-checked slow path under the write lock, so a
//! directory is opened at most once no matter how many callers race.

use crate::core::catalog::dependents::{self, read_members, write_members};
use crate::core::catalog::handle::IndexHandle;
use crate::core::catalog::lock::DirLock;
use crate::core::catalog::{CatalogEvent, CatalogListener};
use crate::core::config::Config;
use crate::core::engine::{IndexEngine, TantivyEngine};
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::{staging_dir, trash_dir, CatalogLayout};
use crate::core::types::HandleInfo;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Default)]
struct CatalogState {
    live: HashMap<PathBuf, Arc<IndexHandle>>,
    locked: HashSet<PathBuf>,
    /// Receive calls in flight per directory; admission waits for zero
    staging: HashMap<PathBuf, usize>,
}

/// Result of `open_all`
#[derive(Debug, Default, Serialize)]
pub struct OpenAllReport {
    pub opened: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Process-wide map of index directories to open handles
pub struct CatalogRegistry {
    layout: CatalogLayout,
    engine: Arc<dyn IndexEngine>,
    state: DirLock<CatalogState>,
    listeners: RwLock<Vec<Arc<dyn CatalogListener>>>,
    lock_timeout: Duration,
}

impl CatalogRegistry {
    /// Create a registry over `layout`
    pub fn new(layout: CatalogLayout, engine: Arc<dyn IndexEngine>, lock_timeout: Duration) -> Self {
        Self {
            layout,
            engine,
            state: DirLock::new(CatalogState::default()),
            listeners: RwLock::new(Vec::new()),
            lock_timeout,
        }
    }

    /// Create a Tantivy-backed registry from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let layout = CatalogLayout::new(
            &config.storage.data_root,
            config.catalog.reserved_names.clone(),
        )?;
        Ok(Self::new(
            layout,
            Arc::new(TantivyEngine::new()),
            config.catalog.lock_timeout(),
        ))
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    pub fn engine(&self) -> &dyn IndexEngine {
        self.engine.as_ref()
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Register a "catalog changed" sink
    pub fn add_listener(&self, listener: Arc<dyn CatalogListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    pub(crate) fn notify(&self, event: CatalogEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in listeners {
            listener.catalog_changed(&event);
        }
    }

    fn busy(name: &str, started: Instant) -> ReshelveError {
        ReshelveError::CatalogBusy {
            name: name.to_string(),
            waited_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Return the live handle for `name`, opening it on first use
    ///
    /// Waits while the directory (or, for a composite, any member) is
    /// locked by a swap, and fails with `CatalogBusy` once the lock
    /// timeout passes.
    pub fn get(&self, name: &str) -> Result<Arc<IndexHandle>> {
        let dir = self.layout.index_dir(name)?;
        let started = Instant::now();
        let deadline = started + self.lock_timeout;

        loop {
            let seen = self.state.generation();
            if let Some(handle) = self.try_get(name, &dir)? {
                return Ok(handle);
            }
            tracing::debug!("Index '{}' is locked, waiting", name);
            if !self.state.wait_for_unlock(seen, deadline) {
                tracing::warn!(
                    "Gave up waiting for '{}' after {:?}",
                    name,
                    started.elapsed()
                );
                return Err(Self::busy(name, started));
            }
        }
    }

    /// One attempt at `get`; `Ok(None)` means "locked, wait and retry"
    fn try_get(&self, name: &str, dir: &Path) -> Result<Option<Arc<IndexHandle>>> {
        {
            let state = self.state.read();
            if let Some(handle) = state.live.get(dir) {
                return Ok(Some(Arc::clone(handle)));
            }
            if state.locked.contains(dir) {
                return Ok(None);
            }
        }

        let mut state = self.state.write();
        if let Some(handle) = state.live.get(dir) {
            return Ok(Some(Arc::clone(handle)));
        }
        if state.locked.contains(dir) {
            return Ok(None);
        }
        if !dir.is_dir() {
            return Err(ReshelveError::NotFound(name.to_string()));
        }

        let members = read_members(dir)?;
        let member_dirs = members
            .iter()
            .map(|m| self.layout.index_dir(m))
            .collect::<Result<Vec<_>>>()?;
        if member_dirs.iter().any(|d| state.locked.contains(d)) {
            return Ok(None);
        }
        if let Some(missing) = members
            .iter()
            .zip(&member_dirs)
            .find(|(_, d)| !d.is_dir())
        {
            return Err(ReshelveError::NotFound(missing.0.clone()));
        }

        let handle = Arc::new(IndexHandle::open(
            self.engine.as_ref(),
            name,
            dir,
            members,
            &member_dirs,
        )?);
        state.live.insert(dir.to_path_buf(), Arc::clone(&handle));
        tracing::info!("Opened index '{}' at {:?}", name, dir);

        Ok(Some(handle))
    }

    /// Open a handle outside the registry, for a caller that owns `dir`
    /// through an `Admission`
    pub(crate) fn open_detached(&self, name: &str, dir: &Path) -> Result<IndexHandle> {
        let members = read_members(dir)?;
        let member_dirs = members
            .iter()
            .map(|m| self.layout.index_dir(m))
            .collect::<Result<Vec<_>>>()?;
        IndexHandle::open(self.engine.as_ref(), name, dir, members, &member_dirs)
    }

    /// Close and forget the handle for `name`; no-op if it is not open
    pub fn close(&self, name: &str) -> Result<()> {
        let dir = self.layout.index_dir(name)?;
        let removed = self.state.write().live.remove(&dir);

        if let Some(handle) = removed {
            handle.close()?;
            tracing::info!("Closed index '{}'", name);
            self.notify(CatalogEvent::Closed { handle });
        }
        Ok(())
    }

    /// Create an empty index directory
    pub fn create(&self, name: &str) -> Result<PathBuf> {
        let dir = self.layout.index_dir(name)?;
        if dir.exists() {
            return Err(ReshelveError::AlreadyExists(name.to_string()));
        }
        fs::create_dir_all(&dir)?;
        tracing::info!("Created index directory {:?}", dir);
        Ok(dir)
    }

    /// Create a composite index reading through `members`
    pub fn create_composite(&self, name: &str, members: &[String]) -> Result<PathBuf> {
        for member in members {
            self.layout.validate_name(member)?;
            if member == name {
                return Err(ReshelveError::NameRejected(format!(
                    "composite '{name}' cannot include itself"
                )));
            }
        }
        let dir = self.create(name)?;
        write_members(&dir, members)?;
        Ok(dir)
    }

    /// Close `name`, then delete its directory and any staging leftovers
    pub fn erase(&self, name: &str) -> Result<()> {
        let admission = self.admit(name)?;
        let dir = admission.dir().to_path_buf();
        if !dir.exists() {
            return Err(ReshelveError::NotFound(name.to_string()));
        }

        fs::remove_dir_all(&dir)?;
        for leftover in [staging_dir(&dir)?, trash_dir(&dir)?] {
            if leftover.exists() {
                fs::remove_dir_all(&leftover)?;
            }
        }
        admission.release();

        tracing::info!("Erased index '{}'", name);
        self.notify(CatalogEvent::Erased {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Open every valid index under the data root
    ///
    /// Plain indices are opened before composites so members exist by
    /// the time a composite reads through them.
    pub fn open_all(&self) -> Result<OpenAllReport> {
        let mut names = self.layout.list_names()?;
        names.sort_by_key(|name| {
            self.layout
                .index_dir(name)
                .and_then(|dir| read_members(&dir))
                .map(|members| !members.is_empty())
                .unwrap_or(false)
        });

        let mut report = OpenAllReport::default();
        for name in names {
            match self.get(&name) {
                Ok(_) => report.opened.push(name),
                Err(e) => {
                    tracing::warn!("Failed to open index '{}': {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        tracing::info!(
            "Opened {} indices ({} failed)",
            report.opened.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Close every live handle
    pub fn close_all(&self) -> usize {
        let handles: Vec<_> = self.state.write().live.drain().map(|(_, h)| h).collect();
        let count = handles.len();

        for handle in handles {
            if let Err(e) = handle.close() {
                tracing::warn!("Failed to close '{}': {}", handle.name(), e);
            }
            self.notify(CatalogEvent::Closed { handle });
        }
        tracing::info!("Closed {} indices", count);
        count
    }

    /// Every valid index directory name under the data root
    pub fn list(&self) -> Result<Vec<String>> {
        self.layout.list_names()
    }

    /// Names with a live handle, sorted
    pub fn live_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .read()
            .live
            .values()
            .map(|h| h.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Live handle for `name` without opening it
    pub fn peek(&self, name: &str) -> Option<Arc<IndexHandle>> {
        let dir = self.layout.index_dir(name).ok()?;
        self.state.read().live.get(&dir).cloned()
    }

    /// True while a swap owns the directory of `name`
    pub fn is_locked(&self, name: &str) -> bool {
        match self.layout.index_dir(name) {
            Ok(dir) => self.state.read().locked.contains(&dir),
            Err(_) => false,
        }
    }

    /// Live composite handles reading through `name`
    pub fn find_dependents(&self, name: &str) -> Vec<Arc<IndexHandle>> {
        dependents::find_in(&self.state.read().live, name)
    }

    /// Summary of `name`, opening it if needed
    pub fn info(&self, name: &str) -> Result<HandleInfo> {
        self.get(name)?.info()
    }

    /// Register one receive call against the sibling directories of `name`
    ///
    /// Fails fast while a swap holds the directory. While the pass is
    /// alive `admit` for the same directory waits, so staging and trash
    /// are never touched by both sides at once.
    pub(crate) fn enter_staging(&self, name: &str) -> Result<StagingPass<'_>> {
        let dir = self.layout.index_dir(name)?;
        let mut state = self.state.write();
        if state.locked.contains(&dir) {
            return Err(ReshelveError::CatalogBusy {
                name: name.to_string(),
                waited_ms: 0,
            });
        }
        *state.staging.entry(dir.clone()).or_insert(0) += 1;
        Ok(StagingPass {
            registry: self,
            dir,
        })
    }

    /// Lock the directory of `name` plus every live dependent
    ///
    /// Admission is all-or-nothing under the write lock: if any of the
    /// directories is already locked the call waits for an unlock and
    /// recomputes the dependent set. Evicted handles are closed after the
    /// registry lock is dropped.
    pub(crate) fn admit(&self, name: &str) -> Result<Admission<'_>> {
        let dir = self.layout.index_dir(name)?;
        let started = Instant::now();
        let deadline = started + self.lock_timeout;

        loop {
            let seen = self.state.generation();
            {
                let mut state = self.state.write();
                let dependents: Vec<_> = dependents::find_in(&state.live, name)
                    .into_iter()
                    .filter(|h| h.dir() != dir)
                    .collect();
                let mut dirs = vec![dir.clone()];
                dirs.extend(dependents.iter().map(|h| h.dir().to_path_buf()));

                let free = !dirs.iter().any(|d| state.locked.contains(d))
                    && !state.staging.contains_key(&dir);
                if free {
                    let previous = state.live.remove(&dir);
                    for d in &dirs[1..] {
                        state.live.remove(d);
                    }
                    state.locked.extend(dirs.iter().cloned());
                    drop(state);

                    for handle in previous.iter().chain(dependents.iter()) {
                        if let Err(e) = handle.close() {
                            tracing::warn!("Failed to close '{}': {}", handle.name(), e);
                        }
                    }
                    tracing::debug!(
                        "Admitted '{}' with {} dependents",
                        name,
                        dependents.len()
                    );

                    return Ok(Admission {
                        registry: self,
                        name: name.to_string(),
                        dir,
                        dirs,
                        previous,
                        dependents,
                        replacement: None,
                        released: false,
                    });
                }
            }

            if !self.state.wait_for_unlock(seen, deadline) {
                return Err(Self::busy(name, started));
            }
        }
    }
}

/// One receive call holding off swaps of its directory
pub(crate) struct StagingPass<'a> {
    registry: &'a CatalogRegistry,
    dir: PathBuf,
}

impl std::fmt::Debug for StagingPass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingPass").field("dir", &self.dir).finish()
    }
}

impl Drop for StagingPass<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.registry.state.write();
            if let Some(count) = state.staging.get_mut(&self.dir) {
                *count -= 1;
                if *count == 0 {
                    state.staging.remove(&self.dir);
                }
            }
        }
        self.registry.state.notify_unlocked();
    }
}

/// Exclusive ownership of an index directory and its dependents
///
/// Dropping the admission unlocks every directory it holds, so an error
/// anywhere in a swap still returns the catalog to an openable state.
pub struct Admission<'a> {
    registry: &'a CatalogRegistry,
    name: String,
    dir: PathBuf,
    dirs: Vec<PathBuf>,
    previous: Option<Arc<IndexHandle>>,
    dependents: Vec<Arc<IndexHandle>>,
    replacement: Option<Arc<IndexHandle>>,
    released: bool,
}

impl fmt::Debug for Admission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admission")
            .field("name", &self.name)
            .field("dirs", &self.dirs)
            .field("released", &self.released)
            .finish()
    }
}

impl<'a> Admission<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Handle that was live for the directory at admission
    pub fn previous(&self) -> Option<&Arc<IndexHandle>> {
        self.previous.as_ref()
    }

    /// Names of the composite handles evicted with the directory
    pub fn dependent_names(&self) -> Vec<String> {
        self.dependents
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    /// Make `handle` live for the directory on release
    pub fn install(&mut self, handle: Arc<IndexHandle>) {
        self.replacement = Some(handle);
    }

    /// Unlock now, returning the superseded handle
    pub fn release(mut self) -> Option<Arc<IndexHandle>> {
        self.release_inner();
        self.previous.take()
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        {
            let mut state = self.registry.state.write();
            for d in &self.dirs {
                state.locked.remove(d);
            }
            if let Some(handle) = self.replacement.take() {
                state.live.insert(self.dir.clone(), handle);
            }
        }
        self.registry.state.notify_unlocked();
        tracing::debug!("Released '{}'", self.name);
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
