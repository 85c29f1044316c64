//! Open handles onto index directories.

use crate::core::engine::{EngineInstance, IndexEngine};
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::SENTINEL_FILE;
use crate::core::types::{HandleInfo, IndexStatistics};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Mutable part of a handle, behind the handle's own lock
struct HandleState {
    engine: Option<Box<dyn EngineInstance>>,
    online: bool,
    true_replicate: bool,
}

/// An opened index instance bound to one directory
///
/// Identity is the canonical directory path; the registry guarantees at
/// most one live handle per directory. Compare handles with
/// `Arc::ptr_eq`.
pub struct IndexHandle {
    name: String,
    dir: PathBuf,
    members: Vec<String>,
    opened_at: DateTime<Utc>,
    state: Mutex<HandleState>,
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("members", &self.members)
            .field("open", &self.is_open())
            .finish()
    }
}

impl IndexHandle {
    /// Open the engine at `dir`
    ///
    /// A non-empty `members` list opens a composite view over
    /// `member_dirs` instead of a plain index.
    pub(crate) fn open(
        engine: &dyn IndexEngine,
        name: &str,
        dir: &Path,
        members: Vec<String>,
        member_dirs: &[PathBuf],
    ) -> Result<Self> {
        let instance = if members.is_empty() {
            engine.open(dir)?
        } else {
            engine.open_composite(dir, member_dirs)?
        };

        Ok(Self {
            name: name.to_string(),
            dir: dir.to_path_buf(),
            members,
            opened_at: Utc::now(),
            state: Mutex::new(HandleState {
                engine: Some(instance),
                online: true,
                true_replicate: dir.join(SENTINEL_FILE).exists(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, HandleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Member names for a composite index, empty otherwise
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_composite(&self) -> bool {
        !self.members.is_empty()
    }

    /// True if this is a composite view including `name`
    pub fn reads_through(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn is_open(&self) -> bool {
        self.state().engine.is_some()
    }

    pub fn is_online(&self) -> bool {
        let state = self.state();
        state.engine.is_some() && state.online
    }

    /// Take the index in or out of service without closing it
    pub fn set_online(&self, online: bool) -> Result<()> {
        let mut state = self.state();
        if state.engine.is_none() {
            return Err(ReshelveError::IndexClosed(self.name.clone()));
        }
        state.online = online;
        Ok(())
    }

    /// True if the content arrived via replication
    pub fn is_true_replicate(&self) -> bool {
        self.state().true_replicate
    }

    /// Write the replication sentinel and set the marker
    pub fn mark_true_replicate(&self) -> Result<()> {
        let mut state = self.state();
        fs::write(self.dir.join(SENTINEL_FILE), Utc::now().to_rfc3339())?;
        state.true_replicate = true;
        Ok(())
    }

    pub fn statistics(&self) -> Result<IndexStatistics> {
        match &self.state().engine {
            Some(engine) => engine.statistics(),
            None => Err(ReshelveError::IndexClosed(self.name.clone())),
        }
    }

    pub fn reload(&self) -> Result<()> {
        match &self.state().engine {
            Some(engine) => engine.reload(),
            None => Err(ReshelveError::IndexClosed(self.name.clone())),
        }
    }

    /// Release the engine instance; closing twice is a no-op
    pub fn close(&self) -> Result<()> {
        let engine = {
            let mut state = self.state();
            state.online = false;
            state.engine.take()
        };

        match engine {
            Some(engine) => {
                tracing::debug!("Closing handle for '{}'", self.name);
                engine.close()
            }
            None => Ok(()),
        }
    }

    /// Summary for listings
    pub fn info(&self) -> Result<HandleInfo> {
        let statistics = self.statistics()?;
        let state = self.state();
        Ok(HandleInfo {
            name: self.name.clone(),
            dir: self.dir.clone(),
            online: state.engine.is_some() && state.online,
            true_replicate: state.true_replicate,
            members: self.members.clone(),
            opened_at: self.opened_at,
            statistics,
        })
    }
}
