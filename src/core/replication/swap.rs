//! Promotion of staged content into the live catalog.
//!
//! `switch_in` replaces an index wholesale:
//!
//! 1. admit D plus its live dependents (closing their handles)
//! 2. drop leftover trash
//! 3. rename D to `._D`
//! 4. rename `.D` to D
//! 5. move manifest paths back from `._D`, delete the manifest
//! 6. reopen D and write the replication sentinel
//! 7. unlock (the admission guard unlocks on every path)
//! 8. notify listeners with the superseded handle
//! 9. delete `._D`, only after 2-7 succeeded
//!
//! `merge_in` hands `.D` to the engine's merge instead and has no trash
//! step. Failures in either path leave D unlocked with whatever content
//! is on disk; the next `get` reopens it.

use crate::core::catalog::{read_members, Admission, CatalogEvent, CatalogRegistry};
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::SENTINEL_FILE;
use crate::core::replication::staging::{DiffManifest, StagingArea};
use crate::core::types::SwapReport;
use chrono::Utc;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

fn aborted(name: &str, reason: impl Into<String>) -> ReshelveError {
    ReshelveError::SwapAborted {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Orchestrates switch and merge for a registry
#[derive(Clone)]
pub struct SwapEngine {
    registry: Arc<CatalogRegistry>,
}

impl SwapEngine {
    pub fn new(registry: Arc<CatalogRegistry>) -> Self {
        Self { registry }
    }

    fn staging_for(&self, name: &str) -> Result<StagingArea> {
        let dir = self.registry.layout().index_dir(name)?;
        let staging = StagingArea::new(&dir)?;
        if !staging.is_receiving() {
            return Err(aborted(name, "no staged content"));
        }
        Ok(staging)
    }

    /// Replace the content of `name` with its fully staged new version
    pub fn switch_in(&self, name: &str) -> Result<SwapReport> {
        let started = Instant::now();
        let staging = self.staging_for(name)?;

        let mut admission = self.registry.admit(name)?;
        let dependents = admission.dependent_names();
        tracing::info!(
            "Switching in '{}' ({} dependents closed)",
            name,
            dependents.len()
        );

        let replaced = self
            .prepare(name, &staging)
            .and_then(|_| self.replace(name, &staging, &mut admission));

        match replaced {
            Ok(files_reused) => {
                let previous = admission.release();
                self.registry.notify(CatalogEvent::Swapped {
                    name: name.to_string(),
                    previous,
                });

                if let Err(e) = staging.clear_trash() {
                    tracing::warn!("Swap of '{}' succeeded but trash remains: {}", name, e);
                }

                let report = SwapReport {
                    name: name.to_string(),
                    files_reused,
                    dependents,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
                tracing::info!(
                    "Switched in '{}' ({} files reused) in {}ms",
                    name,
                    report.files_reused,
                    report.duration_ms
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Switch of '{}' failed: {}", name, e);
                if let Some(previous) = admission.release() {
                    self.registry
                        .notify(CatalogEvent::Closed { handle: previous });
                }
                Err(e)
            }
        }
    }

    /// Step 1, under admission: the session must still be there and the
    /// trash of an earlier run is dropped
    fn prepare(&self, name: &str, staging: &StagingArea) -> Result<()> {
        if !staging.is_receiving() {
            return Err(aborted(name, "staged content disappeared"));
        }
        if staging.clear_trash()? {
            tracing::warn!("Removed leftover trash for '{}'", name);
        }
        Ok(())
    }

    /// Steps 3-6; the caller owns the directories through `admission`
    fn replace(
        &self,
        name: &str,
        staging: &StagingArea,
        admission: &mut Admission<'_>,
    ) -> Result<usize> {
        let live = staging.live_dir();
        let trash = staging.trash_dir();

        let had_live = live.exists();
        if had_live {
            fs::rename(live, trash)
                .map_err(|e| aborted(name, format!("moving live content to trash: {e}")))?;
        }

        if let Err(e) = fs::rename(staging.staging_dir(), live) {
            if had_live {
                if let Err(restore) = fs::rename(trash, live) {
                    tracing::error!(
                        "Could not restore '{}' from trash {:?}: {}",
                        name,
                        trash,
                        restore
                    );
                }
            }
            return Err(aborted(name, format!("promoting staging: {e}")));
        }

        let files_reused = DiffManifest::apply(live, trash)?;

        if read_members(live)?.is_empty() {
            let handle = Arc::new(self.registry.open_detached(name, live)?);
            handle.mark_true_replicate()?;
            admission.install(handle);
        } else {
            // Composite members may be mid-swap elsewhere; reopen lazily.
            fs::write(live.join(SENTINEL_FILE), Utc::now().to_rfc3339())?;
        }

        Ok(files_reused)
    }

    /// Merge the staged incremental update into `name`
    pub fn merge_in(&self, name: &str) -> Result<SwapReport> {
        let started = Instant::now();
        let staging = self.staging_for(name)?;
        let live = staging.live_dir().to_path_buf();

        if !live.is_dir() {
            return Err(ReshelveError::NotFound(name.to_string()));
        }
        if !read_members(&live)?.is_empty() {
            return Err(aborted(name, "composite indices cannot be merged"));
        }

        let mut admission = self.registry.admit(name)?;
        let dependents = admission.dependent_names();
        tracing::info!("Merging into '{}'", name);

        let merged = self
            .registry
            .engine()
            .merge(&live, staging.staging_dir())
            .and_then(|_| self.registry.open_detached(name, &live))
            .and_then(|handle| {
                handle.mark_true_replicate()?;
                Ok(handle)
            });

        match merged {
            Ok(handle) => {
                admission.install(Arc::new(handle));
                let previous = admission.release();
                self.registry.notify(CatalogEvent::Merged {
                    name: name.to_string(),
                    previous,
                });

                if let Err(e) = staging.clear_staging() {
                    tracing::warn!("Merge of '{}' succeeded but staging remains: {}", name, e);
                }

                Ok(SwapReport {
                    name: name.to_string(),
                    files_reused: 0,
                    dependents,
                    duration_ms: started.elapsed().as_millis() as u64,
                })
            }
            Err(e) => {
                tracing::error!(
                    "Merge into '{}' failed, content may need repair: {}",
                    name,
                    e
                );
                if let Some(previous) = admission.release() {
                    self.registry
                        .notify(CatalogEvent::Closed { handle: previous });
                }
                Err(e)
            }
        }
    }
}
