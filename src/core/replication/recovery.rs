//! Leftovers from interrupted receive sessions.
//!
//! A crash between init and switch leaves `.D` behind; a crash inside a
//! swap can leave `._D` (and for merges `.~D`). The inspector finds
//! them and, on request, returns each index to a clean state:
//!
//! - live content missing but trash present: trash is renamed back
//! - otherwise staging, trash and merge work directories are deleted

use crate::core::catalog::CatalogRegistry;
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::{
    classify_hidden, directory_size, merge_work_dir, staging_dir, trash_dir, Leftover,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Leftover state for one index name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub name: String,
    pub staging: bool,
    pub trash: bool,
    pub merge_work: bool,
    pub live_present: bool,
    pub staging_bytes: u64,
    pub trash_bytes: u64,
}

impl RecoveryReport {
    /// Live content is gone and only the trash can bring it back
    pub fn needs_restore(&self) -> bool {
        !self.live_present && self.trash
    }
}

/// What `repair` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairAction {
    /// Nothing was left over
    Clean,
    /// Trash was renamed back to the live directory
    Restored,
    /// Leftover directories were deleted
    Discarded,
}

pub struct RecoveryInspector {
    registry: Arc<CatalogRegistry>,
}

impl RecoveryInspector {
    pub fn new(registry: Arc<CatalogRegistry>) -> Self {
        Self { registry }
    }

    /// Every index with leftovers, sorted by name
    ///
    /// Names with a swap in flight are skipped; their sibling
    /// directories are in active use.
    pub fn scan(&self) -> Result<Vec<RecoveryReport>> {
        let root = self.registry.layout().root();
        let mut found: BTreeMap<String, RecoveryReport> = BTreeMap::new();

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let entry_name = entry.file_name().to_string_lossy().to_string();
            let Some(leftover) = classify_hidden(&entry_name) else {
                continue;
            };

            let (Leftover::Staging(name) | Leftover::Trash(name) | Leftover::MergeWork(name)) =
                &leftover;
            if self.registry.layout().validate_name(name).is_err() {
                continue;
            }
            let report = found.entry(name.clone()).or_insert_with(|| RecoveryReport {
                name: name.clone(),
                ..Default::default()
            });
            match leftover {
                Leftover::Staging(_) => {
                    report.staging = true;
                    report.staging_bytes = directory_size(&entry.path());
                }
                Leftover::Trash(_) => {
                    report.trash = true;
                    report.trash_bytes = directory_size(&entry.path());
                }
                Leftover::MergeWork(_) => report.merge_work = true,
            }
        }

        let mut reports = Vec::new();
        for (name, mut report) in found {
            if self.registry.is_locked(&name) {
                tracing::debug!("Skipping '{}': swap in flight", name);
                continue;
            }
            report.live_present = self.registry.layout().index_dir(&name)?.is_dir();
            reports.push(report);
        }
        Ok(reports)
    }

    /// Bring `name` back to a state with no leftovers
    pub fn repair(&self, name: &str) -> Result<RepairAction> {
        if self.registry.is_locked(name) {
            return Err(ReshelveError::CatalogBusy {
                name: name.to_string(),
                waited_ms: 0,
            });
        }

        let admission = self.registry.admit(name)?;
        let live = admission.dir().to_path_buf();
        let staging = staging_dir(&live)?;
        let trash = trash_dir(&live)?;
        let work = merge_work_dir(&live)?;

        let action = if !live.exists() && trash.is_dir() {
            fs::rename(&trash, &live).map_err(|e| ReshelveError::staging(&trash, e))?;
            remove_if_present(&staging)?;
            remove_if_present(&work)?;
            tracing::info!("Restored '{}' from trash", name);
            RepairAction::Restored
        } else {
            let mut removed = false;
            for dir in [&staging, &trash, &work] {
                removed |= remove_if_present(dir)?;
            }
            if removed {
                tracing::info!("Discarded leftovers for '{}'", name);
                RepairAction::Discarded
            } else {
                RepairAction::Clean
            }
        };

        admission.release();
        Ok(action)
    }
}

fn remove_if_present(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir).map_err(|e| ReshelveError::staging(dir, e))?;
    Ok(true)
}
