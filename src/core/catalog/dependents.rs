//! Composite declarations and dependent resolution.
//!
//! A composite index declares its members in `composite.toml` inside its
//! own directory. Dependents are always recomputed from the live map;
//! a stale answer could leave a composite holding a member's old files
//! open across a swap.

use crate::core::catalog::handle::IndexHandle;
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::COMPOSITE_FILE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contents of `composite.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Names of the indices this one reads through
    #[serde(default)]
    pub members: Vec<String>,
}

/// Member names declared in `dir`, empty for a plain index
pub fn read_members(dir: &Path) -> Result<Vec<String>> {
    let path = dir.join(COMPOSITE_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&path)?;
    let config: CompositeConfig = toml::from_str(&contents).map_err(|e| {
        ReshelveError::ConfigError(format!("Invalid {}: {e}", path.display()))
    })?;
    Ok(config.members)
}

/// Declare `dir` a composite over `members`
pub fn write_members(dir: &Path, members: &[String]) -> Result<()> {
    let config = CompositeConfig {
        members: members.to_vec(),
    };
    fs::write(dir.join(COMPOSITE_FILE), toml::to_string_pretty(&config)?)?;
    Ok(())
}

/// Handles in `live` that read through `name`
pub(crate) fn find_in(
    live: &HashMap<PathBuf, Arc<IndexHandle>>,
    name: &str,
) -> Vec<Arc<IndexHandle>> {
    let mut dependents: Vec<_> = live
        .values()
        .filter(|h| h.reads_through(name))
        .cloned()
        .collect();
    dependents.sort_by(|a, b| a.name().cmp(b.name()));
    dependents
}
