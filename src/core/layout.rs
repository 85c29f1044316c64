//! On-disk layout of the data root.
//!
//! ```text
//! {data_root}/
//! ├── shop/                 # live content
//! │   ├── meta.json
//! │   ├── repl.check        # present if content arrived via replication
//! │   └── [segment files]
//! ├── .shop/                # receive staging
//! │   └── .path-to-move     # diff manifest
//! ├── ._shop/               # trash (rollback point during a swap)
//! └── catalog/
//!     └── composite.toml    # members = ["shop", ...]
//! ```
//!
//! Staging and trash are siblings of the live directory so that every
//! rename stays on one filesystem. The data root must not span volumes.

use crate::core::error::{Result, ReshelveError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Diff manifest file name inside the staging directory
pub const MANIFEST_FILE: &str = ".path-to-move";

/// Sentinel marking replicated content
pub const SENTINEL_FILE: &str = "repl.check";

/// Composite declaration file
pub const COMPOSITE_FILE: &str = "composite.toml";

const STAGING_PREFIX: &str = ".";
const TRASH_PREFIX: &str = "._";
const MERGE_PREFIX: &str = ".~";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.+\-]*$").expect("valid name regex"));

/// Data root plus the naming rules for index directories
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    root: PathBuf,
    reserved_names: Vec<String>,
}

impl CatalogLayout {
    /// Create the data root if needed and canonicalize it
    pub fn new(root: &Path, reserved_names: Vec<String>) -> Result<Self> {
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        Ok(Self {
            root,
            reserved_names,
        })
    }

    /// Canonical data root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject dotted, reserved and malformed names
    pub fn validate_name(&self, name: &str) -> Result<()> {
        if name.starts_with('.') {
            return Err(ReshelveError::NameRejected(format!(
                "'{name}' starts with '.'"
            )));
        }
        if !NAME_RE.is_match(name) {
            return Err(ReshelveError::NameRejected(format!(
                "'{name}' must start with [A-Za-z0-9] and use only [A-Za-z0-9_.+-]"
            )));
        }
        if self
            .reserved_names
            .iter()
            .any(|r| r.eq_ignore_ascii_case(name))
        {
            return Err(ReshelveError::NameRejected(format!(
                "'{name}' is a reserved name"
            )));
        }
        Ok(())
    }

    /// Live directory for a validated name
    pub fn index_dir(&self, name: &str) -> Result<PathBuf> {
        self.validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Names of every valid index directory under the root, sorted
    pub fn list_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

fn sibling(dir: &Path, prefix: &str) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReshelveError::InvalidPath(dir.display().to_string()))?;
    let parent = dir
        .parent()
        .ok_or_else(|| ReshelveError::InvalidPath(dir.display().to_string()))?;
    Ok(parent.join(format!("{prefix}{name}")))
}

/// `.D`: receive staging next to `dir`
pub fn staging_dir(dir: &Path) -> Result<PathBuf> {
    sibling(dir, STAGING_PREFIX)
}

/// `._D`: trash next to `dir`
pub fn trash_dir(dir: &Path) -> Result<PathBuf> {
    sibling(dir, TRASH_PREFIX)
}

/// `.~D`: scratch space for engine merges
///
/// Neither `~` nor `_` is a legal leading name character, so no sibling
/// ever collides with another index's staging directory.
pub fn merge_work_dir(dir: &Path) -> Result<PathBuf> {
    sibling(dir, MERGE_PREFIX)
}

/// What a dot-prefixed entry in the data root belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leftover {
    Staging(String),
    Trash(String),
    MergeWork(String),
}

/// Classify a hidden directory name found in the data root
pub fn classify_hidden(entry_name: &str) -> Option<Leftover> {
    if let Some(name) = entry_name.strip_prefix(MERGE_PREFIX) {
        return Some(Leftover::MergeWork(name.to_string()));
    }
    if let Some(name) = entry_name.strip_prefix(TRASH_PREFIX) {
        return Some(Leftover::Trash(name.to_string()));
    }
    if let Some(name) = entry_name.strip_prefix(STAGING_PREFIX) {
        if !name.is_empty() {
            return Some(Leftover::Staging(name.to_string()));
        }
    }
    None
}

/// Validate a sender-supplied relative path and join it onto `base`
///
/// Accepts `/`-separated paths only; rejects absolute paths, `..`, empty
/// components and the manifest file itself.
pub fn join_relative(base: &Path, rel: &str) -> Result<PathBuf> {
    let trimmed = rel.trim_start_matches("./");
    if trimmed.is_empty() || trimmed.starts_with('/') || trimmed.contains('\\') {
        return Err(ReshelveError::InvalidPath(rel.to_string()));
    }

    let mut out = base.to_path_buf();
    for part in trimmed.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return Err(ReshelveError::InvalidPath(rel.to_string()));
        }
        out.push(part);
    }

    if trimmed == MANIFEST_FILE {
        return Err(ReshelveError::InvalidPath(format!(
            "{rel} is reserved for the diff manifest"
        )));
    }
    Ok(out)
}

/// Calculate total size of a directory recursively
pub fn directory_size(dir_path: &Path) -> u64 {
    if !dir_path.exists() {
        return 0;
    }

    WalkDir::new(dir_path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
