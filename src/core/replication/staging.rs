//! Receive staging and the diff manifest.
//!
//! A receive session fills `.D` next to the live directory `D`. Files
//! the sender can skip because `D` already holds identical bytes are
//! recorded in `.D/.path-to-move` and recovered from trash at swap time.

use crate::core::error::{Result, ReshelveError};
use crate::core::layout::{join_relative, staging_dir, trash_dir, MANIFEST_FILE};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the epoch; sub-millisecond precision is dropped
/// because filesystems disagree on it
pub fn mtime_millis(t: SystemTime) -> i128 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i128,
        Err(e) => -(e.duration().as_millis() as i128),
    }
}

/// Append-only list of relative paths, one per line
#[derive(Debug, Clone)]
pub struct DiffManifest {
    path: PathBuf,
}

impl DiffManifest {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Manifest stored inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MANIFEST_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, rel: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ReshelveError::staging(&self.path, e))?;
        writeln!(file, "{rel}").map_err(|e| ReshelveError::staging(&self.path, e))
    }

    /// Recorded paths in order; a missing manifest is empty
    pub fn read(&self) -> Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReshelveError::staging(&self.path, e)),
        };

        let mut paths = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| ReshelveError::staging(&self.path, e))?;
            let line = line.trim();
            if !line.is_empty() {
                paths.push(line.to_string());
            }
        }
        Ok(paths)
    }

    /// Delete the manifest; a missing manifest is fine
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReshelveError::staging(&self.path, e)),
        }
    }

    /// Move every recorded path from `trash` into `live`
    ///
    /// Paths already present in `live` are left alone. A path found in
    /// neither directory makes the manifest corrupt. The manifest is
    /// expected at `live/.path-to-move` (staging has been renamed into
    /// place) and is deleted once every path is applied.
    pub fn apply(live: &Path, trash: &Path) -> Result<usize> {
        let manifest = Self::in_dir(live);
        let mut moved = 0;

        for rel in manifest.read()? {
            let dest = join_relative(live, &rel)?;
            if dest.exists() {
                continue;
            }
            let src = join_relative(trash, &rel)?;
            if !src.exists() {
                return Err(ReshelveError::ManifestCorrupt(rel));
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ReshelveError::staging(parent, e))?;
            }
            fs::rename(&src, &dest).map_err(|e| ReshelveError::staging(&dest, e))?;
            moved += 1;
        }

        manifest.remove()?;
        Ok(moved)
    }
}

/// Staging and trash siblings of one live directory
#[derive(Debug, Clone)]
pub struct StagingArea {
    live: PathBuf,
    staging: PathBuf,
    trash: PathBuf,
}

impl StagingArea {
    pub fn new(live: &Path) -> Result<Self> {
        Ok(Self {
            live: live.to_path_buf(),
            staging: staging_dir(live)?,
            trash: trash_dir(live)?,
        })
    }

    pub fn live_dir(&self) -> &Path {
        &self.live
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    pub fn trash_dir(&self) -> &Path {
        &self.trash
    }

    pub fn manifest(&self) -> DiffManifest {
        DiffManifest::in_dir(&self.staging)
    }

    /// True while a receive session has a staging directory
    pub fn is_receiving(&self) -> bool {
        self.staging.is_dir()
    }

    fn ensure_receiving(&self) -> Result<()> {
        if self.is_receiving() {
            return Ok(());
        }
        Err(ReshelveError::staging(
            &self.staging,
            io::Error::new(io::ErrorKind::NotFound, "no receive session, call init first"),
        ))
    }

    /// Start a receive session, discarding any earlier partial one
    pub fn begin_receive(&self) -> Result<()> {
        if self.staging.exists() {
            tracing::info!("Discarding partial receive at {:?}", self.staging);
            fs::remove_dir_all(&self.staging)
                .map_err(|e| ReshelveError::staging(&self.staging, e))?;
        }
        fs::create_dir_all(&self.staging).map_err(|e| ReshelveError::staging(&self.staging, e))
    }

    /// Stage an empty directory
    pub fn mkdir(&self, rel: &str) -> Result<()> {
        self.ensure_receiving()?;
        let path = join_relative(&self.staging, rel)?;
        fs::create_dir_all(&path).map_err(|e| ReshelveError::staging(&path, e))
    }

    /// Check `rel` against the live copy and record it if identical
    pub fn file_unchanged(&self, rel: &str, mtime: SystemTime, size: u64) -> Result<bool> {
        self.ensure_receiving()?;
        let live_path = join_relative(&self.live, rel)?;

        let meta = match fs::metadata(&live_path) {
            Ok(m) if m.is_file() => m,
            _ => return Ok(false),
        };
        let live_mtime = meta
            .modified()
            .map_err(|e| ReshelveError::staging(&live_path, e))?;

        if meta.len() != size || mtime_millis(live_mtime) != mtime_millis(mtime) {
            return Ok(false);
        }

        self.manifest().append(rel)?;
        tracing::debug!("Unchanged: {}", rel);
        Ok(true)
    }

    /// Stream a file into staging and stamp its mtime
    pub fn receive_file(&self, rel: &str, mtime: SystemTime, mut body: impl Read) -> Result<u64> {
        self.ensure_receiving()?;
        let path = join_relative(&self.staging, rel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReshelveError::staging(parent, e))?;
        }

        let mut file = File::create(&path).map_err(|e| ReshelveError::staging(&path, e))?;
        let written = io::copy(&mut body, &mut file).map_err(|e| ReshelveError::staging(&path, e))?;
        file.set_modified(mtime)
            .map_err(|e| ReshelveError::staging(&path, e))?;

        tracing::debug!("Received {} ({} bytes)", rel, written);
        Ok(written)
    }

    /// Remove a leftover trash directory
    pub fn clear_trash(&self) -> Result<bool> {
        if !self.trash.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.trash).map_err(|e| ReshelveError::staging(&self.trash, e))?;
        Ok(true)
    }

    /// Remove the staging directory
    pub fn clear_staging(&self) -> Result<bool> {
        if !self.staging.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.staging)
            .map_err(|e| ReshelveError::staging(&self.staging, e))?;
        Ok(true)
    }

    /// Return to the pre-receive state; safe to call any number of times
    pub fn abort(&self) -> Result<()> {
        let staged = self.clear_staging()?;
        let trashed = self.clear_trash()?;
        if staged || trashed {
            tracing::info!(
                "Aborted receive for {:?} (staging: {}, trash: {})",
                self.live,
                staged,
                trashed
            );
        }
        Ok(())
    }
}
