// Test fixtures for integration testing

use reshelve::core::catalog::CatalogRegistry;
use reshelve::core::engine::{IndexDocument, TantivyIndex};
use std::fs::{self, File};
use std::path::Path;
use std::time::SystemTime;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Writer heap used when seeding indices
#[allow(dead_code)] // Used in integration tests
pub const HEAP: usize = 50_000_000;

/// Directory of plain files standing in for a sender's copy
#[allow(dead_code)] // Used in integration tests
pub struct SourceTree {
    pub dir: TempDir,
}

impl SourceTree {
    /// Create a tree with the given (relative_path, content) files
    #[allow(dead_code)] // Used in integration tests
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for (path, content) in files {
            let full_path = dir.path().join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create directories");
            }
            fs::write(&full_path, content).expect("Failed to write file");
        }
        Self { dir }
    }

    /// A fresh Tantivy index holding `n` documents
    #[allow(dead_code)] // Used in integration tests
    pub fn index(prefix: &str, n: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        seed_index(dir.path(), prefix, n);
        Self { dir }
    }

    #[allow(dead_code)] // Used in integration tests
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Add `n` documents to the index in `dir`, creating it if needed
#[allow(dead_code)] // Used in integration tests
pub fn seed_index(dir: &Path, prefix: &str, n: usize) {
    fs::create_dir_all(dir).expect("Failed to create index dir");
    let docs: Vec<_> = (0..n)
        .map(|i| IndexDocument::new(format!("{prefix}-{i}"), format!("{prefix} document {i}")))
        .collect();
    TantivyIndex::open_or_create(dir)
        .expect("Failed to open index")
        .write_documents(&docs, HEAP)
        .expect("Failed to write documents");
}

/// Copy a directory tree keeping file mtimes, as a sender's mirror would
#[allow(dead_code)] // Used in integration tests
pub fn copy_tree(from: &Path, to: &Path) {
    for entry in WalkDir::new(from) {
        let entry = entry.expect("Failed to walk source");
        let target = to.join(entry.path().strip_prefix(from).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).expect("Failed to create directory");
        } else {
            fs::copy(entry.path(), &target).expect("Failed to copy file");
            let mtime = entry.metadata().unwrap().modified().unwrap();
            set_mtime(&target, mtime);
        }
    }
}

/// Stamp a file's modification time
#[allow(dead_code)] // Used in integration tests
pub fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file")
        .set_modified(mtime)
        .expect("Failed to set mtime");
}

/// Documents visible through the live handle for `name`
#[allow(dead_code)] // Used in integration tests
pub fn doc_count(registry: &CatalogRegistry, name: &str) -> u64 {
    registry
        .get(name)
        .expect("Failed to get index")
        .statistics()
        .expect("Failed to read statistics")
        .num_docs
}
