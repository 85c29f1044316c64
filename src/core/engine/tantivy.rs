//! Tantivy integration for the catalog engine.
//!
//! This module wraps Tantivy operations for opening, inspecting
//! and merging the indexes a catalog hands out.

use crate::core::engine::{EngineInstance, IndexEngine};
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::{directory_size, merge_work_dir};
use crate::core::types::IndexStatistics;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::directory::MmapDirectory;
use tantivy::indexer::merge_indices;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy};

/// Name of the file Tantivy keeps its segment list in
const META_FILE: &str = "meta.json";

/// Create the Tantivy schema for newly created indexes
///
/// Fields:
/// - id: Document identifier (STRING | STORED)
/// - body: Full-text searchable content (TEXT | STORED)
/// - indexed_at: Timestamp (Date | STORED)
pub fn create_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("body", TEXT | STORED);
    builder.add_date_field("indexed_at", STORED);

    builder.build()
}

fn engine_err(context: &str, e: impl std::fmt::Display) -> ReshelveError {
    ReshelveError::Engine(format!("{context}: {e}"))
}

/// A document as written by the primary side
#[derive(Debug, Clone)]
pub struct IndexDocument {
    pub id: String,
    pub body: String,
}

impl IndexDocument {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }
}

/// Tantivy index wrapper
pub struct TantivyIndex {
    /// Directory the index lives in
    dir: PathBuf,

    /// Tantivy index instance
    index: Index,

    /// Manually reloaded reader
    reader: IndexReader,
}

impl std::fmt::Debug for TantivyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyIndex")
            .field("dir", &self.dir)
            .finish()
    }
}

impl TantivyIndex {
    /// Open the index in `dir`, creating an empty one if none exists yet
    pub fn open_or_create(dir: &Path) -> Result<Self> {
        if dir.join(META_FILE).exists() {
            return Self::open(dir);
        }

        let index = Index::create_in_dir(dir, create_schema())
            .map_err(|e| engine_err("Failed to create index", e))?;
        Self::from_index(dir, index)
    }

    /// Open an existing Tantivy index
    pub fn open(dir: &Path) -> Result<Self> {
        let index =
            Index::open_in_dir(dir).map_err(|e| engine_err("Failed to open index", e))?;
        Self::from_index(dir, index)
    }

    fn from_index(dir: &Path, index: Index) -> Result<Self> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| engine_err("Failed to create reader", e))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            index,
            reader,
        })
    }

    /// Add documents and commit them (primary-side writes)
    ///
    /// The writer is dropped before returning so the directory carries
    /// no writer lock afterwards.
    pub fn write_documents(&self, docs: &[IndexDocument], heap_bytes: usize) -> Result<()> {
        let schema = self.index.schema();
        let id_field = schema
            .get_field("id")
            .map_err(|e| engine_err("Missing id field", e))?;
        let body_field = schema
            .get_field("body")
            .map_err(|e| engine_err("Missing body field", e))?;
        let indexed_at_field = schema
            .get_field("indexed_at")
            .map_err(|e| engine_err("Missing indexed_at field", e))?;

        let mut writer: IndexWriter = self
            .index
            .writer_with_num_threads(1, heap_bytes)
            .map_err(|e| engine_err("Failed to create writer", e))?;

        let now = tantivy::DateTime::from_timestamp_secs(Utc::now().timestamp());
        for d in docs {
            writer
                .add_document(doc!(
                    id_field => d.id.as_str(),
                    body_field => d.body.as_str(),
                    indexed_at_field => now,
                ))
                .map_err(|e| engine_err("Failed to add document", e))?;
        }

        writer
            .commit()
            .map_err(|e| engine_err("Failed to commit", e))?;
        drop(writer);

        self.reload()
    }

    fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn num_segments(&self) -> usize {
        self.reader.searcher().segment_readers().len()
    }
}

impl EngineInstance for TantivyIndex {
    fn reload(&self) -> Result<()> {
        self.reader
            .reload()
            .map_err(|e| engine_err("Failed to reload reader", e))
    }

    fn statistics(&self) -> Result<IndexStatistics> {
        Ok(IndexStatistics {
            num_docs: self.num_docs(),
            num_segments: self.num_segments(),
            size_bytes: directory_size(&self.dir),
        })
    }

    fn close(self: Box<Self>) -> Result<()> {
        tracing::debug!("Closing index at {:?}", self.dir);
        Ok(())
    }
}

/// Read-through view over several member indexes
struct CompositeIndex {
    dir: PathBuf,
    members: Vec<TantivyIndex>,
}

impl EngineInstance for CompositeIndex {
    fn reload(&self) -> Result<()> {
        for member in &self.members {
            member.reload()?;
        }
        Ok(())
    }

    fn statistics(&self) -> Result<IndexStatistics> {
        let mut stats = IndexStatistics::default();
        for member in &self.members {
            stats.num_docs += member.num_docs();
            stats.num_segments += member.num_segments();
        }
        stats.size_bytes = directory_size(&self.dir);
        Ok(stats)
    }

    fn close(self: Box<Self>) -> Result<()> {
        tracing::debug!(
            "Closing composite at {:?} ({} members)",
            self.dir,
            self.members.len()
        );
        Ok(())
    }
}

/// Default engine backed by Tantivy
#[derive(Debug, Clone, Default)]
pub struct TantivyEngine;

impl TantivyEngine {
    pub fn new() -> Self {
        Self
    }
}

impl IndexEngine for TantivyEngine {
    fn open(&self, dir: &Path) -> Result<Box<dyn EngineInstance>> {
        Ok(Box::new(TantivyIndex::open_or_create(dir)?))
    }

    fn open_composite(&self, dir: &Path, members: &[PathBuf]) -> Result<Box<dyn EngineInstance>> {
        let members = members
            .iter()
            .map(|m| TantivyIndex::open(m))
            .collect::<Result<Vec<_>>>()?;

        Ok(Box::new(CompositeIndex {
            dir: dir.to_path_buf(),
            members,
        }))
    }

    /// Merge by writing the union of both segment sets into a work
    /// directory, then replacing the target content with it.
    ///
    /// The replace step is not atomic: a crash between the removal and the
    /// rename leaves only the work directory.
    fn merge(&self, target: &Path, incoming: &Path) -> Result<()> {
        let work = merge_work_dir(target)?;
        if work.exists() {
            fs::remove_dir_all(&work)?;
        }
        fs::create_dir_all(&work)?;

        {
            let target_index =
                Index::open_in_dir(target).map_err(|e| engine_err("Failed to open target", e))?;
            let incoming_index = Index::open_in_dir(incoming)
                .map_err(|e| engine_err("Failed to open incoming", e))?;
            let output = MmapDirectory::open(&work)
                .map_err(|e| engine_err("Failed to open merge directory", e))?;

            merge_indices(&[target_index, incoming_index], output)
                .map_err(|e| engine_err("Failed to merge", e))?;
        }

        fs::remove_dir_all(target)?;
        fs::rename(&work, target)?;
        Ok(())
    }
}
