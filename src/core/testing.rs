//! Shared fixtures for unit tests.

use crate::core::catalog::{CatalogEvent, CatalogListener, CatalogRegistry};
use crate::core::engine::{EngineInstance, IndexEngine, TantivyEngine};
use crate::core::error::{Result, ReshelveError};
use crate::core::layout::CatalogLayout;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tantivy engine that counts opens and can be told to fail merges
#[derive(Default)]
pub struct CountingEngine {
    inner: TantivyEngine,
    opens: AtomicUsize,
    fail_merge: AtomicBool,
}

impl CountingEngine {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn fail_next_merge(&self) {
        self.fail_merge.store(true, Ordering::SeqCst);
    }
}

impl IndexEngine for CountingEngine {
    fn open(&self, dir: &Path) -> Result<Box<dyn EngineInstance>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(dir)
    }

    fn open_composite(&self, dir: &Path, members: &[PathBuf]) -> Result<Box<dyn EngineInstance>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open_composite(dir, members)
    }

    fn merge(&self, target: &Path, incoming: &Path) -> Result<()> {
        if self.fail_merge.swap(false, Ordering::SeqCst) {
            return Err(ReshelveError::Engine("injected merge failure".to_string()));
        }
        self.inner.merge(target, incoming)
    }
}

/// Registry over `root` with a counting engine
pub fn registry_in(root: &Path, timeout: Duration) -> (CatalogRegistry, Arc<CountingEngine>) {
    let engine = Arc::new(CountingEngine::default());
    let layout = CatalogLayout::new(root, vec!["conf".to_string(), "logs".to_string()]).unwrap();
    let registry = CatalogRegistry::new(layout, engine.clone(), timeout);
    (registry, engine)
}

/// Listener recording events as "kind:name" strings
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
    previous_open: Mutex<Vec<bool>>,
}

impl RecordingListener {
    pub fn attach(registry: &CatalogRegistry) -> Arc<Self> {
        let listener = Arc::new(Self::default());
        registry.add_listener(listener.clone());
        listener
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// For swap/merge events: whether the superseded handle was still open
    pub fn previous_open(&self) -> Vec<bool> {
        self.previous_open.lock().unwrap().clone()
    }
}

impl CatalogListener for RecordingListener {
    fn catalog_changed(&self, event: &CatalogEvent) {
        let kind = match event {
            CatalogEvent::Closed { .. } => "closed",
            CatalogEvent::Swapped { previous, .. } | CatalogEvent::Merged { previous, .. } => {
                if let Some(previous) = previous {
                    self.previous_open.lock().unwrap().push(previous.is_open());
                }
                if matches!(event, CatalogEvent::Swapped { .. }) {
                    "swapped"
                } else {
                    "merged"
                }
            }
            CatalogEvent::Erased { .. } => "erased",
        };
        self.events
            .lock()
            .unwrap()
            .push(format!("{kind}:{}", event.name()));
    }
}
