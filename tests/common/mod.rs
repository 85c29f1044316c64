// Common test utilities and fixtures

pub mod fixtures;

// Re-export commonly used items
// Note: These may appear unused in some test binaries
#[allow(unused_imports)]
pub use fixtures::{copy_tree, doc_count, seed_index, set_mtime, SourceTree, HEAP};
#[allow(unused_imports)]
pub use helpers::{stage_tree, test_registry, wait_until, EventLog, TestEngine};
