// Integration tests for merging incremental updates

use crate::common::{doc_count, seed_index, stage_tree, test_registry, EventLog, SourceTree};
use reshelve::core::error::ReshelveError;
use reshelve::core::replication::ReplicationReceiver;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn test_merge_adds_documents() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "base", 3);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    let log = EventLog::attach(&registry);
    let old = registry.get("shop").unwrap();

    let delta = SourceTree::index("delta", 2);
    stage_tree(&receiver, "shop", delta.path(), false).unwrap();
    let report = receiver.merge_in("shop").unwrap();

    assert_eq!(report.files_reused, 0);
    assert!(!old.is_open());
    assert_eq!(doc_count(&registry, "shop"), 5);
    assert!(registry.peek("shop").unwrap().is_true_replicate());
    assert!(!root.path().join(".shop").exists());
    assert!(!root.path().join(".~shop").exists());
    assert_eq!(log.events(), vec!["merged:shop"]);
}

#[test]
fn test_merge_reopens_dependents() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "base", 1);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    registry
        .create_composite("catalog", &["shop".to_string()])
        .unwrap();
    assert_eq!(doc_count(&registry, "catalog"), 1);

    let delta = SourceTree::index("delta", 4);
    stage_tree(&receiver, "shop", delta.path(), false).unwrap();
    let report = receiver.merge_in("shop").unwrap();

    assert_eq!(report.dependents, vec!["catalog"]);
    assert_eq!(doc_count(&registry, "catalog"), 5);
}

#[test]
fn test_merge_into_composite_rejected() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "base", 1);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    registry
        .create_composite("catalog", &["shop".to_string()])
        .unwrap();

    receiver.init("catalog").unwrap();
    let err = receiver.merge_in("catalog").unwrap_err();
    assert!(matches!(err, ReshelveError::SwapAborted { .. }));
    assert!(!registry.is_locked("catalog"));
}

#[test]
fn test_merge_into_missing_index() {
    let root = TempDir::new().unwrap();
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(registry);

    receiver.init("ghost").unwrap();
    assert!(receiver.merge_in("ghost").unwrap_err().is_not_found());

    receiver.abort("ghost").unwrap();
    let err = receiver.merge_in("ghost").unwrap_err();
    assert!(matches!(err, ReshelveError::SwapAborted { .. }));
}
