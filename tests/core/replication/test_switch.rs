// Integration tests for switching staged content in

use crate::common::{
    copy_tree, doc_count, seed_index, set_mtime, stage_tree, test_registry, EventLog, SourceTree,
};
use reshelve::core::error::ReshelveError;
use reshelve::core::layout::{MANIFEST_FILE, SENTINEL_FILE};
use reshelve::core::replication::ReplicationReceiver;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn test_switch_keeps_unchanged_files() {
    let root = TempDir::new().unwrap();
    let live = root.path().join("shop");
    fs::create_dir(&live).unwrap();
    let old_body = "b".repeat(100);
    let mtime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    fs::write(live.join("b.txt"), &old_body).unwrap();
    set_mtime(&live.join("b.txt"), mtime);

    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));

    receiver.init("shop").unwrap();
    receiver
        .put_file("shop", "a.txt", SystemTime::now(), "fresh".as_bytes())
        .unwrap();
    assert!(receiver.file_exists("shop", "b.txt", mtime, 100).unwrap());

    let report = receiver.switch_in("shop").unwrap();
    assert_eq!(report.name, "shop");
    assert_eq!(report.files_reused, 1);

    assert_eq!(fs::read_to_string(live.join("a.txt")).unwrap(), "fresh");
    assert_eq!(fs::read_to_string(live.join("b.txt")).unwrap(), old_body);
    assert!(!live.join(MANIFEST_FILE).exists());
    assert!(!root.path().join(".shop").exists());
    assert!(!root.path().join("._shop").exists());

    // The new handle is live and flagged as replicated
    let handle = registry.peek("shop").expect("handle installed by the swap");
    assert!(handle.is_true_replicate());
    assert!(live.join(SENTINEL_FILE).exists());
}

#[test]
fn test_file_exists_rejects_changed_files() {
    let root = TempDir::new().unwrap();
    let live = root.path().join("shop");
    fs::create_dir(&live).unwrap();
    let mtime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    fs::write(live.join("b.txt"), "0123456789").unwrap();
    set_mtime(&live.join("b.txt"), mtime);

    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(registry);
    receiver.init("shop").unwrap();

    assert!(!receiver.file_exists("shop", "b.txt", mtime, 11).unwrap());
    assert!(!receiver
        .file_exists("shop", "b.txt", mtime + Duration::from_secs(1), 10)
        .unwrap());
    assert!(!receiver.file_exists("shop", "missing.txt", mtime, 10).unwrap());
    assert!(!root.path().join(".shop").join(MANIFEST_FILE).exists());
}

#[test]
fn test_switch_reuses_unchanged_segments() {
    let root = TempDir::new().unwrap();
    let live = root.path().join("shop");
    seed_index(&live, "v1", 3);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    let old = registry.get("shop").unwrap();

    // The sender holds the same segments plus one new one
    let source = TempDir::new().unwrap();
    copy_tree(&live, source.path());
    seed_index(source.path(), "v2", 2);

    let (sent, skipped) = stage_tree(&receiver, "shop", source.path(), true).unwrap();
    assert!(sent > 0);
    assert!(skipped > 0, "existing segment files should not be resent");

    let report = receiver.switch_in("shop").unwrap();
    assert_eq!(report.files_reused, skipped);
    assert!(!old.is_open());
    assert_eq!(doc_count(&registry, "shop"), 5);
    assert!(!live.join(MANIFEST_FILE).exists());
}

#[test]
fn test_switch_reopens_dependents() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "v1", 2);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    let log = EventLog::attach(&registry);

    let old_shop = registry.get("shop").unwrap();
    registry
        .create_composite("catalog", &["shop".to_string()])
        .unwrap();
    let old_catalog = registry.get("catalog").unwrap();
    assert_eq!(doc_count(&registry, "catalog"), 2);

    let source = SourceTree::index("v2", 4);
    stage_tree(&receiver, "shop", source.path(), false).unwrap();
    let report = receiver.switch_in("shop").unwrap();

    assert_eq!(report.dependents, vec!["catalog"]);
    assert!(!old_shop.is_open());
    assert!(!old_catalog.is_open());
    assert!(registry.peek("catalog").is_none());

    // No manual step: the composite reopens against the new member content
    assert_eq!(doc_count(&registry, "catalog"), 4);
    assert_eq!(log.events(), vec!["swapped:shop"]);
    assert_eq!(log.previous_closed(), vec![true]);
}

#[test]
fn test_switch_creates_new_index() {
    let root = TempDir::new().unwrap();
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));

    let source = SourceTree::index("fresh", 6);
    stage_tree(&receiver, "fresh", source.path(), true).unwrap();
    let report = receiver.switch_in("fresh").unwrap();

    assert_eq!(report.files_reused, 0);
    assert_eq!(doc_count(&registry, "fresh"), 6);
    assert!(!root.path().join("._fresh").exists());
}

#[test]
fn test_switch_without_session() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "v1", 1);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    let handle = registry.get("shop").unwrap();

    let err = receiver.switch_in("shop").unwrap_err();
    assert!(matches!(err, ReshelveError::SwapAborted { .. }));

    // Nothing was admitted, so the live handle is untouched
    assert!(handle.is_open());
    assert!(Arc::ptr_eq(&handle, &registry.peek("shop").unwrap()));
}

#[test]
fn test_switch_drops_leftover_trash() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "v1", 1);
    let stale = root.path().join("._shop");
    fs::create_dir(&stale).unwrap();
    fs::write(stale.join("junk"), "old").unwrap();

    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));

    let source = SourceTree::index("v2", 2);
    stage_tree(&receiver, "shop", source.path(), false).unwrap();
    receiver.switch_in("shop").unwrap();

    assert!(!stale.exists());
    assert!(!root.path().join("shop").join("junk").exists());
    assert_eq!(doc_count(&registry, "shop"), 2);
}
