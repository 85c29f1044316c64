// Integration tests for leftover inspection and repair

use crate::common::{doc_count, seed_index, stage_tree, test_registry, wait_until, SourceTree};
use reshelve::core::replication::{RecoveryInspector, ReplicationReceiver, RepairAction};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn test_restore_after_crash_between_renames() {
    let root = TempDir::new().unwrap();
    // Live content already moved to trash, staged content not yet promoted
    seed_index(&root.path().join("._shop"), "v1", 4);
    fs::create_dir(root.path().join(".shop")).unwrap();
    fs::write(root.path().join(".shop/partial.bin"), "xx").unwrap();

    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let inspector = RecoveryInspector::new(Arc::clone(&registry));

    let reports = inspector.scan().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].needs_restore());
    assert!(reports[0].staging);
    assert_eq!(reports[0].staging_bytes, 2);
    assert!(reports[0].trash_bytes > 0);

    assert_eq!(inspector.repair("shop").unwrap(), RepairAction::Restored);
    assert!(!root.path().join("._shop").exists());
    assert!(!root.path().join(".shop").exists());
    assert_eq!(doc_count(&registry, "shop"), 4);
    assert!(inspector.scan().unwrap().is_empty());
}

#[test]
fn test_discard_abandoned_session() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "v1", 2);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    let receiver = ReplicationReceiver::new(Arc::clone(&registry));
    let inspector = RecoveryInspector::new(Arc::clone(&registry));

    // Sender went away after staging part of an update
    let source = SourceTree::index("v2", 3);
    stage_tree(&receiver, "shop", source.path(), false).unwrap();
    fs::create_dir(root.path().join(".~shop")).unwrap();

    let reports = inspector.scan().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].live_present);
    assert!(reports[0].merge_work);
    assert!(!reports[0].needs_restore());

    assert_eq!(inspector.repair("shop").unwrap(), RepairAction::Discarded);
    assert!(!root.path().join(".shop").exists());
    assert!(!root.path().join(".~shop").exists());
    assert_eq!(doc_count(&registry, "shop"), 2);

    assert_eq!(inspector.repair("shop").unwrap(), RepairAction::Clean);
}

#[test]
fn test_swap_in_flight_is_left_alone() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("shop"), "v1", 1);
    let (registry, engine) = test_registry(root.path(), TIMEOUT);
    let receiver = Arc::new(ReplicationReceiver::new(Arc::clone(&registry)));
    let inspector = RecoveryInspector::new(Arc::clone(&registry));

    let source = SourceTree::index("v2", 2);
    stage_tree(&receiver, "shop", source.path(), false).unwrap();

    // Hold the swap at its reopen step, with trash on disk
    engine.stall_opens(Duration::from_millis(500));
    let swapper = {
        let receiver = Arc::clone(&receiver);
        thread::spawn(move || receiver.switch_in("shop"))
    };
    assert!(wait_until(Duration::from_secs(5), || registry.is_locked("shop")));

    assert!(inspector.scan().unwrap().is_empty());
    assert!(inspector.repair("shop").unwrap_err().is_busy());

    swapper.join().unwrap().unwrap();
    engine.stall_opens(Duration::ZERO);
    assert!(inspector.scan().unwrap().is_empty());
    assert_eq!(doc_count(&registry, "shop"), 2);
}
