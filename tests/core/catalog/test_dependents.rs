// Integration tests for composite indices and dependent lookup

use crate::common::{doc_count, seed_index, test_registry};
use reshelve::core::catalog::read_members;
use reshelve::core::error::ReshelveError;
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn test_composite_reads_through_members() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("a"), "a", 3);
    seed_index(&root.path().join("b"), "b", 2);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);

    let dir = registry
        .create_composite("both", &["a".to_string(), "b".to_string()])
        .unwrap();
    assert_eq!(read_members(&dir).unwrap(), vec!["a", "b"]);

    let handle = registry.get("both").unwrap();
    assert!(handle.is_composite());
    assert!(handle.reads_through("a"));
    assert!(!handle.reads_through("both"));
    assert_eq!(doc_count(&registry, "both"), 5);
}

#[test]
fn test_dependents_come_from_live_handles_only() {
    let root = TempDir::new().unwrap();
    seed_index(&root.path().join("a"), "a", 1);
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    registry.create_composite("c1", &["a".to_string()]).unwrap();
    registry.create_composite("c2", &["a".to_string()]).unwrap();

    assert!(registry.find_dependents("a").is_empty());

    registry.get("c2").unwrap();
    registry.get("c1").unwrap();
    let names: Vec<_> = registry
        .find_dependents("a")
        .iter()
        .map(|h| h.name().to_string())
        .collect();
    assert_eq!(names, vec!["c1", "c2"]);

    registry.close("c1").unwrap();
    assert_eq!(registry.find_dependents("a").len(), 1);
}

#[test]
fn test_composite_cannot_include_itself() {
    let root = TempDir::new().unwrap();
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);

    let err = registry
        .create_composite("loop", &["loop".to_string()])
        .unwrap_err();
    assert!(matches!(err, ReshelveError::NameRejected(_)));
    assert!(!root.path().join("loop").exists());
}

#[test]
fn test_composite_with_missing_member() {
    let root = TempDir::new().unwrap();
    let (registry, _engine) = test_registry(root.path(), TIMEOUT);
    registry.create_composite("c", &["gone".to_string()]).unwrap();

    let err = registry.get("c").unwrap_err();
    assert!(err.is_not_found());
    assert!(registry.peek("c").is_none());
}
