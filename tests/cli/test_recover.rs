//! Tests for the recover CLI command

use crate::cli::test_helpers::create_cli_test_services;
use crate::common::{doc_count, seed_index};
use reshelve::cli::commands::recover::execute;
use reshelve::cli::commands::RecoverArgs;
use reshelve::cli::OutputFormat;
use std::fs;

/// Test recover on a clean catalog
#[tokio::test]
async fn test_recover_nothing_to_do() {
    let (services, _storage_temp) = create_cli_test_services();

    for format in [OutputFormat::Human, OutputFormat::Json] {
        let args = RecoverArgs {
            repair: false,
            name: None,
        };
        assert!(execute(args, &services, format).await.is_ok());
    }
}

/// Test that a report without --repair changes nothing
#[tokio::test]
async fn test_recover_report_only() {
    let (services, storage_temp) = create_cli_test_services();
    fs::create_dir(storage_temp.path().join(".shop")).unwrap();

    let args = RecoverArgs {
        repair: false,
        name: None,
    };
    execute(args, &services, OutputFormat::Human).await.unwrap();
    assert!(storage_temp.path().join(".shop").exists());
}

/// Test repairing every index with leftovers
#[tokio::test]
async fn test_recover_repair_all() {
    let (services, storage_temp) = create_cli_test_services();
    let root = storage_temp.path();
    seed_index(&root.join("shop"), "shop", 1);
    fs::create_dir(root.join(".shop")).unwrap();
    seed_index(&root.join("._books"), "books", 3);

    let args = RecoverArgs {
        repair: true,
        name: None,
    };
    execute(args, &services, OutputFormat::Json).await.unwrap();

    assert!(!root.join(".shop").exists());
    assert!(!root.join("._books").exists());
    assert_eq!(doc_count(&services.registry, "books"), 3);
    assert_eq!(doc_count(&services.registry, "shop"), 1);
}

/// Test limiting repair to one name
#[tokio::test]
async fn test_recover_repair_single_name() {
    let (services, storage_temp) = create_cli_test_services();
    let root = storage_temp.path();
    fs::create_dir(root.join(".shop")).unwrap();
    fs::create_dir(root.join(".books")).unwrap();

    let args = RecoverArgs {
        repair: true,
        name: Some("shop".to_string()),
    };
    execute(args, &services, OutputFormat::Human).await.unwrap();

    assert!(!root.join(".shop").exists());
    assert!(root.join(".books").exists());
}
