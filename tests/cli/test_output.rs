//! Tests for CLI output formatting helpers
//!
//! Tests the output formatting utilities:
//! - Byte formatting (KB, MB, GB)
//! - Millisecond formatting (ms, s, m)
//! - Relative time formatting (just now, minutes ago, hours ago, days ago)
//! - Color helpers (respects NO_COLOR)
//! - emit() for both output formats

use chrono::{Duration, Utc};
use reshelve::cli::output::{emit, format_bytes, format_millis, format_relative_time};
use reshelve::cli::OutputFormat;
use std::cell::Cell;

// =============================================================================
// format_bytes tests
// =============================================================================

/// Test byte formatting with various sizes
#[test]
fn test_format_bytes_various_sizes() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(512), "512 B");
    assert_eq!(format_bytes(1023), "1023 B");

    assert_eq!(format_bytes(1024), "1.0 KB");
    assert_eq!(format_bytes(102400), "100.0 KB");

    assert_eq!(format_bytes(1572864), "1.5 MB");
    assert_eq!(format_bytes(10737418240), "10.0 GB");
}

/// Test byte formatting at unit boundaries
#[test]
fn test_format_bytes_edge_cases() {
    assert_eq!(format_bytes(1048576 - 1), "1024.0 KB"); // Just under 1 MB
    assert_eq!(format_bytes(1048576), "1.0 MB");
    assert_eq!(format_bytes(1073741824 - 1), "1024.0 MB"); // Just under 1 GB
    assert_eq!(format_bytes(1073741824), "1.0 GB");
}

// =============================================================================
// format_millis tests
// =============================================================================

/// Test millisecond formatting with various durations
#[test]
fn test_format_millis_various_times() {
    assert_eq!(format_millis(0), "0ms");
    assert_eq!(format_millis(999), "999ms");

    assert_eq!(format_millis(1000), "1.00s");
    assert_eq!(format_millis(59_990), "59.99s");

    assert_eq!(format_millis(60_000), "1m 0.0s");
    assert_eq!(format_millis(125_500), "2m 5.5s");
}

// =============================================================================
// format_relative_time tests
// =============================================================================

/// Test relative time formatting across units
#[test]
fn test_format_relative_time_units() {
    let now = Utc::now();
    assert_eq!(format_relative_time(&(now - Duration::seconds(59))), "just now");
    assert_eq!(format_relative_time(&(now - Duration::minutes(5))), "5m ago");
    assert_eq!(format_relative_time(&(now - Duration::hours(23))), "23h ago");
    assert_eq!(format_relative_time(&(now - Duration::days(7))), "7d ago");
}

/// Test relative time formatting - future time
#[test]
fn test_format_relative_time_future() {
    let future = Utc::now() + Duration::hours(1);
    assert_eq!(format_relative_time(&future), "in the future");
}

// =============================================================================
// Color helper tests
// Note: These test that colors don't break output, not visual appearance.
// The `colored` crate respects NO_COLOR env var automatically.
// =============================================================================

/// Test that colors preserve the original text
#[test]
fn test_colors_preserve_text() {
    use reshelve::cli::output::colors;

    assert!(colors::label("important").to_string().contains("important"));
    assert!(colors::index_name("shop").to_string().contains("shop"));
    assert!(colors::file_path("/data/shop").to_string().contains("/data/shop"));
    assert!(colors::number("42").to_string().contains("42"));
    assert!(colors::success("done").to_string().contains("done"));
    assert!(colors::warning("careful").to_string().contains("careful"));
    assert!(colors::error("failed").to_string().contains("failed"));
    assert!(colors::dim("secondary").to_string().contains("secondary"));
}

// =============================================================================
// emit tests
// =============================================================================

/// Test that human output runs the closure and JSON output does not
#[test]
fn test_emit_dispatches_on_format() {
    let called = Cell::new(0);
    let data = serde_json::json!({ "name": "shop" });

    emit(&data, OutputFormat::Human, |_| called.set(called.get() + 1)).unwrap();
    emit(&data, OutputFormat::Json, |_| called.set(called.get() + 1)).unwrap();

    assert_eq!(called.get(), 1);
}
