//! Unit tests for configuration parsing
//!
//! Tests environment variable parsing and default values.
//!
//! Note: These tests modify global environment variables and must run serially.

use std::time::Duration;

use serial_test::serial;

use quotrak::config::{AlertConfig, MeteringConfig, StorageConfig};

// =============================================================================
// Metering Config Tests
// =============================================================================

#[test]
#[serial]
fn test_metering_config_defaults() {
    std::env::remove_var("STORE_TIMEOUT_SECS");
    std::env::remove_var("CALL_TICK_INTERVAL_SECS");

    let config = MeteringConfig::from_env();

    assert_eq!(config.store_timeout, Duration::from_secs(5));
    assert_eq!(config.call_tick_interval, Duration::from_secs(60));
}

#[test]
#[serial]
fn test_metering_config_custom_values() {
    std::env::set_var("STORE_TIMEOUT_SECS", "2");
    std::env::set_var("CALL_TICK_INTERVAL_SECS", "30");

    let config = MeteringConfig::from_env();

    assert_eq!(config.store_timeout, Duration::from_secs(2));
    assert_eq!(config.call_tick_interval, Duration::from_secs(30));

    std::env::remove_var("STORE_TIMEOUT_SECS");
    std::env::remove_var("CALL_TICK_INTERVAL_SECS");
}

#[test]
#[serial]
fn test_metering_config_invalid_values_use_defaults() {
    std::env::set_var("STORE_TIMEOUT_SECS", "not-a-number");
    std::env::set_var("CALL_TICK_INTERVAL_SECS", "soon");

    let config = MeteringConfig::from_env();

    assert_eq!(config.store_timeout, Duration::from_secs(5));
    assert_eq!(config.call_tick_interval, Duration::from_secs(60));

    std::env::remove_var("STORE_TIMEOUT_SECS");
    std::env::remove_var("CALL_TICK_INTERVAL_SECS");
}

// =============================================================================
// Storage Config Tests
// =============================================================================

#[test]
#[serial]
fn test_storage_config_defaults() {
    std::env::remove_var("OBJECT_DIR");
    std::env::remove_var("MAX_UPLOAD_BYTES");

    let config = StorageConfig::from_env();

    assert_eq!(config.object_dir, None);
    assert_eq!(config.max_upload_bytes, 52_428_800);
}

#[test]
#[serial]
fn test_storage_config_custom_values() {
    std::env::set_var("OBJECT_DIR", "/data/objects");
    std::env::set_var("MAX_UPLOAD_BYTES", "1048576");

    let config = StorageConfig::from_env();

    assert_eq!(config.object_dir.as_deref(), Some("/data/objects"));
    assert_eq!(config.max_upload_bytes, 1_048_576);

    std::env::remove_var("OBJECT_DIR");
    std::env::remove_var("MAX_UPLOAD_BYTES");
}

// =============================================================================
// Alert Config Tests
// =============================================================================

#[test]
#[serial]
fn test_alert_config_unset_means_disabled() {
    std::env::remove_var("QUOTA_WEBHOOK_URL");
    std::env::remove_var("QUOTA_WEBHOOK_SECRET");

    let config = AlertConfig::from_env();

    assert_eq!(config.webhook_url, None);
    assert_eq!(config.webhook_secret, None);
}

#[test]
#[serial]
fn test_alert_config_reads_url_and_secret() {
    std::env::set_var("QUOTA_WEBHOOK_URL", "https://example.com/hooks/quota");
    std::env::set_var("QUOTA_WEBHOOK_SECRET", "s3cret");

    let config = AlertConfig::from_env();

    assert_eq!(
        config.webhook_url.as_deref(),
        Some("https://example.com/hooks/quota")
    );
    assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));

    std::env::remove_var("QUOTA_WEBHOOK_URL");
    std::env::remove_var("QUOTA_WEBHOOK_SECRET");
}
