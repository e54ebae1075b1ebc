use crate::config::{CONFIG_FILE_NAME, RegistryConfig};
use crate::error::ConfigError;

use std::fs;
use std::time::Duration;

use tempfile::tempdir;

#[test]
fn given_no_config_file_when_loaded_then_returns_defaults() {
    let dir = tempdir().unwrap();

    let config = RegistryConfig::load(dir.path()).unwrap();

    assert_eq!(config, RegistryConfig::default());
    assert_eq!(config.ports.dashboard_port, 8069);
    assert_eq!(config.ports.port_range, 100);
    assert_eq!(config.lock_timeout(), Duration::from_secs(10));
    assert_eq!(config.registration_retry(), Duration::from_secs(30));
    assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
    assert_eq!(config.dashboard_poll(), Duration::from_secs(5));
}

/// **VALUE**: A partial file only overrides what it names.
///
/// **WHY THIS MATTERS**: Users typically set one value, such as a different
/// dashboard port. Every other field must keep its default.
#[test]
fn given_partial_config_when_loaded_then_fills_defaults() {
    // GIVEN
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[ports]\ndashboard_port = 9000\n",
    )
    .unwrap();

    // WHEN
    let config = RegistryConfig::load(dir.path()).unwrap();

    // THEN
    assert_eq!(config.ports.dashboard_port, 9000);
    assert_eq!(config.ports.port_range, 100);
    assert_eq!(config.port_range().first(), 9001);
    assert_eq!(config.port_range().last(), 9100);
    assert_eq!(config.timing.lock_timeout_ms, 10_000);
}

#[test]
fn given_invalid_toml_when_loaded_then_returns_parse_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "[ports\n").unwrap();

    let result = RegistryConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_zero_port_range_when_validated_then_fails() {
    let mut config = RegistryConfig::default();
    config.ports.port_range = 0;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

/// **BUG THIS CATCHES**: Would catch a range that wraps past 65535 and starts
/// handing out low ports.
#[test]
fn given_range_past_u16_max_when_validated_then_fails() {
    let mut config = RegistryConfig::default();
    config.ports.dashboard_port = 65_500;
    config.ports.port_range = 100;

    let reason = match config.validate() {
        Err(ConfigError::ValidationError { reason, .. }) => reason,
        other => panic!("expected ValidationError, got {other:?}"),
    };
    assert!(reason.contains("exceeds 65535"));
}

#[test]
fn given_zero_timing_when_validated_then_names_field() {
    let mut config = RegistryConfig::default();
    config.timing.heartbeat_interval_secs = 0;

    let reason = match config.validate() {
        Err(ConfigError::ValidationError { reason, .. }) => reason,
        other => panic!("expected ValidationError, got {other:?}"),
    };
    assert_eq!(reason, "heartbeat_interval_secs must be non-zero");
}

#[test]
fn given_saved_config_when_loaded_then_matches() {
    let dir = tempdir().unwrap();
    let mut config = RegistryConfig::default();
    config.ports.dashboard_port = 7000;
    config.timing.dashboard_poll_secs = 2;

    config.save(dir.path()).unwrap();
    let loaded = RegistryConfig::load(dir.path()).unwrap();

    assert_eq!(loaded, config);
    assert!(!dir.path().join(format!("{CONFIG_FILE_NAME}.tmp")).exists());
}
