//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use framed_listener::config::{ListenerConfig, LoggingConfig, ServerConfig, TlsSettings};
use framed_listener::ListenerError;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = ListenerConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_default_server_values() {
    let server = ServerConfig::default();
    assert_eq!(server.worker_count, 4);
    assert_eq!(server.max_frame_size, 4 * 1024 * 1024);
    assert_eq!(server.read_timeout, Duration::from_secs(10));
    assert_eq!(server.response_timeout, Duration::from_secs(10));
    assert!(!ListenerConfig::default().tls.enabled);
}

#[test]
fn test_invalid_bind_address() {
    let mut config = ListenerConfig::default();
    config.server.bind_address = "not-an-ip".to_string();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid bind address")));
    assert!(config.server.socket_addr().is_err());
}

#[test]
fn test_empty_bind_address() {
    let mut config = ListenerConfig::default();
    config.server.bind_address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_zero_workers() {
    let mut config = ListenerConfig::default();
    config.server.worker_count = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Worker count must be at least 1")));
}

#[test]
fn test_excessive_workers() {
    let mut config = ListenerConfig::default();
    config.server.worker_count = 5000;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Worker count too large")));
}

#[test]
fn test_max_frame_size_bounds() {
    let mut config = ListenerConfig::default();
    config.server.max_frame_size = 3;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Max frame size too small")));

    config.server.max_frame_size = 4;
    assert!(config.validate().is_empty());

    config.server.max_frame_size = 65 * 1024 * 1024;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Max frame size too large")));
}

#[test]
fn test_timeout_bounds() {
    let mut config = ListenerConfig::default();
    config.server.read_timeout = Duration::from_millis(5);
    config.server.handshake_timeout = Duration::from_secs(400);
    config.server.response_timeout = Duration::ZERO;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Read timeout too short")));
    assert!(errors
        .iter()
        .any(|e| e.contains("Handshake timeout too long")));
    assert!(errors
        .iter()
        .any(|e| e.contains("Response timeout too short")));
}

#[test]
fn test_tls_enabled_without_paths() {
    let mut config = ListenerConfig::default();
    config.tls.enabled = true;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("cert_path and key_path are not both set")));
}

#[test]
fn test_tls_missing_files() {
    let mut config = ListenerConfig::default();
    config.tls = TlsSettings::from_files("/nonexistent/cert.pem", "/nonexistent/key.pem");

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Certificate file not found")));
    assert!(errors.iter().any(|e| e.contains("Private key file not found")));
}

#[test]
fn test_empty_app_name() {
    let config = ListenerConfig::default_with_overrides(|c| {
        c.logging = LoggingConfig {
            app_name: String::new(),
            ..LoggingConfig::default()
        };
    });

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_validate_strict_collects_all_errors() {
    let mut config = ListenerConfig::default();
    config.server.worker_count = 0;
    config.server.max_frame_size = 0;

    match config.validate_strict() {
        Err(ListenerError::ConfigError(msg)) => {
            assert!(msg.contains("Worker count"));
            assert!(msg.contains("Max frame size"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = ListenerConfig::from_toml(
        r#"
        [server]
        port = 7777
        worker_count = 2
        read_timeout = 1500

        [logging]
        log_level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.server.port, 7777);
    assert_eq!(config.server.worker_count, 2);
    assert_eq!(config.server.read_timeout, Duration::from_millis(1500));
    assert_eq!(config.server.max_frame_size, 4 * 1024 * 1024);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(!config.tls.enabled);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let result = ListenerConfig::from_toml("[server]\nport = \"not a number\"");
    assert!(matches!(result, Err(ListenerError::ConfigError(_))));

    let result = ListenerConfig::from_toml("[logging]\nlog_level = \"loud\"");
    assert!(matches!(result, Err(ListenerError::ConfigError(_))));
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listener.toml");

    let config = ListenerConfig::default_with_overrides(|c| {
        c.server.port = 8443;
        c.server.worker_count = 16;
        c.server.handshake_timeout = Duration::from_millis(2500);
        c.tls = TlsSettings::from_files("/etc/listener/cert.pem", "/etc/listener/key.pem");
    });
    config.save_to_file(&path).unwrap();

    let loaded = ListenerConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.port, 8443);
    assert_eq!(loaded.server.worker_count, 16);
    assert_eq!(loaded.server.handshake_timeout, Duration::from_millis(2500));
    assert!(loaded.tls.enabled);
    assert_eq!(
        loaded.tls.cert_path.as_deref(),
        Some(std::path::Path::new("/etc/listener/cert.pem"))
    );
}

#[test]
fn test_missing_config_file() {
    let result = ListenerConfig::from_file("/nonexistent/listener.toml");
    assert!(matches!(result, Err(ListenerError::ConfigError(_))));
}

#[test]
fn test_example_config_parses() {
    let example = ListenerConfig::example_config();
    let parsed = ListenerConfig::from_toml(&example).unwrap();
    assert_eq!(parsed.server.port, ServerConfig::default().port);
    assert_eq!(parsed.logging.log_level, Level::INFO);
}
