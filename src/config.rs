//! # Configuration Management
//!
//! Centralized configuration for the framed listener.
//!
//! This module provides structured configuration for the server, its optional
//! TLS identity and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - Every declared frame length is checked against `max_frame_size`
//! - Frame reads and TLS handshakes are bounded by deadlines so a slow peer
//!   cannot hold a worker indefinitely
//! - Certificate material is never embedded; it is supplied here or injected

use crate::core::frame::{DEFAULT_MAX_FRAME_SIZE, HEADER_LEN};
use crate::error::{ListenerError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Default number of workers serving connections
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Upper bound accepted for `worker_count`
pub const MAX_WORKER_COUNT: usize = 1024;

/// Upper bound accepted for `max_frame_size` (64 MiB)
pub const MAX_FRAME_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ListenerConfig {
    /// Server-specific configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// TLS configuration
    #[serde(default)]
    pub tls: TlsSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ListenerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            ListenerError::ConfigError(format!("Failed to open config file: {e}"))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            ListenerError::ConfigError(format!("Failed to read config file: {e}"))
        })?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ListenerError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("FRAMED_LISTENER_BIND") {
            config.server.bind_address = addr;
        }

        if let Ok(port) = std::env::var("FRAMED_LISTENER_PORT") {
            config.server.port = port.parse::<u16>().map_err(|e| {
                ListenerError::ConfigError(format!("Invalid FRAMED_LISTENER_PORT '{port}': {e}"))
            })?;
        }

        if let Ok(workers) = std::env::var("FRAMED_LISTENER_WORKERS") {
            if let Ok(val) = workers.parse::<usize>() {
                config.server.worker_count = val;
            }
        }

        if let Ok(max) = std::env::var("FRAMED_LISTENER_MAX_FRAME") {
            if let Ok(val) = max.parse::<usize>() {
                config.server.max_frame_size = val;
            }
        }

        if let Ok(read_timeout) = std::env::var("FRAMED_LISTENER_READ_TIMEOUT_MS") {
            if let Ok(val) = read_timeout.parse::<u64>() {
                config.server.read_timeout = Duration::from_millis(val);
            }
        }

        if let Ok(cert) = std::env::var("FRAMED_LISTENER_TLS_CERT") {
            config.tls.cert_path = Some(PathBuf::from(cert));
            config.tls.enabled = true;
        }

        if let Ok(key) = std::env::var("FRAMED_LISTENER_TLS_KEY") {
            config.tls.key_path = Some(PathBuf::from(key));
            config.tls.enabled = true;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ListenerError::ConfigError(format!("Failed to serialize config: {e}"))
        })?;

        std::fs::write(path, content).map_err(|e| {
            ListenerError::ConfigError(format!("Failed to write config file: {e}"))
        })?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.tls.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        strict(self.validate())
    }
}

/// Server-specific configuration
///
/// Immutable once handed to a server; the server keeps its own copy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind (e.g., "0.0.0.0")
    pub bind_address: String,

    /// Listening port; 0 binds an ephemeral port
    pub port: u16,

    /// Number of workers serving connections concurrently
    pub worker_count: usize,

    /// Largest accepted declared frame length, header included
    pub max_frame_size: usize,

    /// Deadline for reading one complete frame
    #[serde(with = "duration_serde")]
    pub read_timeout: Duration,

    /// Deadline for the server side of a TLS handshake
    #[serde(with = "duration_serde")]
    pub handshake_timeout: Duration,

    /// Deadline for the handler's response, and separately for closing the
    /// connection afterwards
    #[serde(with = "duration_serde")]
    pub response_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            port: 9000,
            worker_count: DEFAULT_WORKER_COUNT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: timeout::READ_TIMEOUT,
            handshake_timeout: timeout::HANDSHAKE_TIMEOUT,
            response_timeout: timeout::RESPONSE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Configuration bound to `127.0.0.1` on the given port
    pub fn local(port: u16) -> Self {
        Self {
            bind_address: String::from("127.0.0.1"),
            port,
            ..Self::default()
        }
    }

    /// Set the worker count
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the maximum declared frame length
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Set the per-frame read deadline
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set the TLS handshake deadline
    pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    /// Set the response deadline
    pub fn with_response_timeout(mut self, response_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self
    }

    /// Socket address the listener binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip = self.bind_address.parse::<IpAddr>().map_err(|_| {
            ListenerError::ConfigError(format!(
                "Invalid bind address: '{}' (expected an IP such as '0.0.0.0')",
                self.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.bind_address.is_empty() {
            errors.push("Bind address cannot be empty".to_string());
        } else if self.bind_address.parse::<IpAddr>().is_err() {
            errors.push(format!(
                "Invalid bind address: '{}' (expected an IP such as '0.0.0.0')",
                self.bind_address
            ));
        }

        if self.worker_count == 0 {
            errors.push("Worker count must be at least 1".to_string());
        } else if self.worker_count > MAX_WORKER_COUNT {
            errors.push(format!(
                "Worker count too large: {} (maximum: {MAX_WORKER_COUNT})",
                self.worker_count
            ));
        }

        if self.max_frame_size < HEADER_LEN {
            errors.push(format!(
                "Max frame size too small: {} (minimum: {HEADER_LEN} bytes)",
                self.max_frame_size
            ));
        } else if self.max_frame_size > MAX_FRAME_SIZE_LIMIT {
            errors.push(format!(
                "Max frame size too large: {} bytes (maximum: 64 MiB)",
                self.max_frame_size
            ));
        }

        validate_deadline("Read timeout", self.read_timeout, &mut errors);
        validate_deadline("Handshake timeout", self.handshake_timeout, &mut errors);
        validate_deadline("Response timeout", self.response_timeout, &mut errors);

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        strict(self.validate())
    }
}

fn validate_deadline(name: &str, value: Duration, errors: &mut Vec<String>) {
    if value.as_millis() < 10 {
        errors.push(format!("{name} too short (minimum: 10ms)"));
    } else if value.as_secs() > 300 {
        errors.push(format!("{name} too long (maximum: 300s)"));
    }
}

fn strict(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ListenerError::ConfigError(format!(
            "Configuration validation failed:\n  - {}",
            errors.join("\n  - ")
        )))
    }
}

/// TLS configuration
///
/// When enabled, the server identity is loaded from PEM files at server
/// construction. The private key must be unencrypted PKCS#8, RSA or SEC1.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TlsSettings {
    /// Whether connections are upgraded to TLS before framing
    #[serde(default)]
    pub enabled: bool,

    /// PEM certificate chain, leaf first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,

    /// PEM private key matching the leaf certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
}

impl TlsSettings {
    /// TLS enabled with identity files at the given paths
    pub fn from_files<P: Into<PathBuf>>(cert_path: P, key_path: P) -> Self {
        Self {
            enabled: true,
            cert_path: Some(cert_path.into()),
            key_path: Some(key_path.into()),
        }
    }

    /// Validate TLS configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.enabled {
            return errors;
        }

        match (&self.cert_path, &self.key_path) {
            (Some(cert), Some(key)) => {
                if !cert.exists() {
                    errors.push(format!("Certificate file not found: {}", cert.display()));
                }
                if !key.exists() {
                    errors.push(format!("Private key file not found: {}", key.display()));
                }
            }
            _ => errors.push(
                "TLS is enabled but cert_path and key_path are not both set".to_string(),
            ),
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("framed-listener"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
