//! # Error Types
//!
//! Error handling for the framed listener.
//!
//! This module defines every error variant that can surface while the
//! listener is configured, started, or serving connections.
//!
//! ## Error Categories
//! - **Startup Errors**: invalid configuration, unreadable TLS identity, bind failures
//! - **Connection Errors**: TLS handshake failures, read timeouts, peers closing early
//! - **Protocol Errors**: frame lengths below the header size or above the configured maximum
//! - **Handler Errors**: failures reported by the embedding application's handler
//!
//! Connection, protocol and handler errors are contained within the worker that
//! hit them; see [`ListenerError::is_connection_scoped`].
//!
//! ## Example Usage
//! ```rust
//! use framed_listener::error::{ListenerError, Result};
//! use framed_listener::core::frame;
//!
//! fn check(header: [u8; 4]) -> Result<usize> {
//!     let declared = frame::decode_header(&header)?;
//!     frame::validate_length(declared, frame::DEFAULT_MAX_FRAME_SIZE)
//! }
//!
//! assert!(check([8, 0, 0, 0]).is_ok());
//! assert!(matches!(check([2, 0, 0, 0]), Err(ListenerError::FrameTooShort(2))));
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_TRUNCATED_HEADER: &str = "Frame header requires 4 bytes";
    pub const ERR_FRAME_TOO_LARGE_TO_ENCODE: &str = "Payload does not fit in a 32-bit frame";

    /// TLS identity errors
    pub const ERR_NO_CERTIFICATES: &str = "No certificates found in PEM input";
    pub const ERR_NO_PRIVATE_KEY: &str = "No supported private key found in PEM input";
    pub const ERR_TLS_PATHS_MISSING: &str =
        "TLS is enabled but cert_path and key_path are not both set";
    pub const ERR_NO_TRUST_ROOTS: &str = "No trusted root certificates configured";
    pub const ERR_INVALID_SERVER_NAME: &str = "Invalid TLS server name";
}

/// Primary error type for all listener operations
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Frame length {0} is below the 4-byte header size")]
    FrameTooShort(usize),

    #[error("Frame length {declared} exceeds maximum of {max} bytes")]
    OversizedFrame { declared: usize, max: usize },

    #[error("Timeout occurred")]
    Timeout,

    #[error("TLS handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Listening socket is closed")]
    ListenerClosed,

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Handler error: {0}")]
    Handler(String),
}

impl ListenerError {
    /// Whether this error is confined to a single connection.
    ///
    /// Connection-scoped errors are logged and the worker moves on to the
    /// next connection. Everything else is a startup failure that
    /// propagates to the caller of `start()` or `new()`.
    pub fn is_connection_scoped(&self) -> bool {
        matches!(
            self,
            ListenerError::Io(_)
                | ListenerError::ConnectionClosed
                | ListenerError::FrameTooShort(_)
                | ListenerError::OversizedFrame { .. }
                | ListenerError::Timeout
                | ListenerError::HandshakeFailed(_)
                | ListenerError::Handler(_)
        )
    }

    /// Whether this error is a framing protocol violation.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            ListenerError::FrameTooShort(_) | ListenerError::OversizedFrame { .. }
        )
    }

    /// Wrap any displayable handler failure.
    pub fn handler<E: std::fmt::Display>(err: E) -> Self {
        ListenerError::Handler(err.to_string())
    }
}

/// Type alias for Results using ListenerError
pub type Result<T> = std::result::Result<T, ListenerError>;
