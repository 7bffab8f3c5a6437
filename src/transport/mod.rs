//! # Transport Layer
//!
//! Socket-level plumbing beneath the framing protocol.
//!
//! ## Components
//! - **Acceptor**: listening socket, per-connection TLS upgrade
//! - **Connection**: duplex stream handed to workers and handlers
//! - **TLS**: server identity loading and client configuration

pub mod acceptor;
pub mod connection;
pub mod tls;

pub use acceptor::Acceptor;
pub use connection::Connection;
pub use tls::{generate_self_signed, SelfSignedCert, TlsClientConfig, TlsIdentity};
