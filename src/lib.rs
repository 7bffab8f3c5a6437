//! # Framed Listener
//!
//! A concurrent, length-framed, optionally TLS-secured request listener.
//!
//! The server accepts stream connections, reads exactly one length-prefixed
//! frame from each, and hands the payload to an application [`Handler`] that
//! answers over the same stream.
//!
//! ## Architecture
//! - **core**: frame header codec and the tokio `FrameCodec`
//! - **transport**: listening socket, TLS identity, per-connection streams
//! - **server**: worker pool and start/stop lifecycle
//! - **client**: framed client for plain and TLS listeners
//! - **config**: TOML/env configuration with validation
//! - **utils**: logging, deadlines and metrics
//!
//! ## Wire Format
//! ```text
//! [DeclaredLength(4, LE, includes itself)] [Payload(DeclaredLength - 4)]
//! ```
//!
//! ## Quick Start
//! ```no_run
//! use framed_listener::{FrameClient, FrameServer, EchoHandler, ServerConfig};
//!
//! # async fn demo() -> framed_listener::Result<()> {
//! let server = FrameServer::new(ServerConfig::local(0), EchoHandler)?;
//! let addr = server.start().await?;
//!
//! let mut client = FrameClient::connect(addr).await?;
//! let reply = client.request(b"ping").await?;
//! assert_eq!(&reply[..], b"ping");
//!
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod server;
pub mod transport;
pub mod utils;

pub use client::FrameClient;
pub use config::{ListenerConfig, LoggingConfig, ServerConfig, TlsSettings};
pub use crate::core::codec::FrameCodec;
pub use error::{ListenerError, Result};
pub use server::{EchoHandler, FrameServer, Handler, ServerState};
pub use transport::{Connection, TlsClientConfig, TlsIdentity};
