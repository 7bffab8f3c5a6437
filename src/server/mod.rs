//! # Server Lifecycle
//!
//! [`FrameServer`] owns the listening socket and the worker pool.
//!
//! ```text
//! Stopped --start()--> Running --stop()--> Stopped
//! ```
//!
//! `start()` binds the socket and launches exactly `worker_count` workers;
//! calling it while running does nothing. `stop()` cancels every worker's
//! pending accept and closes the listening socket, then waits for in-flight
//! requests to finish and joins all workers; calling it while stopped does
//! nothing. Both transitions are serialized by one async mutex.
//!
//! The server only reports `Stopped` once the join has completed. A `stop()`
//! abandoned part way leaves the server `Running`, and the next `stop()`
//! picks up where it left off.

pub mod handler;
mod worker;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument};

use crate::config::{ListenerConfig, ServerConfig};
use crate::error::{constants, ListenerError, Result};
use crate::transport::acceptor::Acceptor;
use crate::transport::tls::TlsIdentity;
use crate::utils::metrics::Metrics;

pub use handler::{EchoHandler, Handler};
use worker::Worker;

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Running,
}

struct Running {
    local_addr: SocketAddr,
    generation: u64,
    acceptor: Arc<Acceptor>,
    shutdown: CancellationToken,
    workers: TaskTracker,
}

#[derive(Default)]
struct Lifecycle {
    running: Option<Running>,
    generation: u64,
}

/// Concurrent, length-framed, optionally TLS-secured listener.
///
/// # Example
/// ```no_run
/// use framed_listener::{EchoHandler, FrameServer, ServerConfig};
///
/// # async fn run() -> framed_listener::Result<()> {
/// let server = FrameServer::new(ServerConfig::local(9000).with_workers(8), EchoHandler)?;
/// let addr = server.start().await?;
/// println!("listening on {addr}");
/// server.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct FrameServer<H: Handler> {
    config: ServerConfig,
    identity: Option<TlsIdentity>,
    handler: Arc<H>,
    metrics: Arc<Metrics>,
    lifecycle: Mutex<Lifecycle>,
}

impl<H: Handler> FrameServer<H> {
    /// Create a plain-TCP server. Fails if `config` is invalid.
    pub fn new(config: ServerConfig, handler: H) -> Result<Self> {
        Self::build(config, None, handler)
    }

    /// Create a TLS server presenting `identity`.
    pub fn with_tls(config: ServerConfig, identity: TlsIdentity, handler: H) -> Result<Self> {
        Self::build(config, Some(identity), handler)
    }

    /// Create a server from a full [`ListenerConfig`], loading the TLS
    /// identity from disk when TLS is enabled.
    pub fn from_config(config: &ListenerConfig, handler: H) -> Result<Self> {
        config.validate_strict()?;

        let identity = if config.tls.enabled {
            match (&config.tls.cert_path, &config.tls.key_path) {
                (Some(cert), Some(key)) => Some(TlsIdentity::from_pem_files(cert, key)?),
                _ => {
                    return Err(ListenerError::ConfigError(
                        constants::ERR_TLS_PATHS_MISSING.into(),
                    ))
                }
            }
        } else {
            None
        };

        Self::build(config.server.clone(), identity, handler)
    }

    fn build(config: ServerConfig, identity: Option<TlsIdentity>, handler: H) -> Result<Self> {
        config.validate_strict()?;
        if let Some(identity) = &identity {
            // surface unusable key material at construction, not at start
            identity.server_config()?;
        }

        Ok(Self {
            config,
            identity,
            handler: Arc::new(handler),
            metrics: Arc::new(Metrics::new()),
            lifecycle: Mutex::new(Lifecycle::default()),
        })
    }

    /// Bind the listening socket and launch the worker pool.
    ///
    /// Returns the bound address. If the server is already running this is a
    /// no-op returning the existing address. On failure the server stays
    /// stopped.
    #[instrument(skip(self), fields(port = self.config.port, workers = self.config.worker_count))]
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(running) = &lifecycle.running {
            debug!(addr = %running.local_addr, "Server already running");
            return Ok(running.local_addr);
        }

        let acceptor = Acceptor::bind(
            self.config.socket_addr()?,
            self.identity.as_ref(),
            self.config.handshake_timeout,
            Arc::clone(&self.metrics),
        )
        .await?;
        let local_addr = acceptor.local_addr();
        let secure = acceptor.is_secure();
        let acceptor = Arc::new(acceptor);

        lifecycle.generation += 1;
        let generation = lifecycle.generation;
        let shutdown = CancellationToken::new();
        let workers = TaskTracker::new();

        for id in 0..self.config.worker_count {
            let worker = Worker {
                id,
                generation,
                acceptor: Arc::clone(&acceptor),
                handler: Arc::clone(&self.handler),
                metrics: Arc::clone(&self.metrics),
                shutdown: shutdown.clone(),
                max_frame_size: self.config.max_frame_size,
                read_timeout: self.config.read_timeout,
                response_timeout: self.config.response_timeout,
            };
            let gauge = self.metrics.worker_started();
            workers.spawn(worker.run(gauge));
        }
        workers.close();

        info!(
            addr = %local_addr,
            secure,
            generation,
            workers = self.config.worker_count,
            "Server listening"
        );

        lifecycle.running = Some(Running {
            local_addr,
            generation,
            acceptor,
            shutdown,
            workers,
        });
        Ok(local_addr)
    }

    /// Stop accepting, let in-flight requests finish and join every worker.
    ///
    /// The listening socket is closed before the in-flight requests drain.
    /// When this returns no worker is alive. No-op if the server is already
    /// stopped.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.running.as_ref() else {
            debug!("Server already stopped");
            return;
        };

        info!(generation = running.generation, "Stopping server");
        running.shutdown.cancel();
        running.acceptor.close().await;
        running.workers.wait().await;

        // only forget the running state once every worker is gone
        if let Some(running) = lifecycle.running.take() {
            info!(
                addr = %running.local_addr,
                generation = running.generation,
                "Server stopped"
            );
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ServerState {
        if self.lifecycle.lock().await.running.is_some() {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }

    /// Bound address while running
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle
            .lock()
            .await
            .running
            .as_ref()
            .map(|r| r.local_addr)
    }

    /// Number of workers currently alive
    pub fn active_workers(&self) -> usize {
        self.metrics.workers_active()
    }

    /// Counters shared by this server's workers
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// The configuration this server was built with
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether connections are upgraded to TLS
    pub fn is_secure(&self) -> bool {
        self.identity.is_some()
    }
}

impl<H: Handler> Drop for FrameServer<H> {
    fn drop(&mut self) {
        // workers cannot be joined here; cancelling lets them wind down
        if let Some(running) = self.lifecycle.get_mut().running.take() {
            running.shutdown.cancel();
        }
    }
}
