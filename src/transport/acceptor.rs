//! # Connection Acceptor
//!
//! Wraps the listening socket and turns inbound TCP connections into
//! [`Connection`]s, performing the server side of the TLS handshake when the
//! listener is secured.
//!
//! Accepting is split in two steps: [`Acceptor::accept`] waits for a TCP
//! connection and is safe to cancel, while [`Acceptor::establish`] runs the
//! handshake for a connection a worker already owns. A handshake failure only
//! affects that connection; the listening socket stays open.
//!
//! [`Acceptor::close`] releases the listening socket while workers may still
//! be serving connections they accepted earlier. Workers only hold the read
//! side of the socket lock while waiting in `accept()`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, trace};

use crate::error::{ListenerError, Result};
use crate::transport::connection::Connection;
use crate::transport::tls::TlsIdentity;
use crate::utils::metrics::Metrics;
use crate::utils::timeout::with_timeout_error;

/// Shared accept side of a running listener.
pub struct Acceptor {
    listener: RwLock<Option<TcpListener>>,
    local_addr: SocketAddr,
    tls: Option<TlsAcceptor>,
    handshake_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl Acceptor {
    /// Bind `addr` and prepare TLS if an identity is supplied.
    pub async fn bind(
        addr: SocketAddr,
        tls: Option<&TlsIdentity>,
        handshake_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let tls = tls
            .map(|identity| identity.server_config())
            .transpose()?
            .map(|config| TlsAcceptor::from(Arc::new(config)));

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                address: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener: RwLock::new(Some(listener)),
            local_addr,
            tls,
            handshake_timeout,
            metrics,
        })
    }

    /// Address the listening socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether accepted connections are upgraded to TLS
    pub fn is_secure(&self) -> bool {
        self.tls.is_some()
    }

    /// Wait for the next inbound TCP connection.
    ///
    /// Cancel safe: dropping the future never loses an accepted socket.
    /// Fails with [`ListenerError::ListenerClosed`] once [`close`](Self::close)
    /// has run.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let listener = self.listener.read().await;
        let Some(listener) = listener.as_ref() else {
            return Err(ListenerError::ListenerClosed);
        };
        let (stream, peer) = listener.accept().await?;
        self.metrics.connection_established();
        trace!(%peer, "TCP connection accepted");
        Ok((stream, peer))
    }

    /// Close the listening socket. New connection attempts are refused from
    /// here on; connections already accepted are unaffected. Idempotent.
    ///
    /// Waits for pending `accept()` calls to drop their hold on the socket,
    /// so callers cancel the workers' accept loops first.
    pub async fn close(&self) {
        if self.listener.write().await.take().is_some() {
            debug!(addr = %self.local_addr, "Listening socket closed");
        }
    }

    /// Turn an accepted socket into a [`Connection`], running the TLS
    /// handshake under the configured deadline when enabled.
    pub async fn establish(&self, stream: TcpStream, peer: SocketAddr) -> Result<Connection> {
        let Some(tls) = &self.tls else {
            return Ok(Connection::plain(stream, peer));
        };

        self.metrics.handshake_attempt();
        let handshake = async {
            tls.accept(stream)
                .await
                .map_err(|e| ListenerError::HandshakeFailed(e.to_string()))
        };

        match with_timeout_error(handshake, self.handshake_timeout).await {
            Ok(tls_stream) => {
                self.metrics.handshake_success();
                debug!(%peer, "TLS handshake complete");
                Ok(Connection::tls(tls_stream, peer))
            }
            Err(e) => {
                self.metrics.handshake_failed();
                Err(e)
            }
        }
    }
}
