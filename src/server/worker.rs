//! # Worker
//!
//! One worker serves one connection at a time: accept, read exactly one
//! frame under the read deadline, hand the payload to the handler under the
//! response deadline, close, repeat. Failures on a connection are logged and
//! never leave the worker.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::frame::{self, HEADER_LEN};
use crate::error::{ListenerError, Result};
use crate::server::handler::Handler;
use crate::transport::acceptor::Acceptor;
use crate::transport::connection::Connection;
use crate::utils::metrics::{Metrics, WorkerGauge};
use crate::utils::timeout::{with_timeout_error, ACCEPT_ERROR_BACKOFF};

/// Per-worker state, built by the server on each start.
pub(crate) struct Worker<H> {
    pub id: usize,
    pub generation: u64,
    pub acceptor: Arc<Acceptor>,
    pub handler: Arc<H>,
    pub metrics: Arc<Metrics>,
    pub shutdown: CancellationToken,
    pub max_frame_size: usize,
    pub read_timeout: Duration,
    pub response_timeout: Duration,
}

impl<H: Handler> Worker<H> {
    /// Run until the shutdown token fires.
    ///
    /// Only the wait for a new connection observes cancellation; a request
    /// already being served runs to completion first.
    pub async fn run(self, _gauge: WorkerGauge) {
        debug!(worker = self.id, generation = self.generation, "Worker started");

        loop {
            let accepted = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                accepted = self.acceptor.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    match self.acceptor.establish(stream, peer).await {
                        Ok(conn) => self.serve(conn).await,
                        Err(e) => {
                            warn!(worker = self.id, %peer, error = %e, "Connection setup failed");
                        }
                    }
                    self.metrics.connection_closed();
                }
                Err(ListenerError::ListenerClosed) => break,
                Err(e) => {
                    self.metrics.accept_error();
                    warn!(worker = self.id, error = %e, "Accept failed");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!(worker = self.id, generation = self.generation, "Worker stopped");
    }

    /// Serve one request/response cycle on `conn`, then close it.
    #[instrument(
        skip(self, conn),
        fields(worker = self.id, peer = %conn.peer_addr(), secure = conn.is_secure())
    )]
    async fn serve(&self, mut conn: Connection) {
        if let Err(e) = self.process(&mut conn).await {
            self.record_failure(&e);
        }

        if let Err(e) = with_timeout_error(conn.close(), self.response_timeout).await {
            debug!(error = %e, "Connection close failed");
        }
    }

    async fn process(&self, conn: &mut Connection) -> Result<()> {
        let payload = with_timeout_error(
            frame::read_frame(conn, self.max_frame_size),
            self.read_timeout,
        )
        .await?;

        let frame_len = payload.len() + HEADER_LEN;
        self.metrics.frame_received(frame_len as u64);
        debug!(frame_len, "Frame received");

        let response = tokio::time::timeout(
            self.response_timeout,
            self.handler.process(payload, conn),
        )
        .await;
        match response {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.metrics.handler_error();
                warn!(error = %e, "Handler failed");
            }
            Err(_) => {
                self.metrics.response_timeout();
                warn!(timeout = ?self.response_timeout, "Handler missed the response deadline");
            }
        }
        Ok(())
    }

    fn record_failure(&self, err: &ListenerError) {
        match err {
            ListenerError::FrameTooShort(_) | ListenerError::OversizedFrame { .. } => {
                self.metrics.frame_rejected();
                warn!(error = %err, "Rejected frame");
            }
            ListenerError::Timeout => {
                self.metrics.read_timeout();
                warn!("Frame read timed out");
            }
            ListenerError::ConnectionClosed => {
                debug!("Peer closed before sending a complete frame");
            }
            _ => {
                debug!(error = %err, "Connection error");
            }
        }
    }
}
