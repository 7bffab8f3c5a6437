//! Observability and Metrics
//!
//! Counters for the listener's connection lifecycle. Every server owns one
//! [`Metrics`] instance shared by its workers.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Metrics collector for listener operations
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted at the TCP level
    pub connections_total: AtomicU64,
    /// Connections currently owned by a worker
    pub connections_active: AtomicU64,
    /// Total TLS handshake attempts
    pub handshakes_total: AtomicU64,
    /// Successful TLS handshakes
    pub handshakes_success: AtomicU64,
    /// Failed or timed out TLS handshakes
    pub handshakes_failed: AtomicU64,
    /// Frames read completely and handed to the handler
    pub frames_received: AtomicU64,
    /// Frames rejected for an invalid declared length
    pub frames_rejected: AtomicU64,
    /// Total frame bytes read, headers included
    pub bytes_received: AtomicU64,
    /// Frame reads that hit the read deadline
    pub read_timeouts: AtomicU64,
    /// Handler invocations that reported failure
    pub handler_errors: AtomicU64,
    /// Responses that missed the response deadline
    pub response_timeouts: AtomicU64,
    /// Listener-level accept failures
    pub accept_errors: AtomicU64,
    /// Workers currently alive
    pub workers_active: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            handshakes_total: AtomicU64::new(0),
            handshakes_success: AtomicU64::new(0),
            handshakes_failed: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            response_timeouts: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            workers_active: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a new connection
    pub fn connection_established(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection closed
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a handshake attempt
    pub fn handshake_attempt(&self) {
        self.handshakes_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful handshake
    pub fn handshake_success(&self) {
        self.handshakes_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed handshake
    pub fn handshake_failed(&self) {
        self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame delivered to the handler
    pub fn frame_received(&self, frame_len: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(frame_len, Ordering::Relaxed);
    }

    /// Record a frame rejected for its declared length
    pub fn frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_timeout(&self) {
        self.read_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response_timeout(&self) {
        self.response_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Register a live worker. The worker is counted until the guard drops.
    pub fn worker_started(self: &Arc<Self>) -> WorkerGauge {
        self.workers_active.fetch_add(1, Ordering::AcqRel);
        WorkerGauge {
            metrics: Arc::clone(self),
        }
    }

    /// Number of workers currently alive
    pub fn workers_active(&self) -> usize {
        self.workers_active.load(Ordering::Acquire) as usize
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            handshakes_total: self.handshakes_total.load(Ordering::Relaxed),
            handshakes_success: self.handshakes_success.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            response_timeouts: self.response_timeouts.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            workers_active: self.workers_active.load(Ordering::Acquire),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            connections_active = snapshot.connections_active,
            handshakes_total = snapshot.handshakes_total,
            handshakes_success = snapshot.handshakes_success,
            handshakes_failed = snapshot.handshakes_failed,
            frames_received = snapshot.frames_received,
            frames_rejected = snapshot.frames_rejected,
            bytes_received = snapshot.bytes_received,
            read_timeouts = snapshot.read_timeouts,
            handler_errors = snapshot.handler_errors,
            response_timeouts = snapshot.response_timeouts,
            accept_errors = snapshot.accept_errors,
            workers_active = snapshot.workers_active,
            uptime_seconds = snapshot.uptime_seconds,
            "Listener metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a worker counted in [`Metrics::workers_active`] while alive.
#[derive(Debug)]
pub struct WorkerGauge {
    metrics: Arc<Metrics>,
}

impl Drop for WorkerGauge {
    fn drop(&mut self) {
        self.metrics.workers_active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub handshakes_total: u64,
    pub handshakes_success: u64,
    pub handshakes_failed: u64,
    pub frames_received: u64,
    pub frames_rejected: u64,
    pub bytes_received: u64,
    pub read_timeouts: u64,
    pub handler_errors: u64,
    pub response_timeouts: u64,
    pub accept_errors: u64,
    pub workers_active: u64,
    pub uptime_seconds: u64,
}
