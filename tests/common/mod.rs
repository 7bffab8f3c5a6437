//! Shared fixtures for integration tests
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use framed_listener::{Connection, Handler, Result, ServerConfig};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::Barrier;

/// What a [`RecordingHandler`] has seen
#[derive(Default)]
pub struct Recorded {
    calls: AtomicUsize,
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl Recorded {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

/// Records every payload, then echoes it back as one frame.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub recorded: Arc<Recorded>,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait on `barrier` before answering
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }
}

impl Handler for RecordingHandler {
    async fn process(&self, payload: Bytes, conn: &mut Connection) -> Result<()> {
        self.recorded.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.payloads.lock().unwrap().push(payload.to_vec());

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        conn.write_frame(&payload).await
    }
}

/// Loopback config on an ephemeral port with short deadlines
pub fn local_config(workers: usize) -> ServerConfig {
    ServerConfig::local(0)
        .with_workers(workers)
        .with_read_timeout(Duration::from_secs(2))
        .with_handshake_timeout(Duration::from_secs(2))
}

/// Whether the server closed `stream` within `within`.
///
/// A clean FIN reads as `Ok(0)`; a reset surfaces as an error. Both count.
pub async fn closed_by_server(stream: &mut TcpStream, within: Duration) -> bool {
    let mut buf = [0u8; 64];
    loop {
        match tokio::time::timeout(within, stream.read(&mut buf)).await {
            Ok(Ok(0)) | Ok(Err(_)) => return true,
            Ok(Ok(_)) => continue,
            Err(_) => return false,
        }
    }
}
