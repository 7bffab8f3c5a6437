use std::future::Future;

use bytes::Bytes;
use tracing::trace;

use crate::error::Result;
use crate::transport::connection::Connection;

/// Application hook invoked once per decoded frame.
///
/// `payload` is the frame body with the length prefix stripped. The handler
/// writes whatever response it likes to `conn`, framed or not, and may close
/// it. Returning an error marks the request as failed; the worker logs it,
/// closes the connection and carries on.
///
/// ```rust
/// use bytes::Bytes;
/// use framed_listener::{Connection, Handler, Result};
///
/// struct Upper;
///
/// impl Handler for Upper {
///     async fn process(&self, payload: Bytes, conn: &mut Connection) -> Result<()> {
///         conn.write_frame(&payload.to_ascii_uppercase()).await
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn process(
        &self,
        payload: Bytes,
        conn: &mut Connection,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Answers every request with its own payload in a single frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    async fn process(&self, payload: Bytes, conn: &mut Connection) -> Result<()> {
        trace!(peer = %conn.peer_addr(), bytes = payload.len(), "Echoing frame");
        conn.write_frame(&payload).await
    }
}
