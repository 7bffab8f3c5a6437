//! # Frame Client
//!
//! Client side of the framing protocol, over plain TCP or TLS.
//!
//! The listener imposes no response format, so the client offers both framed
//! exchanges ([`FrameClient::request`]) and raw access to the underlying
//! stream ([`FrameClient::into_inner`]) for handlers that answer unframed.

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::{debug, instrument};

use crate::core::codec::FrameCodec;
use crate::error::{ListenerError, Result};
use crate::transport::tls::TlsClientConfig;

/// Framed connection to a listener.
pub struct FrameClient<S> {
    framed: Framed<S, FrameCodec>,
}

impl FrameClient<TcpStream> {
    /// Connect over plain TCP
    #[instrument(skip(addr))]
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream, FrameCodec::default()))
    }
}

impl FrameClient<TlsStream<TcpStream>> {
    /// Connect and complete a TLS handshake
    #[instrument(skip(addr, config))]
    pub async fn connect_tls<A: ToSocketAddrs>(addr: A, config: &TlsClientConfig) -> Result<Self> {
        let connector = TlsConnector::from(Arc::new(config.load_client_config()?));
        let domain = config.server_name()?;

        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        let tls_stream = connector
            .connect(domain, stream)
            .await
            .map_err(|e| ListenerError::TlsError(format!("TLS connection failed: {e}")))?;

        debug!("TLS connection established");
        Ok(Self::new(tls_stream, FrameCodec::default()))
    }
}

impl<S> FrameClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an existing stream
    pub fn new(stream: S, codec: FrameCodec) -> Self {
        Self {
            framed: Framed::new(stream, codec),
        }
    }

    /// Send one frame
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.framed.send(payload).await
    }

    /// Receive one frame; `ConnectionClosed` if the server closed first
    pub async fn receive(&mut self) -> Result<Bytes> {
        match self.framed.next().await {
            Some(frame) => frame,
            None => Err(ListenerError::ConnectionClosed),
        }
    }

    /// Send a frame and wait for a framed response
    pub async fn request(&mut self, payload: &[u8]) -> Result<Bytes> {
        self.send(payload).await?;
        self.receive().await
    }

    /// Give back the underlying stream, e.g. to read an unframed response.
    ///
    /// Bytes already buffered by the codec are discarded.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}
