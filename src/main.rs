//! framed-echo: reference server for the framed listener
//!
//! Answers every length-prefixed frame with the same payload.
//!
//! Features:
//! - Plain TCP or TLS (PEM files, or a throwaway self-signed identity)
//! - Configuration via CLI arguments, environment or TOML file
//! - Graceful shutdown on Ctrl-C

use std::path::PathBuf;

use clap::Parser;
use framed_listener::transport::generate_self_signed;
use framed_listener::utils::logging::init_logging;
use framed_listener::{EchoHandler, FrameServer, ListenerConfig, TlsSettings};
use tracing::{info, warn, Level};

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "framed-echo")]
#[command(version)]
#[command(about = "Length-framed echo server", long_about = None)]
struct CliArgs {
    /// Path to TOML configuration file (defaults to environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IP address to bind to
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of worker tasks
    #[arg(short, long)]
    workers: Option<usize>,

    /// PEM certificate chain; enables TLS together with --tls-key
    #[arg(long, requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key
    #[arg(long, requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Serve TLS with a freshly generated self-signed certificate for localhost
    #[arg(long, conflicts_with = "tls_cert")]
    self_signed: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<Level>,
}

impl CliArgs {
    /// Load the base configuration and apply CLI overrides
    fn into_config(self) -> Result<(ListenerConfig, bool), Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ListenerConfig::from_file(path)?,
            None => ListenerConfig::from_env()?,
        };

        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.worker_count = workers;
        }
        if let (Some(cert), Some(key)) = (self.tls_cert, self.tls_key) {
            config.tls = TlsSettings::from_files(cert, key);
        }
        if let Some(level) = self.log_level {
            config.logging.log_level = level;
        }

        Ok((config, self.self_signed))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, self_signed) = CliArgs::parse().into_config()?;
    init_logging(&config.logging);

    let server = if self_signed {
        warn!("Using a self-signed certificate; clients must trust it explicitly");
        let identity = generate_self_signed(&["localhost"])?.identity()?;
        FrameServer::with_tls(config.server.clone(), identity, EchoHandler)?
    } else {
        FrameServer::from_config(&config, EchoHandler)?
    };

    let addr = server.start().await?;
    info!(%addr, secure = server.is_secure(), "framed-echo ready; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Received CTRL+C signal, shutting down");

    server.stop().await;
    server.metrics().log_metrics();
    Ok(())
}
