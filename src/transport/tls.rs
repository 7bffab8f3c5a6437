//! # TLS Identity and Client Configuration
//!
//! Server identity loading for the acceptor and the matching client-side
//! configuration used by [`FrameClient`](crate::client::FrameClient).
//!
//! TLS wraps the raw byte stream below the framing layer; nothing in the
//! frame codec knows whether a connection is encrypted.
//!
//! ## Responsibilities
//! - Load a server certificate chain and private key from PEM files or bytes
//! - Produce a `rustls::ServerConfig` with safe defaults (TLS 1.2+)
//! - Generate self-signed identities for development and testing
//! - Build client configurations trusting explicit roots, or any certificate
//!   in insecure development mode

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore, ServerConfig, ServerName};
use rustls_pemfile::Item;
use tracing::{debug, warn};

use crate::error::{constants, ListenerError, Result};

/// Certificate chain and private key presented by the server.
///
/// Loaded once at server construction and held for the server's lifetime.
#[derive(Clone)]
pub struct TlsIdentity {
    cert_chain: Vec<Certificate>,
    key: PrivateKey,
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("certificates", &self.cert_chain.len())
            .finish_non_exhaustive()
    }
}

impl TlsIdentity {
    /// Load an identity from a PEM certificate chain file and a PEM key file.
    pub fn from_pem_files<P: AsRef<Path>>(cert_path: P, key_path: P) -> Result<Self> {
        let cert_file = File::open(cert_path.as_ref())
            .map_err(|e| ListenerError::TlsError(format!("Failed to open cert file: {e}")))?;
        let cert_chain = read_certificates(&mut BufReader::new(cert_file))?;

        let key_file = File::open(key_path.as_ref())
            .map_err(|e| ListenerError::TlsError(format!("Failed to open key file: {e}")))?;
        let key = read_private_key(&mut BufReader::new(key_file))?;

        debug!(
            cert = %cert_path.as_ref().display(),
            certificates = cert_chain.len(),
            "Loaded TLS identity"
        );
        Ok(Self { cert_chain, key })
    }

    /// Build an identity from in-memory PEM material.
    ///
    /// Applications holding passphrase-protected keys decrypt them first and
    /// pass the plain PEM here.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let cert_chain = read_certificates(&mut Cursor::new(cert_pem))?;
        let key = read_private_key(&mut Cursor::new(key_pem))?;
        Ok(Self { cert_chain, key })
    }

    /// Number of certificates in the chain
    pub fn chain_len(&self) -> usize {
        self.cert_chain.len()
    }

    /// Build the rustls server configuration for this identity
    pub fn server_config(&self) -> Result<ServerConfig> {
        ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(self.cert_chain.clone(), self.key.clone())
            .map_err(|e| ListenerError::TlsError(format!("Invalid certificate or key: {e}")))
    }
}

/// PEM-encoded certificate and key generated for development use
#[derive(Debug, Clone)]
pub struct SelfSignedCert {
    pub cert_pem: String,
    pub key_pem: String,
}

impl SelfSignedCert {
    /// Parse the generated material into a server identity
    pub fn identity(&self) -> Result<TlsIdentity> {
        TlsIdentity::from_pem(self.cert_pem.as_bytes(), self.key_pem.as_bytes())
    }

    /// Write certificate and key to the given paths
    pub fn write_to<P: AsRef<Path>>(&self, cert_path: P, key_path: P) -> io::Result<()> {
        std::fs::write(cert_path, &self.cert_pem)?;
        std::fs::write(key_path, &self.key_pem)
    }
}

/// Generate a self-signed certificate for development/testing purposes
pub fn generate_self_signed(subject_alt_names: &[&str]) -> Result<SelfSignedCert> {
    let names = subject_alt_names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let cert = rcgen::generate_simple_self_signed(names)
        .map_err(|e| ListenerError::TlsError(format!("Certificate generation error: {e}")))?;

    Ok(SelfSignedCert {
        cert_pem: cert.cert.pem(),
        key_pem: cert.signing_key.serialize_pem(),
    })
}

fn read_certificates(reader: &mut dyn BufRead) -> Result<Vec<Certificate>> {
    let certs = rustls_pemfile::certs(reader)
        .map_err(|e| ListenerError::TlsError(format!("Failed to parse certificate: {e}")))?;

    if certs.is_empty() {
        return Err(ListenerError::TlsError(constants::ERR_NO_CERTIFICATES.into()));
    }
    Ok(certs.into_iter().map(Certificate).collect())
}

fn read_private_key(reader: &mut dyn BufRead) -> Result<PrivateKey> {
    loop {
        let item = rustls_pemfile::read_one(reader)
            .map_err(|e| ListenerError::TlsError(format!("Failed to parse private key: {e}")))?;

        match item {
            Some(Item::PKCS8Key(key)) | Some(Item::RSAKey(key)) | Some(Item::ECKey(key)) => {
                return Ok(PrivateKey(key));
            }
            Some(_) => continue,
            None => {
                return Err(ListenerError::TlsError(constants::ERR_NO_PRIVATE_KEY.into()));
            }
        }
    }
}

/// TLS client configuration
pub struct TlsClientConfig {
    server_name: String,
    roots: Vec<Certificate>,
    insecure: bool,
}

impl TlsClientConfig {
    /// Create a new TLS client configuration for `server_name`
    pub fn new<S: Into<String>>(server_name: S) -> Self {
        Self {
            server_name: server_name.into(),
            roots: Vec::new(),
            insecure: false,
        }
    }

    /// Trust the certificates in a PEM buffer
    pub fn with_root_pem(mut self, pem: &[u8]) -> Result<Self> {
        self.roots.extend(read_certificates(&mut Cursor::new(pem))?);
        Ok(self)
    }

    /// Trust the certificates in a PEM file
    pub fn with_root_ca_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|e| ListenerError::TlsError(format!("Failed to open CA file: {e}")))?;
        self.roots.extend(read_certificates(&mut BufReader::new(file))?);
        Ok(self)
    }

    /// Accept any server certificate.
    ///
    /// # WARNING: Security Risk
    /// Disables certificate verification entirely. Development and testing only.
    pub fn insecure(mut self) -> Self {
        warn!("INSECURE MODE ENABLED: Certificate verification is disabled. This should only be used for development/testing.");
        self.insecure = true;
        self
    }

    /// Build the rustls client configuration
    pub fn load_client_config(&self) -> Result<ClientConfig> {
        let builder = ClientConfig::builder().with_safe_defaults();

        if self.insecure {
            struct AcceptAnyServerCert;

            impl ServerCertVerifier for AcceptAnyServerCert {
                fn verify_server_cert(
                    &self,
                    _end_entity: &Certificate,
                    _intermediates: &[Certificate],
                    _server_name: &ServerName,
                    _scts: &mut dyn Iterator<Item = &[u8]>,
                    _ocsp_response: &[u8],
                    _now: std::time::SystemTime,
                ) -> std::result::Result<ServerCertVerified, rustls::Error> {
                    Ok(ServerCertVerified::assertion())
                }
            }

            return Ok(builder
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
                .with_no_client_auth());
        }

        if self.roots.is_empty() {
            return Err(ListenerError::TlsError(constants::ERR_NO_TRUST_ROOTS.into()));
        }

        let mut root_store = RootCertStore::empty();
        for cert in &self.roots {
            root_store.add(cert).map_err(|e| {
                ListenerError::TlsError(format!("Failed to add cert to root store: {e}"))
            })?;
        }

        Ok(builder
            .with_root_certificates(root_store)
            .with_no_client_auth())
    }

    /// Get the server name as a rustls::ServerName
    pub fn server_name(&self) -> Result<ServerName> {
        ServerName::try_from(self.server_name.as_str())
            .map_err(|_| ListenerError::TlsError(constants::ERR_INVALID_SERVER_NAME.into()))
    }
}
