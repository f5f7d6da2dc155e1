//! Connection setup for the NNTP client
//!
//! Resolves the peer, opens a tuned TCP socket, optionally wraps it in TLS
//! and reads the server greeting.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::{debug, info};

use super::state::ConnectionState;
use super::{NntpClient, NntpStream};
use crate::error::{NntpError, Result};
use crate::response::codes;

/// BufReader capacity; responses are single status lines
const BUFREADER_CAPACITY: usize = 8 * 1024;

/// Resolve `host:port` to the first usable socket address
async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| {
            NntpError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Failed to resolve {}: {}", host, e),
            ))
        })?
        .next()
        .ok_or_else(|| {
            NntpError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("No address resolved for {}", host),
            ))
        })
}

/// Open a TCP connection through socket2 so the socket can be tuned first
async fn open_tcp(addr: SocketAddr, connect_timeout: Duration) -> Result<TcpStream> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(NntpError::Io)?;

    // Request/response protocol: small commands must go out immediately
    socket.set_nodelay(true).map_err(NntpError::Io)?;

    // Socket::connect blocks, so it runs on the blocking pool and the
    // socket is switched to non-blocking only once connected.
    let tcp_stream = timeout(
        connect_timeout,
        tokio::task::spawn_blocking(move || -> std::io::Result<std::net::TcpStream> {
            socket.connect(&addr.into())?;
            socket.set_nonblocking(true)?;
            Ok(socket.into())
        }),
    )
    .await
    .map_err(|_| NntpError::Timeout)?
    .map_err(|e| NntpError::Io(std::io::Error::other(format!("Task join error: {}", e))))?
    .map_err(NntpError::Io)?;

    TcpStream::from_std(tcp_stream).map_err(NntpError::Io)
}

/// Wrap `tcp` in TLS, validating the server against the webpki roots
async fn start_tls(
    host: &str,
    tcp: TcpStream,
    handshake_timeout: Duration,
) -> Result<Box<dyn NntpStream>> {
    use tokio_rustls::rustls::crypto::{CryptoProvider, ring};
    let _ = CryptoProvider::install_default(ring::default_provider());

    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(tls_config));
    let server_name = ServerName::try_from(host)
        .map_err(|e| NntpError::Tls(format!("Invalid domain: {}", e)))?
        .to_owned();

    let tls_stream = timeout(handshake_timeout, connector.connect(server_name, tcp))
        .await
        .map_err(|_| NntpError::Timeout)?
        .map_err(|e| NntpError::Tls(format!("TLS handshake failed: {}", e)))?;

    Ok(Box::new(tls_stream))
}

impl NntpClient {
    /// Connect to an NNTP server and read its greeting
    ///
    /// `io_timeout` bounds the TCP connect, the TLS handshake and every
    /// later response read individually.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`NntpError::Io`] - Name resolution or the TCP connection fails
    /// - [`NntpError::Tls`] - TLS handshake fails
    /// - [`NntpError::Timeout`] - Connection, handshake or greeting times out
    /// - [`NntpError::Protocol`] - Server greets with anything but 200 or 201
    pub async fn connect(host: &str, port: u16, tls: bool, io_timeout: Duration) -> Result<Self> {
        debug!("Connecting to NNTP server {}:{}", host, port);

        let addr = resolve(host, port).await?;
        let tcp = open_tcp(addr, io_timeout).await?;

        let stream: Box<dyn NntpStream> = if tls {
            start_tls(host, tcp, io_timeout).await?
        } else {
            Box::new(tcp)
        };

        let mut client = Self {
            stream: BufReader::with_capacity(BUFREADER_CAPACITY, stream),
            state: ConnectionState::Ready,
            peer: format!("{}:{}", host, port),
            io_timeout,
            posting_allowed: false,
        };

        let greeting = client.read_response().await?;
        debug!("Server greeting: {} {}", greeting.code, greeting.message);

        match greeting.code {
            codes::READY_POSTING_ALLOWED => client.posting_allowed = true,
            codes::READY_NO_POSTING => {
                info!("{} greets without posting permission", client.peer);
            }
            _ => {
                return Err(NntpError::Protocol {
                    code: greeting.code,
                    message: greeting.message,
                });
            }
        }

        Ok(client)
    }
}
