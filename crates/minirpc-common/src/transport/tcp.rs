use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::error::{MinirpcError, Result};
use crate::protocol::requests::{RequestHeader, HEADER_SIZE};

/// Blocking TCP transport used by client sessions.
///
/// Wraps connection setup and the exact-length reads and writes the protocol
/// is built from. A read or write that cannot move the full requested byte
/// count is an error; nothing is retried.
///
/// # Example
///
/// ```no_run
/// use minirpc_common::transport::TcpTransport;
///
/// let transport = TcpTransport::new();
/// let mut stream = transport.connect("localhost", 3000).unwrap();
///
/// TcpTransport::send_message(&mut stream, &[0, 0, 0, 0]).unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport {
    io_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Creates a transport with no read/write timeouts.
    pub fn new() -> Self {
        Self { io_timeout: None }
    }

    /// Applies `timeout` to every read and write on streams this transport connects.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Connects to `host:port`.
    ///
    /// The host is resolved (it may yield several IPv6 and IPv4 candidates)
    /// and each candidate is tried in order until one accepts.
    ///
    /// # Errors
    ///
    /// Returns `Connect` if the address cannot be resolved, resolves to
    /// nothing, or every candidate refuses the connection.
    pub fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        let socket_addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| MinirpcError::Connect(format!("Invalid address '{}:{}': {}", host, port, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect(socket_addr) {
                Ok(stream) => {
                    tracing::debug!("Connected to {}", socket_addr);
                    self.configure(&stream)?;
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!("Connection to {} failed: {}", socket_addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(MinirpcError::Connect(format!(
            "Failed to connect to {}:{}: {}",
            host,
            port,
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "address resolved to no endpoints".to_string())
        )))
    }

    fn configure(&self, stream: &TcpStream) -> Result<()> {
        // requests are small and strictly request/response, so don't batch them
        stream
            .set_nodelay(true)
            .map_err(|e| MinirpcError::Connect(format!("Failed to set TCP_NODELAY: {}", e)))?;
        stream
            .set_read_timeout(self.io_timeout)
            .map_err(|e| MinirpcError::Connect(format!("Failed to set read timeout: {}", e)))?;
        stream
            .set_write_timeout(self.io_timeout)
            .map_err(|e| MinirpcError::Connect(format!("Failed to set write timeout: {}", e)))?;
        Ok(())
    }

    /// Writes all of `data` and flushes.
    pub fn send_message<W: Write>(stream: &mut W, data: &[u8]) -> Result<()> {
        stream
            .write_all(data)
            .map_err(|e| map_io_error(e, "writing request"))?;
        stream
            .flush()
            .map_err(|e| map_io_error(e, "flushing stream"))?;
        Ok(())
    }

    /// Reads exactly `N` bytes.
    pub fn receive_array<R: Read, const N: usize>(stream: &mut R, context: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        stream
            .read_exact(&mut buf)
            .map_err(|e| map_io_error(e, context))?;
        Ok(buf)
    }

    /// Reads exactly `len` bytes into a fresh heap buffer.
    ///
    /// Callers must have checked `len` against their payload ceiling.
    pub fn receive_message<R: Read>(stream: &mut R, len: usize, context: &str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .map_err(|e| map_io_error(e, context))?;
        Ok(buf)
    }
}

/// Async counterpart of [`TcpTransport`], used by the server's connection tasks.
pub struct TcpTransportAsync;

impl TcpTransportAsync {
    /// Reads the next request header.
    ///
    /// Returns `Ok(None)` when the peer closed the stream before a complete
    /// header arrived.
    pub async fn receive_header<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Option<RequestHeader>> {
        let mut buf = [0u8; HEADER_SIZE];
        match stream.read_exact(&mut buf).await {
            Ok(_) => Ok(Some(RequestHeader::from_bytes(buf))),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(map_io_error(e, "reading request header")),
        }
    }

    /// Reads exactly `N` bytes.
    pub async fn receive_array<R: AsyncRead + Unpin, const N: usize>(
        stream: &mut R,
        context: &str,
    ) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| map_io_error(e, context))?;
        Ok(buf)
    }

    /// Reads exactly `len` bytes into a fresh heap buffer.
    pub async fn receive_message<R: AsyncRead + Unpin>(
        stream: &mut R,
        len: usize,
        context: &str,
    ) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| map_io_error(e, context))?;
        Ok(buf)
    }

    /// Writes all of `data` and flushes.
    pub async fn send_message<W: AsyncWrite + Unpin>(stream: &mut W, data: &[u8]) -> Result<()> {
        stream
            .write_all(data)
            .await
            .map_err(|e| map_io_error(e, "writing response"))?;
        stream
            .flush()
            .await
            .map_err(|e| map_io_error(e, "flushing stream"))?;
        Ok(())
    }
}

/// Map IO errors to `Transport` errors carrying what was being attempted.
///
/// - Timeouts/would block -> timed out
/// - EOF mid-message -> closed by peer
/// - Resets and aborts -> connection lost
pub fn map_io_error(err: std::io::Error, context: &str) -> MinirpcError {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            MinirpcError::Transport(format!("{}: timed out", context))
        }
        std::io::ErrorKind::UnexpectedEof => {
            MinirpcError::Transport(format!("{}: connection closed by peer", context))
        }
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected => {
            MinirpcError::Transport(format!("{}: connection lost", context))
        }
        _ => MinirpcError::Transport(format!("{}: {}", context, err)),
    }
}
