use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use minirpc_common::protocol::error::{MinirpcError, Result};
use minirpc_common::transport::{TcpTransport, WireCodec, MAX_PAYLOAD_SIZE};
use minirpc_common::{validate_port, FindResponse, FunctionId, RpcPayload};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read/write timeout applied to the session socket; `None` blocks indefinitely
    pub io_timeout: Option<Duration>,
    /// Largest response payload the client will accept, in bytes
    pub max_payload_len: usize,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    pub fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            io_timeout: None,
            max_payload_len: MAX_PAYLOAD_SIZE,
        }
    }
}

/// A resolved remote function, returned by [`MinirpcClient::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    fid: FunctionId,
}

impl Handle {
    pub fn fid(&self) -> FunctionId {
        self.fid
    }
}

/// A blocking session with one minirpc server.
///
/// One request is in flight at a time: every method writes its request and
/// reads the full response before returning. Dropping an open session sends
/// the close signal.
///
/// # Example
///
/// ```no_run
/// use minirpc_client::MinirpcClient;
/// use minirpc_common::RpcPayload;
///
/// let mut client = MinirpcClient::connect("::1", 3000).unwrap();
/// let add2 = client.find("add2").unwrap();
/// let result = client.call(&add2, &RpcPayload::new(5).with_data2(vec![3])).unwrap();
/// assert_eq!(result.data1, 8);
/// client.close();
/// ```
#[derive(Debug)]
pub struct MinirpcClient {
    stream: Option<TcpStream>,
    peer_addr: SocketAddr,
    codec: WireCodec,
}

impl MinirpcClient {
    /// Connects to `host:port` with the default configuration.
    pub fn connect(host: &str, port: u32) -> Result<Self> {
        Self::connect_with_config(host, port, ClientConfig::default())
    }

    /// Connects to `host:port`, trying every resolved endpoint in order.
    ///
    /// # Errors
    ///
    /// Returns `Connect` if the port is out of range, the host cannot be
    /// resolved, or no endpoint accepts the connection.
    pub fn connect_with_config(host: &str, port: u32, config: ClientConfig) -> Result<Self> {
        let port = validate_port(port).map_err(|e| MinirpcError::Connect(e.to_string()))?;

        let mut transport = TcpTransport::new();
        if let Some(timeout) = config.io_timeout {
            transport = transport.with_io_timeout(timeout);
        }

        let stream = transport.connect(host, port)?;
        let peer_addr = stream
            .peer_addr()
            .map_err(|e| MinirpcError::Connect(format!("Failed to get peer address: {}", e)))?;

        tracing::debug!("Session opened to {}", peer_addr);

        Ok(Self {
            stream: Some(stream),
            peer_addr,
            codec: WireCodec::with_max_payload_len(config.max_payload_len),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Resolves `name` to a handle.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if the name breaks the registration rules (no I/O happens)
    /// - `NotFound` if the server has no function by that name
    /// - `Transport` if the request or response could not be moved in full
    ///
    /// A `Transport` failure ends the session.
    pub fn find(&mut self, name: &str) -> Result<Handle> {
        let request = self.codec.encode_find_request(name)?;
        let exchange: Result<[u8; 2]> = self.stream_mut().and_then(|stream| {
            TcpTransport::send_message(stream, &request)?;
            TcpTransport::receive_array(stream, "reading find response")
        });
        let reply = self.end_session_on_failure(exchange)?;

        match self.codec.decode_find_response(reply) {
            FindResponse::Found(fid) => {
                tracing::debug!("Resolved '{}' to id {}", name, fid);
                Ok(Handle { fid })
            }
            FindResponse::NotFound => Err(MinirpcError::NotFound(name.to_string())),
        }
    }

    /// Invokes the function behind `handle` with `payload`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `payload` violates the `data2` invariant (no I/O happens)
    /// - `Remote` if the server reports the call failed
    /// - `PayloadTooLarge` if the server announces a response over the configured ceiling
    /// - `Protocol` if the response body cannot be decoded
    /// - `Transport` if the request or response could not be moved in full
    ///
    /// `PayloadTooLarge` and `Transport` failures end the session; later calls
    /// fail with `Transport` without touching the network.
    pub fn call(&mut self, handle: &Handle, payload: &RpcPayload) -> Result<RpcPayload> {
        let request = self.codec.encode_call_request(handle.fid, payload)?;
        let codec = self.codec;
        let exchange = self.stream_mut().and_then(|stream| {
            TcpTransport::send_message(stream, &request)?;

            let len_buf = TcpTransport::receive_array(stream, "reading response length")?;
            let len = codec.decode_length(len_buf)?;
            if len == 0 {
                return Err(MinirpcError::Remote);
            }

            let body = TcpTransport::receive_message(stream, len, "reading response payload")?;
            codec.decode_payload(&body)
        });
        self.end_session_on_failure(exchange)
    }

    /// Drops the socket after any failure that may have left response bytes
    /// unread, so a later request cannot read them as its own reply.
    fn end_session_on_failure<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_recoverable() && self.stream.take().is_some() {
                tracing::debug!("Session to {} ended after error: {}", self.peer_addr, e);
            }
        }
        result
    }

    /// Sends the close signal and closes the socket.
    ///
    /// Safe to call more than once; only the first call touches the network.
    /// A failure to deliver the close signal is logged, not returned.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let close = self.codec.encode_close();
            if let Err(e) = TcpTransport::send_message(&mut stream, &close) {
                tracing::debug!("Failed to send close signal to {}: {}", self.peer_addr, e);
            }
            tracing::debug!("Session to {} closed", self.peer_addr);
        }
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| MinirpcError::Transport("session is closed".to_string()))
    }
}

impl Drop for MinirpcClient {
    fn drop(&mut self) {
        self.close();
    }
}
