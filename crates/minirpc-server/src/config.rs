use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use minirpc_common::protocol::error::Result;
use minirpc_common::transport::MAX_PAYLOAD_SIZE;
use minirpc_common::validate_port;

/// Port used when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
///
/// Binds the IPv6 unspecified address by default, which accepts IPv4 peers as
/// well on dual-stack hosts.
///
/// # Example
///
/// ```
/// use minirpc_server::ServerConfig;
///
/// let config = ServerConfig::new(3000)
///     .unwrap()
///     .with_bind("127.0.0.1".parse().unwrap())
///     .with_max_payload_len(1024 * 1024);
/// assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: IpAddr,
    /// Port to bind (0 picks a free port)
    pub port: u16,
    /// Largest call payload accepted or produced, in bytes
    pub max_payload_len: usize,
}

impl ServerConfig {
    /// Creates a configuration for `port`, validating it is a real TCP port.
    pub fn new(port: u32) -> Result<Self> {
        Ok(Self {
            port: validate_port(port)?,
            ..Self::default()
        })
    }

    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_payload_len: MAX_PAYLOAD_SIZE,
        }
    }
}
