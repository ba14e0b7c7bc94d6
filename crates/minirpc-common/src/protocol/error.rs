use thiserror::Error;

use crate::protocol::requests::FunctionId;

#[derive(Error, Debug)]
pub enum MinirpcError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid function name: {0}")]
    InvalidName(String),

    #[error("Invalid handler: no handler supplied")]
    InvalidHandler,

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Payload too large: {len} bytes (max {max} bytes)")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Remote call failed: handler returned no usable result")]
    Remote,

    #[error("Unknown function id: {0}")]
    UnknownId(FunctionId),

    #[error("Function not found: {0}")]
    NotFound(String),
}

impl MinirpcError {
    /// True for errors that leave the stream's framing intact, so the
    /// connection can keep serving after the current message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MinirpcError::Protocol(_)
                | MinirpcError::Remote
                | MinirpcError::UnknownId(_)
                | MinirpcError::NotFound(_)
        )
    }
}

impl From<std::net::AddrParseError> for MinirpcError {
    fn from(err: std::net::AddrParseError) -> Self {
        MinirpcError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MinirpcError>;
