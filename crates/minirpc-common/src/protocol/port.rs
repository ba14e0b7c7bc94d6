use crate::protocol::error::{MinirpcError, Result};

/// Highest port a server can bind or a client can dial.
pub const MAX_PORT: u32 = u16::MAX as u32;

/// Validates a user-supplied port number and narrows it to `u16`.
///
/// # Errors
///
/// Returns `InvalidArgument` for anything above 65535.
pub fn validate_port(port: u32) -> Result<u16> {
    u16::try_from(port).map_err(|_| {
        MinirpcError::InvalidArgument(format!("port {} is outside 0..={}", port, MAX_PORT))
    })
}
