//! Function name rules shared by registration and lookup.

use crate::protocol::error::{MinirpcError, Result};

/// Shortest accepted function name, in bytes.
pub const MIN_NAME_LEN: usize = 1;

/// Longest accepted function name, in bytes.
pub const MAX_NAME_LEN: usize = 1000;

const MIN_NAME_BYTE: u8 = 32;
const MAX_NAME_BYTE: u8 = 126;

/// Checks that `name` is 1 to 1000 bytes of printable ASCII (32..=126).
///
/// Servers apply this on registration and clients apply it before sending a
/// find request, so a name that fails here never reaches the wire.
///
/// # Errors
///
/// Returns [`MinirpcError::InvalidName`] describing the first violation.
pub fn validate_function_name(name: &str) -> Result<()> {
    let len = name.len();
    if len < MIN_NAME_LEN {
        return Err(MinirpcError::InvalidName("name is empty".to_string()));
    }
    if len > MAX_NAME_LEN {
        return Err(MinirpcError::InvalidName(format!(
            "name is {} bytes (max {} bytes)",
            len, MAX_NAME_LEN
        )));
    }

    if let Some(pos) = name
        .bytes()
        .position(|b| !(MIN_NAME_BYTE..=MAX_NAME_BYTE).contains(&b))
    {
        return Err(MinirpcError::InvalidName(format!(
            "non-printable byte 0x{:02x} at offset {}",
            name.as_bytes()[pos],
            pos
        )));
    }

    Ok(())
}
