use serde::{Deserialize, Serialize};

use crate::protocol::error::{MinirpcError, Result};

/// Size of the encoded `data1` field.
pub const DATA1_SIZE: usize = 8;

/// Size of the `data2` length prefix that follows `data1` when `data2` is present.
pub const DATA2_LEN_SIZE: usize = 4;

/// The single data envelope carried by every call: a 64-bit scalar plus an
/// optional byte sequence.
///
/// `data2: None` is the "absent" state. `Some` with an empty vector is the
/// inconsistent state (bytes present, length zero) and is rejected by
/// [`RpcPayload::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcPayload {
    pub data1: i64,
    pub data2: Option<Vec<u8>>,
}

impl RpcPayload {
    /// Creates a payload carrying only `data1`.
    pub fn new(data1: i64) -> Self {
        RpcPayload { data1, data2: None }
    }

    /// Attaches `data2`. An empty vector yields the inconsistent state.
    pub fn with_data2(mut self, data2: impl Into<Vec<u8>>) -> Self {
        self.data2 = Some(data2.into());
        self
    }

    /// Number of `data2` bytes, 0 when absent.
    pub fn data2_len(&self) -> usize {
        self.data2.as_ref().map_or(0, Vec::len)
    }

    /// Checks the `data2` / `data2_len` consistency invariant.
    pub fn validate(&self) -> Result<()> {
        match &self.data2 {
            Some(bytes) if bytes.is_empty() => Err(MinirpcError::InvalidArgument(
                "data2 is present but empty".to_string(),
            )),
            Some(bytes) if bytes.len() > u32::MAX as usize => {
                Err(MinirpcError::InvalidArgument(format!(
                    "data2 is {} bytes, which does not fit a 32-bit length",
                    bytes.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Encoded size on the wire: 8 bytes, plus 4 + `data2_len` when `data2` is present.
    pub fn encoded_len(&self) -> usize {
        match &self.data2 {
            Some(bytes) => DATA1_SIZE + DATA2_LEN_SIZE + bytes.len(),
            None => DATA1_SIZE,
        }
    }
}
