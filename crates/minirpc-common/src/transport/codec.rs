use crate::protocol::error::{MinirpcError, Result};
use crate::protocol::names::validate_function_name;
use crate::protocol::payload::{RpcPayload, DATA1_SIZE, DATA2_LEN_SIZE};
use crate::protocol::requests::{FunctionId, RequestHeader, HEADER_SIZE};
use crate::protocol::responses::{CallResponse, FindResponse, FIND_RESPONSE_SIZE, LENGTH_PREFIX_SIZE};

/// Default ceiling for a declared payload length (100 MB).
pub const MAX_PAYLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Binary codec for minirpc messages.
///
/// Every method is pure: bytes in, bytes or values out, no I/O. Lengths read
/// from the wire are checked against `max_payload_len` before any buffer is
/// sized from them.
///
/// # Wire Format
///
/// ```text
/// request header : [kind u16][arg u16]
/// find request   : header(kind=1, arg=name_len) [name bytes]
/// find response  : [fid u16]                       (0 = not found)
/// call request   : header(kind=2, arg=fid) [len u32] [payload]
/// call response  : [len u32] [payload]             (len 0 = failed, no payload)
/// payload        : [data1 i64] ([data2_len u32] [data2 bytes])?
/// ```
///
/// # Example
///
/// ```
/// use minirpc_common::transport::WireCodec;
/// use minirpc_common::RpcPayload;
///
/// let codec = WireCodec::new();
/// let payload = RpcPayload::new(5).with_data2(vec![3]);
///
/// let encoded = codec.encode_payload(&payload).unwrap();
/// assert_eq!(encoded.len(), 13);
///
/// let decoded = codec.decode_payload(&encoded).unwrap();
/// assert_eq!(decoded, payload);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WireCodec {
    max_payload_len: usize,
}

impl WireCodec {
    /// Creates a codec with the default 100 MB payload ceiling.
    pub fn new() -> Self {
        Self::with_max_payload_len(MAX_PAYLOAD_SIZE)
    }

    pub fn with_max_payload_len(max_payload_len: usize) -> Self {
        WireCodec { max_payload_len }
    }

    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Encodes a payload body (no length prefix).
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the payload violates the `data2` invariant
    /// - `PayloadTooLarge` if the encoding exceeds the configured ceiling
    pub fn encode_payload(&self, payload: &RpcPayload) -> Result<Vec<u8>> {
        payload.validate()?;
        let len = self.check_length(payload.encoded_len())?;

        let mut buf = Vec::with_capacity(len);
        buf.extend_from_slice(&payload.data1.to_be_bytes());
        if let Some(data2) = &payload.data2 {
            buf.extend_from_slice(&(data2.len() as u32).to_be_bytes());
            buf.extend_from_slice(data2);
        }

        Ok(buf)
    }

    /// Decodes a payload body whose total length is `data.len()`.
    ///
    /// A body of exactly 8 bytes carries no `data2`. Anything longer must hold
    /// a non-zero `data2` length that exactly fills the rest of the buffer.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` for truncated bodies, a zero `data2` length, or a
    /// declared `data2` length that does not match the remaining bytes.
    pub fn decode_payload(&self, data: &[u8]) -> Result<RpcPayload> {
        self.check_length(data.len())?;

        let (data1_bytes, rest) = data.split_first_chunk::<DATA1_SIZE>().ok_or_else(|| {
            MinirpcError::Protocol(format!(
                "payload is {} bytes, shorter than the {}-byte data1 field",
                data.len(),
                DATA1_SIZE
            ))
        })?;
        let data1 = i64::from_be_bytes(*data1_bytes);

        if rest.is_empty() {
            return Ok(RpcPayload::new(data1));
        }

        let (len_bytes, bytes) = rest.split_first_chunk::<DATA2_LEN_SIZE>().ok_or_else(|| {
            MinirpcError::Protocol(format!(
                "payload has {} trailing bytes, too few for a data2 length",
                rest.len()
            ))
        })?;
        let data2_len = u32::from_be_bytes(*len_bytes) as usize;

        if data2_len == 0 {
            return Err(MinirpcError::Protocol(
                "data2 length is zero but a data2 section is present".to_string(),
            ));
        }
        if data2_len != bytes.len() {
            return Err(MinirpcError::Protocol(format!(
                "data2 length {} does not match the {} bytes remaining",
                data2_len,
                bytes.len()
            )));
        }

        Ok(RpcPayload {
            data1,
            data2: Some(bytes.to_vec()),
        })
    }

    /// Encodes the header and name of a find request.
    pub fn encode_find_request(&self, name: &str) -> Result<Vec<u8>> {
        validate_function_name(name)?;
        // validate_function_name caps the length at 1000, so this cannot truncate
        let header = RequestHeader::find(name.len() as u16);

        let mut buf = Vec::with_capacity(HEADER_SIZE + name.len());
        buf.extend_from_slice(&header.to_bytes());
        buf.extend_from_slice(name.as_bytes());
        Ok(buf)
    }

    pub fn encode_find_response(&self, response: FindResponse) -> [u8; FIND_RESPONSE_SIZE] {
        response.id().to_be_bytes()
    }

    pub fn decode_find_response(&self, data: [u8; FIND_RESPONSE_SIZE]) -> FindResponse {
        FindResponse::from_id(u16::from_be_bytes(data))
    }

    /// Encodes a complete call request: header, length prefix and payload.
    pub fn encode_call_request(&self, fid: FunctionId, payload: &RpcPayload) -> Result<Vec<u8>> {
        let body = self.encode_payload(payload)?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + LENGTH_PREFIX_SIZE + body.len());
        buf.extend_from_slice(&RequestHeader::call(fid).to_bytes());
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Encodes a call response. `Failed` becomes a bare zero length.
    pub fn encode_call_response(&self, response: &CallResponse) -> Result<Vec<u8>> {
        match response {
            CallResponse::Failed => Ok(0u32.to_be_bytes().to_vec()),
            CallResponse::Success(payload) => {
                let body = self.encode_payload(payload)?;
                let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + body.len());
                buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
                buf.extend_from_slice(&body);
                Ok(buf)
            }
        }
    }

    pub fn encode_close(&self) -> [u8; HEADER_SIZE] {
        RequestHeader::close().to_bytes()
    }

    /// Decodes a u32 length prefix and checks it against the payload ceiling.
    pub fn decode_length(&self, data: [u8; LENGTH_PREFIX_SIZE]) -> Result<usize> {
        self.check_length(u32::from_be_bytes(data) as usize)
    }

    fn check_length(&self, len: usize) -> Result<usize> {
        if len > self.max_payload_len || len > u32::MAX as usize {
            return Err(MinirpcError::PayloadTooLarge {
                len,
                max: self.max_payload_len,
            });
        }
        Ok(len)
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}
