use crate::protocol::payload::RpcPayload;
use crate::protocol::requests::FunctionId;

/// Size of a find response on the wire.
pub const FIND_RESPONSE_SIZE: usize = 2;

/// Size of the length prefix that starts a call request body and a call response.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Answer to a find request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindResponse {
    Found(FunctionId),
    NotFound,
}

impl FindResponse {
    pub fn from_id(id: FunctionId) -> Self {
        if id == 0 {
            FindResponse::NotFound
        } else {
            FindResponse::Found(id)
        }
    }

    pub fn id(self) -> FunctionId {
        match self {
            FindResponse::Found(id) => id,
            FindResponse::NotFound => 0,
        }
    }
}

/// Answer to a call request.
///
/// `Failed` goes on the wire as a zero length with no body; it covers unknown
/// ids, undecodable arguments, handlers that returned nothing, and handler
/// results that violate the payload invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResponse {
    Success(RpcPayload),
    Failed,
}

impl CallResponse {
    /// Wraps a handler result, downgrading inconsistent payloads to `Failed`.
    pub fn from_handler_result(result: Option<RpcPayload>) -> Self {
        match result {
            Some(payload) if payload.validate().is_ok() => CallResponse::Success(payload),
            _ => CallResponse::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResponse::Success(_))
    }
}
