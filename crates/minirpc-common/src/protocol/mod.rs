pub mod error;
pub mod names;
pub mod payload;
pub mod port;
pub mod requests;
pub mod responses;


pub use error::{MinirpcError, Result};
pub use names::{validate_function_name, MAX_NAME_LEN, MIN_NAME_LEN};
pub use payload::RpcPayload;
pub use port::validate_port;
pub use requests::{FunctionId, RequestHeader, RequestKind};
pub use responses::{CallResponse, FindResponse};
