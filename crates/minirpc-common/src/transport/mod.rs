//! minirpc Transport Layer
//!
//! This module provides the binary wire codec and the TCP helpers both sides
//! use to move exact byte counts over a stream.
//!
//! # Components
//!
//! - **[`WireCodec`]**: Pure encode/decode of headers, names, payloads and responses
//! - **[`TcpTransport`]**: Blocking TCP transport (used by clients)
//! - **[`TcpTransportAsync`]**: Async read/write helpers (used by the server loop)
//!
//! # Message Size Limits
//!
//! Every declared length is checked against the codec's payload ceiling
//! (100 MB by default) before a buffer is allocated for it.

pub mod codec;
pub mod tcp;

pub use codec::{WireCodec, MAX_PAYLOAD_SIZE};
pub use tcp::{map_io_error, TcpTransport, TcpTransportAsync};
