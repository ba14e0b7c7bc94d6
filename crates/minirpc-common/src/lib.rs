//! minirpc Common Types and Transport
//!
//! This crate provides the protocol definitions, binary wire codec and TCP
//! helpers shared by the minirpc server and client.
//!
//! # Overview
//!
//! minirpc exposes named functions from one process and lets other processes
//! resolve them by name and call them by id. Every call carries a single
//! [`RpcPayload`]: a 64-bit integer plus an optional byte string.
//!
//! - **Protocol Layer**: payload, request/response types, name rules, errors
//! - **Transport Layer**: pure binary codec plus blocking and async stream helpers
//!
//! # Architecture
//!
//! - **Transport**: TCP, one outstanding request per connection
//! - **Serialization**: fixed big-endian binary layout, see [`transport::WireCodec`]
//! - **Max Payload Size**: 100 MB by default (prevents memory exhaustion)
//!
//! # Example
//!
//! ```
//! use minirpc_common::{RpcPayload, transport::WireCodec};
//!
//! let codec = WireCodec::new();
//! let request = codec.encode_call_request(1, &RpcPayload::new(5).with_data2(vec![3])).unwrap();
//! assert_eq!(&request[..4], &[0, 2, 0, 1]);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
