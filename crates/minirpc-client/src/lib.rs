//! minirpc Client
//!
//! Blocking client sessions: connect to a server, resolve functions by name,
//! and call them with an [`RpcPayload`](minirpc_common::RpcPayload).

pub mod client;

pub use client::{ClientConfig, Handle, MinirpcClient};
