//! minirpc Server
//!
//! This crate provides the function registry and the single-threaded server
//! loop that resolves names and invokes registered handlers for minirpc
//! clients.

pub mod config;
pub mod connection;
pub mod registry;
pub mod server;
pub mod state;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use registry::{FunctionEntry, Handler, Registry};
pub use server::Server;
pub use state::{ConnectionSet, ServerState};
