//! minirpc Server
//!
//! This module provides the server loop: one listening socket, every accepted
//! connection, and the registry, all driven from a single thread.
//!
//! # Architecture
//!
//! The server:
//! - Binds its listening socket when constructed, so bind errors surface early
//! - Takes registrations until it starts serving
//! - Runs a tokio current-thread runtime inside a `LocalSet`
//! - Accepts connections and spawns a local task per connection
//! - Runs handlers inline on that one thread, so no two ever overlap
//!
//! A connection waiting on a slow peer only parks its own task. A slow
//! handler, on the other hand, holds up every connection until it returns.
//!
//! # Example
//!
//! ```no_run
//! use minirpc_server::{Server, ServerConfig};
//! use minirpc_common::RpcPayload;
//!
//! let mut server = Server::bind(ServerConfig::new(3000).unwrap()).unwrap();
//! server
//!     .register("echo", |input: &RpcPayload| Some(input.clone()))
//!     .unwrap();
//! server.serve_all().unwrap();
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::rc::Rc;

use tokio::net::{TcpListener, TcpStream};

use minirpc_common::protocol::error::{MinirpcError, Result};
use minirpc_common::transport::WireCodec;
use minirpc_common::{FunctionId, RpcPayload};

use crate::config::ServerConfig;
use crate::connection::{serve_connection, Disconnect};
use crate::registry::Registry;
use crate::state::{ConnectionId, ServerState};

/// A bound minirpc server that has not started serving yet.
pub struct Server {
    listener: std::net::TcpListener,
    registry: Registry,
    config: ServerConfig,
}

impl Server {
    /// Binds the listening socket described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the socket cannot be bound or configured.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let addr = config.socket_addr();
        let listener = std::net::TcpListener::bind(addr)
            .map_err(|e| MinirpcError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| MinirpcError::Transport(format!("Failed to configure listener: {}", e)))?;

        tracing::info!("minirpc server bound to {}", addr);

        Ok(Self {
            listener,
            registry: Registry::new(),
            config,
        })
    }

    /// Gets the actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| MinirpcError::Transport(format!("Failed to get local addr: {}", e)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers `handler` under `name`. See [`Registry::register`].
    pub fn register<F>(&mut self, name: &str, handler: F) -> Result<FunctionId>
    where
        F: Fn(&RpcPayload) -> Option<RpcPayload> + Send + Sync + 'static,
    {
        self.registry.register(name, Some(Box::new(handler)))
    }

    /// Serves requests forever on the calling thread.
    ///
    /// Only returns if the runtime cannot be started.
    pub fn serve_all(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending())
    }

    /// Serves requests on the calling thread until `shutdown` resolves.
    ///
    /// Builds its own current-thread runtime, so it must not be called from
    /// inside another tokio runtime. Connections still open at shutdown are
    /// dropped once the handler call in progress (if any) has returned.
    pub fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| MinirpcError::Transport(format!("Failed to start runtime: {}", e)))?;

        tokio::task::LocalSet::new().block_on(&runtime, self.run(shutdown))
    }

    /// Runs the accept loop on the current `LocalSet` until `shutdown` resolves.
    ///
    /// Connection tasks are spawned with `spawn_local`, so this must be
    /// awaited inside a `LocalSet`.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::from_std(self.listener)
            .map_err(|e| MinirpcError::Transport(format!("Failed to register listener: {}", e)))?;
        let codec = WireCodec::with_max_payload_len(self.config.max_payload_len);
        let state = Rc::new(ServerState::new(self.registry, codec));

        tracing::info!(
            "Serving {} function(s) on {} (max payload {} bytes)",
            state.registry.len(),
            listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown address".to_string()),
            state.codec.max_payload_len()
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => spawn_connection(&state, stream, peer),
                    Err(e) => tracing::error!("Failed to accept connection: {}", e),
                },
            }
        }

        let connections = state.connections.borrow();
        tracing::info!(
            "Server stopped with {} open connection(s), peak {}",
            connections.len(),
            connections.high_water_mark()
        );
        Ok(())
    }
}

/// Untracks a connection when its task ends, including by panic.
struct TrackedConnection {
    state: Rc<ServerState>,
    id: ConnectionId,
}

impl Drop for TrackedConnection {
    fn drop(&mut self) {
        let mut connections = self.state.connections.borrow_mut();
        if let Some(peer) = connections.untrack(self.id) {
            tracing::debug!(
                "Connection {} from {} untracked ({} open)",
                self.id,
                peer,
                connections.len()
            );
        }
    }
}

fn spawn_connection(state: &Rc<ServerState>, stream: TcpStream, peer: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
    }

    let id = state.connections.borrow_mut().track(peer);
    tracing::info!(
        "New connection from {} (connection {}, {} open)",
        peer,
        id,
        state.connections.borrow().len()
    );

    let tracked = TrackedConnection {
        state: Rc::clone(state),
        id,
    };

    tokio::task::spawn_local(async move {
        let outcome = serve_connection(stream, tracked.id, &tracked.state).await;
        if outcome == Disconnect::Failed {
            tracing::debug!("Dropped connection {} from {} after failure", tracked.id, peer);
        }
    });
}
