use std::cell::RefCell;
use std::collections::HashMap;
use std::net::SocketAddr;

use minirpc_common::transport::WireCodec;

use crate::registry::Registry;

/// Number identifying an accepted connection for the lifetime of a server.
pub type ConnectionId = u64;

/// The connections a server is currently servicing.
///
/// Tracks the peer of every live connection plus the high-water mark of
/// simultaneously tracked connections.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    active: HashMap<ConnectionId, SocketAddr>,
    next_id: ConnectionId,
    high_water_mark: usize,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a connection from `peer` and returns its id.
    pub fn track(&mut self, peer: SocketAddr) -> ConnectionId {
        self.next_id += 1;
        let id = self.next_id;
        self.active.insert(id, peer);
        self.high_water_mark = self.high_water_mark.max(self.active.len());
        id
    }

    /// Stops tracking `id`, returning its peer if it was tracked.
    pub fn untrack(&mut self, id: ConnectionId) -> Option<SocketAddr> {
        self.active.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }
}

/// Everything a running server owns, shared by reference with each
/// connection task on the serving thread.
///
/// Only touched from the serving thread.
#[derive(Debug)]
pub struct ServerState {
    pub registry: Registry,
    pub codec: WireCodec,
    pub connections: RefCell<ConnectionSet>,
}

impl ServerState {
    pub fn new(registry: Registry, codec: WireCodec) -> Self {
        Self {
            registry,
            codec,
            connections: RefCell::new(ConnectionSet::new()),
        }
    }
}
