use std::{collections::BTreeMap, fmt, net::SocketAddr};

use tokio::net::TcpStream;

/// Identifies one registered connection.
///
/// Handles are allocated in increasing order and never reused, so the registry's ordered map
/// yields connections in the order they joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Reserved for the listening socket; connections start above it.
    pub const LISTENER: Handle = Handle(0);

    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Handle {
        Handle(self.0 + 1)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A socket plus the address of whoever is on the other end.
#[derive(Debug)]
pub struct Connection<S> {
    socket: S,
    peer: SocketAddr,
}

impl<S> Connection<S> {
    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn into_socket(self) -> S {
        self.socket
    }
}

/// The set of open connections, keyed by handle.
///
/// Removing a connection hands it back to the caller; dropping it closes the socket.
#[derive(Debug)]
pub struct Registry<S = TcpStream> {
    connections: BTreeMap<Handle, Connection<S>>,
    max_handle: Handle,
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            connections: BTreeMap::new(),
            max_handle: Handle::LISTENER,
        }
    }

    pub fn insert(&mut self, socket: S, peer: SocketAddr) -> Handle {
        let handle = self.max_handle.next();
        self.max_handle = handle;
        self.connections.insert(handle, Connection { socket, peer });
        handle
    }

    pub fn remove(&mut self, handle: Handle) -> Option<Connection<S>> {
        self.connections.remove(&handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&Connection<S>> {
        self.connections.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.connections.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Largest handle ever allocated; never below any open handle.
    pub fn max_handle(&self) -> Handle {
        self.max_handle
    }

    /// Open connections in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Connection<S>)> {
        self.connections
            .iter()
            .map(|(handle, connection)| (*handle, connection))
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.connections.keys().copied()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}
