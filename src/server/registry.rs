use std::fmt;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Identity of one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One active connection as the listener sees it.
pub struct Entry {
    pub id: ConnId,
    /// Signals the connection task to close.
    pub close_tx: oneshot::Sender<()>,
    /// The task owning the connection; completes once it has closed.
    pub task: JoinHandle<()>,
}

/// The set of active connections of one listener, in registration order.
///
/// Mutated only from the server thread between await points; no two
/// mutations ever overlap, so no locking is needed.
#[derive(Default)]
pub struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the identity for a connection about to be registered.
    pub fn allocate_id(&mut self) -> ConnId {
        self.next_id += 1;
        ConnId(self.next_id)
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Removes one connection. Safe to call for a connection that is not
    /// present — the shutdown-driven and self-driven close paths can both
    /// reach this. Returns whether anything was removed.
    pub fn deregister(&mut self, id: ConnId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the registry, returning the entries in reverse
    /// registration order (last accepted first) for ordered bulk
    /// shutdown.
    pub fn drain_reverse(&mut self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.entries.drain(..).collect();
        entries.reverse();
        entries
    }
}
