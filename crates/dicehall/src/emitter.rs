//! The outbound-emit capability: per-connection channels plus the
//! connection→room association.
//!
//! Every connection handler registers an unbounded channel here; its
//! writer task drains the channel onto the socket. The dispatcher then
//! addresses events by connection or by room without ever touching a
//! socket itself.
//!
//! The room association is transport-level state, deliberately separate
//! from the room directory: the directory records which *identities* are
//! members, the emitter records which room each *connection* is currently
//! scoped to (what a `socket.join(room)` would be in other stacks).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use dicehall_protocol::ServerEvent;
use dicehall_transport::ConnectionId;

/// Channel sender carrying outbound events to one connection's writer.
pub(crate) type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Registry of connected clients and their room scopes.
///
/// Cheap to clone; all clones share state. The inner mutex is a plain
/// `std::sync::Mutex` — every critical section is a map lookup or an
/// unbounded (non-blocking) channel send, never an await.
#[derive(Clone, Default)]
pub(crate) struct Emitter {
    inner: Arc<Mutex<EmitterInner>>,
}

#[derive(Default)]
struct EmitterInner {
    senders: HashMap<ConnectionId, EventSender>,
    /// The room each connection is currently scoped to. Joining another
    /// room replaces the previous scope.
    rooms: HashMap<ConnectionId, String>,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound channel.
    pub(crate) fn register(&self, conn: ConnectionId, sender: EventSender) {
        self.inner.lock().unwrap().senders.insert(conn, sender);
    }

    /// Drops a connection: its channel and its room scope.
    pub(crate) fn forget(&self, conn: ConnectionId) {
        let mut inner = self.inner.lock().unwrap();
        inner.senders.remove(&conn);
        inner.rooms.remove(&conn);
    }

    /// Scopes a connection to a room (replacing any previous scope).
    pub(crate) fn join(&self, conn: ConnectionId, room: &str) {
        self.inner
            .lock()
            .unwrap()
            .rooms
            .insert(conn, room.to_string());
    }

    /// Clears a connection's room scope if it matches `room`.
    pub(crate) fn leave(&self, conn: ConnectionId, room: &str) {
        let mut inner = self.inner.lock().unwrap();
        if inner.rooms.get(&conn).is_some_and(|r| r.as_str() == room) {
            inner.rooms.remove(&conn);
        }
    }

    /// The room a connection is currently scoped to.
    pub(crate) fn room_of(&self, conn: ConnectionId) -> Option<String> {
        self.inner.lock().unwrap().rooms.get(&conn).cloned()
    }

    /// Sends an event to one connection. Silently drops if the
    /// connection is gone — the disconnect path cleans up shortly after.
    pub(crate) fn to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.inner.lock().unwrap().senders.get(&conn) {
            let _ = sender.send(event);
        }
    }

    /// Sends an event to every connection except `conn`.
    pub(crate) fn broadcast_others(
        &self,
        conn: ConnectionId,
        event: ServerEvent,
    ) {
        let inner = self.inner.lock().unwrap();
        for (id, sender) in &inner.senders {
            if *id != conn {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Sends an event to every connection scoped to `room`.
    pub(crate) fn to_room(&self, room: &str, event: ServerEvent) {
        let inner = self.inner.lock().unwrap();
        for (id, scoped) in &inner.rooms {
            if scoped.as_str() == room {
                if let Some(sender) = inner.senders.get(id) {
                    let _ = sender.send(event.clone());
                }
            }
        }
    }

    /// Sends an event to every connection scoped to `room` except `conn`.
    pub(crate) fn to_room_except(
        &self,
        room: &str,
        conn: ConnectionId,
        event: ServerEvent,
    ) {
        let inner = self.inner.lock().unwrap();
        for (id, scoped) in &inner.rooms {
            if scoped.as_str() == room && *id != conn {
                if let Some(sender) = inner.senders.get(id) {
                    let _ = sender.send(event.clone());
                }
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
