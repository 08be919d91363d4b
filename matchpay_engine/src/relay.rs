//! # Presence and live delivery relay
//!
//! An in-process registry of who currently holds a live event stream, plus best-effort delivery of frames to
//! them. The relay is deliberately *not* durable: persisted notifications are the source of truth, the relay
//! only gets them onto an open connection faster. A frame for a user who is offline, or whose buffer is full,
//! is dropped and the caller moves on.
//!
//! Rules the implementation guarantees:
//! * one live connection per user: a new [`join`](PresenceRelay::join) replaces any previous session, whose
//!   stream then ends;
//! * [`leave`](PresenceRelay::leave) identifies the session by its connection id, so a straggling disconnect
//!   from a replaced session never knocks out the one that replaced it;
//! * delivery never blocks and never fails the calling flow.
use std::{
    collections::HashMap,
    fmt::Display,
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock,
    },
};

use log::*;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    db_types::{MatchRecord, Message, Notification, UserId},
    traits::Settlement,
};

/// Frames pushed over a live connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayFrame {
    MatchCreated { match_record: MatchRecord },
    Message { message: Message },
    Notification { notification: Notification },
    PaymentSettled { settlement: Settlement },
}

/// Identifies one join. Ids are never reused within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// The user holds no live connection. The frame is gone; the inbox still has it.
    Offline,
    /// The connection exists but its buffer is full or its receiver is gone.
    Dropped,
}

/// One user's end of a live session: the receiver to stream from, and the id to hand back on disconnect.
pub struct LiveSession {
    pub conn_id: ConnectionId,
    pub frames: mpsc::Receiver<RelayFrame>,
}

struct LiveConnection {
    conn_id: ConnectionId,
    sender: mpsc::Sender<RelayFrame>,
}

pub struct PresenceRelay {
    connections: RwLock<HashMap<UserId, LiveConnection>>,
    next_conn_id: AtomicU64,
    buffer_size: usize,
}

impl Default for PresenceRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRelay {
    const DEFAULT_BUFFER_SIZE: usize = 32;

    pub fn new() -> Self {
        Self::with_buffer_size(Self::DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { connections: RwLock::new(HashMap::new()), next_conn_id: AtomicU64::new(1), buffer_size }
    }

    /// Registers a live connection for the user and returns their session. Any previous session for the same
    /// user is replaced; dropping its sender ends the old stream.
    pub fn join(&self, user: UserId) -> LiveSession {
        let conn_id = ConnectionId(self.next_conn_id.fetch_add(1, Ordering::Relaxed));
        let (sender, frames) = mpsc::channel(self.buffer_size);
        let mut conns = self.connections.write().unwrap();
        if let Some(old) = conns.insert(user.clone(), LiveConnection { conn_id, sender }) {
            debug!("🔌️ {user} rejoined; replacing {}", old.conn_id);
        } else {
            debug!("🔌️ {user} is now online as {conn_id}");
        }
        LiveSession { conn_id, frames }
    }

    /// Pushes a frame to the user's live connection, if they have one with room in its buffer.
    pub fn deliver(&self, user: &UserId, frame: RelayFrame) -> DeliveryStatus {
        let conns = self.connections.read().unwrap();
        let Some(conn) = conns.get(user) else {
            trace!("🔌️ {user} is offline; frame dropped");
            return DeliveryStatus::Offline;
        };
        match conn.sender.try_send(frame) {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => {
                debug!("🔌️ Could not deliver frame to {user} on {}: {e}", conn.conn_id);
                DeliveryStatus::Dropped
            },
        }
    }

    /// Removes the session with this connection id, scanning the registry since a disconnect only knows its own
    /// id. Returns the user who went offline, or `None` when the session was already replaced or removed.
    pub fn leave(&self, conn_id: ConnectionId) -> Option<UserId> {
        let mut conns = self.connections.write().unwrap();
        let user = conns.iter().find(|(_, conn)| conn.conn_id == conn_id).map(|(user, _)| user.clone())?;
        conns.remove(&user);
        debug!("🔌️ {user} went offline ({conn_id})");
        Some(user)
    }

    pub fn is_online(&self, user: &UserId) -> bool {
        self.connections.read().unwrap().contains_key(user)
    }

    pub fn online_count(&self) -> usize {
        self.connections.read().unwrap().len()
    }
}
