use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::relay::ServerEvent;

pub type ConnId = Uuid;

/// The socket-to-user mapping created by a join. At most one entry per
/// connection; a user may hold several entries at once (multiple devices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub conn_id: ConnId,
    pub user_id: i64,
    pub room_id: String,
}

/// Process-lifetime table of live connections and their room entries. This
/// is the single piece of shared mutable state in the relay; every access
/// goes through the lock. Rebuilt empty on restart.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    senders: HashMap<ConnId, mpsc::UnboundedSender<Message>>,
    entries: HashMap<ConnId, ConnectionEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once when a socket is accepted, before any join.
    pub async fn attach(&self, conn_id: ConnId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.write().await.senders.insert(conn_id, tx);
    }

    /// Registers the connection into a room group. A repeated join from the
    /// same connection replaces its previous entry.
    pub async fn join(&self, conn_id: ConnId, user_id: i64, room_id: String) {
        let entry = ConnectionEntry { conn_id, user_id, room_id };
        self.inner.write().await.entries.insert(conn_id, entry);
    }

    pub async fn entry(&self, conn_id: ConnId) -> Option<ConnectionEntry> {
        self.inner.read().await.entries.get(&conn_id).cloned()
    }

    /// Removes the connection and returns its room entry, if it had joined.
    /// Detaching an unknown connection is a no-op.
    pub async fn detach(&self, conn_id: ConnId) -> Option<ConnectionEntry> {
        let mut inner = self.inner.write().await;
        inner.senders.remove(&conn_id);
        inner.entries.remove(&conn_id)
    }

    pub async fn send_to(&self, conn_id: ConnId, event: &ServerEvent) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        let inner = self.inner.read().await;
        if let Some(tx) = inner.senders.get(&conn_id) {
            let _ = tx.send(Message::text(payload));
        }
    }

    /// System-wide fan-out, reaching connections that have not joined any
    /// room yet.
    pub async fn broadcast_all(&self, event: &ServerEvent) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        let inner = self.inner.read().await;
        for tx in inner.senders.values() {
            let _ = tx.send(Message::text(payload.clone()));
        }
    }

    pub async fn broadcast_room(&self, room_id: &str, event: &ServerEvent) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        let inner = self.inner.read().await;
        for entry in inner.entries.values().filter(|e| e.room_id == room_id) {
            if let Some(tx) = inner.senders.get(&entry.conn_id) {
                let _ = tx.send(Message::text(payload.clone()));
            }
        }
    }

    pub async fn connections_in(&self, room_id: &str) -> usize {
        self.inner
            .read()
            .await
            .entries
            .values()
            .filter(|e| e.room_id == room_id)
            .count()
    }
}
