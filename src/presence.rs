//! Presence registry — who is currently on which board.
//!
//! DESIGN
//! ======
//! A single lock-protected relation from board id to the set of connected
//! clients, each paired with the sender half of its outbound channel. The
//! registry is owned by `AppState` and injected into handlers, so tests build
//! their own instance and nothing leaks between cases.
//!
//! Membership is keyed by connection id, not user id: the same user in two
//! tabs holds two independent entries, and dropping one leaves the other
//! joined. The write lock serializes join/leave/drop, so no caller ever
//! observes a membership set mid-mutation.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use tracing::info;
use uuid::Uuid;

use crate::event::ServerEvent;

/// Board → (connection → outbound sender). Boards with no members are
/// removed from the map rather than kept as empty entries.
pub struct Registry {
    rooms: RwLock<HashMap<Uuid, HashMap<Uuid, mpsc::Sender<ServerEvent>>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self { rooms: RwLock::new(HashMap::new()) }
    }

    /// Add a connection to a board's membership set. Idempotent: re-joining
    /// replaces the stored sender and never duplicates the entry.
    pub async fn join(&self, board_id: Uuid, client_id: Uuid, tx: mpsc::Sender<ServerEvent>) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(board_id).or_default();
        members.insert(client_id, tx);
        info!(%board_id, %client_id, members = members.len(), "presence: joined board");
    }

    /// Remove a connection from a board's membership set. A connection that
    /// never joined is a no-op, not an error.
    pub async fn leave(&self, board_id: Uuid, client_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(&board_id) else {
            return;
        };
        if members.remove(&client_id).is_some() {
            info!(%board_id, %client_id, remaining = members.len(), "presence: left board");
        }
        if members.is_empty() {
            rooms.remove(&board_id);
        }
    }

    /// Remove a connection from every board it belongs to. Returns exactly the
    /// boards it was actually removed from, so the caller can notify the
    /// remaining members. Idempotent: a second drop returns nothing.
    pub async fn drop_connection(&self, client_id: Uuid) -> Vec<Uuid> {
        let mut rooms = self.rooms.write().await;
        let mut removed_from = Vec::new();
        rooms.retain(|board_id, members| {
            if members.remove(&client_id).is_some() {
                removed_from.push(*board_id);
            }
            !members.is_empty()
        });
        if !removed_from.is_empty() {
            info!(%client_id, boards = removed_from.len(), "presence: dropped connection");
        }
        removed_from
    }

    /// Send an event to every member of a board, optionally excluding one
    /// connection. Best-effort: a peer whose queue is full misses the event.
    pub async fn broadcast(&self, board_id: Uuid, event: &ServerEvent, exclude: Option<Uuid>) {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(&board_id) else {
            return;
        };
        for (client_id, tx) in members {
            if exclude == Some(*client_id) {
                continue;
            }
            let _ = tx.try_send(event.clone());
        }
    }

    /// Current members of a board. Empty if the board has none.
    pub async fn members(&self, board_id: Uuid) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms
            .get(&board_id)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
