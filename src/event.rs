//! Event — the wire protocol for the real-time channel.
//!
//! ARCHITECTURE
//! ============
//! Every websocket message is a JSON object `{"event": <name>, "data": {…}}`.
//! Clients send `ClientEvent`s, the relay answers each one with an `ack` and
//! fans a `ServerEvent` out to the other members of the named board. Field
//! names are camelCase on the wire to match the canvas frontend.
//!
//! DESIGN
//! ======
//! - Post-it payloads (`postit`, `updates`) are opaque `serde_json::Value`s:
//!   the relay is a notification channel, not a validator, and forwards them
//!   verbatim. The durable write happens on the REST path.
//! - Board and post-it identifiers are typed `Uuid`s; a message that fails to
//!   parse is answered with `Ack { success: false }` and nothing is broadcast.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// INBOUND
// =============================================================================

/// Events a client may send over an established connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientEvent {
    JoinBoard {
        board_id: Uuid,
    },
    LeaveBoard {
        board_id: Uuid,
    },
    PostitCreated {
        board_id: Uuid,
        postit: serde_json::Value,
    },
    PostitUpdated {
        board_id: Uuid,
        postit_id: Uuid,
        updates: serde_json::Value,
    },
    PostitDeleted {
        board_id: Uuid,
        postit_id: Uuid,
    },
    /// High-frequency drag positions. Never persisted.
    PostitMoving {
        board_id: Uuid,
        postit_id: Uuid,
        x: f64,
        y: f64,
    },
    /// Ephemeral pointer positions. Never persisted.
    CursorMove {
        board_id: Uuid,
        x: f64,
        y: f64,
    },
}

impl ClientEvent {
    /// The board this event targets. Every inbound event names one.
    #[must_use]
    pub fn board_id(&self) -> Uuid {
        match self {
            Self::JoinBoard { board_id }
            | Self::LeaveBoard { board_id }
            | Self::PostitCreated { board_id, .. }
            | Self::PostitUpdated { board_id, .. }
            | Self::PostitDeleted { board_id, .. }
            | Self::PostitMoving { board_id, .. }
            | Self::CursorMove { board_id, .. } => *board_id,
        }
    }

    /// Event name as it appears on the wire. Used for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinBoard { .. } => "join-board",
            Self::LeaveBoard { .. } => "leave-board",
            Self::PostitCreated { .. } => "postit-created",
            Self::PostitUpdated { .. } => "postit-updated",
            Self::PostitDeleted { .. } => "postit-deleted",
            Self::PostitMoving { .. } => "postit-moving",
            Self::CursorMove { .. } => "cursor-move",
        }
    }

    /// High-frequency events are exempt from per-event logging.
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::PostitMoving { .. } | Self::CursorMove { .. })
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Events the server sends: the per-request acknowledgement, the handshake
/// confirmation, and the broadcasts relayed to board peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent once after a successful handshake.
    Connected {
        client_id: Uuid,
        user_id: Uuid,
        email: String,
        name: String,
    },
    /// Synchronous reply to every inbound event.
    Ack {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    UserJoined {
        user_id: Uuid,
        email: String,
    },
    UserLeft {
        user_id: Uuid,
        email: String,
    },
    PostitCreated {
        postit: serde_json::Value,
        user_id: Uuid,
    },
    PostitUpdated {
        postit_id: Uuid,
        updates: serde_json::Value,
        user_id: Uuid,
    },
    PostitDeleted {
        postit_id: Uuid,
        user_id: Uuid,
    },
    PostitMoving {
        postit_id: Uuid,
        x: f64,
        y: f64,
        user_id: Uuid,
    },
    CursorMove {
        user_id: Uuid,
        email: String,
        x: f64,
        y: f64,
    },
}

impl ServerEvent {
    /// Successful acknowledgement with no message.
    #[must_use]
    pub fn ack() -> Self {
        Self::Ack { success: true, message: None }
    }

    /// Successful acknowledgement with confirmation text.
    pub fn ack_with(message: impl Into<String>) -> Self {
        Self::Ack { success: true, message: Some(message.into()) }
    }

    /// Failed acknowledgement. Terminal for the inbound event; nothing is
    /// broadcast on its behalf.
    pub fn nack(message: impl Into<String>) -> Self {
        Self::Ack { success: false, message: Some(message.into()) }
    }
}

// =============================================================================
// TESTS
// =============================================================================
