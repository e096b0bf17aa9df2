//! WebSocket handler — connection auth, presence, and event relay.
//!
//! DESIGN
//! ======
//! The credential is verified exactly once, before the upgrade; a connection
//! with no valid token never enters the event loop. After upgrade each
//! connection runs a `select!` loop:
//! - Incoming client events → dispatch, ack the sender, broadcast to peers
//! - Events relayed from board peers → forward to the client
//!
//! The relay never writes to durable storage: `postit-*` events are
//! notifications about writes the client performs via the REST path, and
//! their payloads are forwarded verbatim. Board access is checked once at
//! `join-board`; steady-state relay stays free of database I/O.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade with verified identity → send `connected`
//! 2. Client sends events → dispatch → ack + broadcast
//! 3. Close/transport error → drop from all boards, `user-left` per board

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::{ClientEvent, ServerEvent};
use crate::services::board;
use crate::services::token::SessionIdentity;
use crate::state::AppState;

/// Outbound queue depth per connection. Peers that fall further behind than
/// this miss events (at-most-once delivery).
const CLIENT_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// HANDSHAKE
// =============================================================================

/// Pull the bearer credential from the auth query field or the
/// `Authorization` header, stripping an optional `Bearer ` prefix.
fn extract_credential(params: &HashMap<String, String>, headers: &HeaderMap) -> Option<String> {
    let raw = params
        .get("token")
        .map(String::as_str)
        .or_else(|| headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()))?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    if token.is_empty() {
        return None;
    }
    Some(token.to_owned())
}

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = extract_credential(&params, &headers) else {
        warn!("ws: connection refused, no credential");
        return (StatusCode::UNAUTHORIZED, "token required").into_response();
    };

    let identity = match state.tokens.verify(&token) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "ws: connection refused, credential rejected");
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, identity))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, identity: SessionIdentity) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for events relayed from board peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(CLIENT_QUEUE_CAPACITY);

    let welcome = ServerEvent::Connected {
        client_id,
        user_id: identity.user_id,
        email: identity.email.clone(),
        name: identity.name.clone(),
    };
    if send_event(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, user_id = %identity.user_id, email = %identity.email, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let ack = process_event(&state, client_id, &identity, &client_tx, &text).await;
                        if send_event(&mut socket, &ack).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect_cleanup(&state, client_id, &identity).await;
    info!(%client_id, "ws: client disconnected");
}

/// Remove the connection from every board it joined and tell the remaining
/// members. Idempotent: a connection that joined nothing notifies no one.
async fn disconnect_cleanup(state: &AppState, client_id: Uuid, identity: &SessionIdentity) {
    let left = ServerEvent::UserLeft { user_id: identity.user_id, email: identity.email.clone() };
    for board_id in state.registry.drop_connection(client_id).await {
        state.registry.broadcast(board_id, &left, None).await;
    }
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// Parse one inbound text message, apply it, and return the acknowledgement
/// for the sender. Broadcasts to peers happen in here; the caller only ships
/// the ack back over the socket. Separated from the transport so tests can
/// drive the relay without a live websocket.
async fn process_event(
    state: &AppState,
    client_id: Uuid,
    identity: &SessionIdentity,
    client_tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) -> ServerEvent {
    // Any malformed inbound — bad JSON, unknown event, missing field — is
    // answered with a failed ack and nothing is broadcast.
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound event");
            return ServerEvent::nack(format!("invalid event: {e}"));
        }
    };

    let board_id = event.board_id();
    if !event.is_ephemeral() {
        info!(%client_id, user_id = %identity.user_id, event = event.name(), %board_id, "ws: recv event");
    }

    match event {
        ClientEvent::JoinBoard { board_id } => {
            match board::has_access(&state.pool, board_id, identity.user_id).await {
                Ok(true) => {}
                Ok(false) => return ServerEvent::nack(format!("no access to board {board_id}")),
                Err(e) => {
                    warn!(%client_id, error = %e, "ws: join access check failed");
                    return ServerEvent::nack("access check failed");
                }
            }

            state.registry.join(board_id, client_id, client_tx.clone()).await;
            let joined = ServerEvent::UserJoined {
                user_id: identity.user_id,
                email: identity.email.clone(),
            };
            state.registry.broadcast(board_id, &joined, Some(client_id)).await;
            ServerEvent::ack_with(format!("Joined board {board_id}"))
        }
        ClientEvent::LeaveBoard { board_id } => {
            state.registry.leave(board_id, client_id).await;
            let left = ServerEvent::UserLeft {
                user_id: identity.user_id,
                email: identity.email.clone(),
            };
            state.registry.broadcast(board_id, &left, Some(client_id)).await;
            ServerEvent::ack_with(format!("Left board {board_id}"))
        }
        ClientEvent::PostitCreated { board_id, postit } => {
            let broadcast = ServerEvent::PostitCreated { postit, user_id: identity.user_id };
            state.registry.broadcast(board_id, &broadcast, Some(client_id)).await;
            ServerEvent::ack()
        }
        ClientEvent::PostitUpdated { board_id, postit_id, updates } => {
            let broadcast = ServerEvent::PostitUpdated { postit_id, updates, user_id: identity.user_id };
            state.registry.broadcast(board_id, &broadcast, Some(client_id)).await;
            ServerEvent::ack()
        }
        ClientEvent::PostitDeleted { board_id, postit_id } => {
            let broadcast = ServerEvent::PostitDeleted { postit_id, user_id: identity.user_id };
            state.registry.broadcast(board_id, &broadcast, Some(client_id)).await;
            ServerEvent::ack()
        }
        ClientEvent::PostitMoving { board_id, postit_id, x, y } => {
            let broadcast = ServerEvent::PostitMoving { postit_id, x, y, user_id: identity.user_id };
            state.registry.broadcast(board_id, &broadcast, Some(client_id)).await;
            ServerEvent::ack()
        }
        ClientEvent::CursorMove { board_id, x, y } => {
            let broadcast = ServerEvent::CursorMove {
                user_id: identity.user_id,
                email: identity.email.clone(),
                x,
                y,
            };
            state.registry.broadcast(board_id, &broadcast, Some(client_id)).await;
            ServerEvent::ack()
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
