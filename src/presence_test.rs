use super::*;
use crate::event::ServerEvent;
use tokio::time::{Duration, timeout};

fn channel() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(8)
}

async fn recv_event(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("event receive timed out")
        .expect("channel closed unexpectedly")
}

async fn assert_no_event(rx: &mut mpsc::Receiver<ServerEvent>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no event"
    );
}

// =============================================================================
// join / leave
// =============================================================================

#[tokio::test]
async fn join_adds_member() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = channel();

    registry.join(board_id, client_id, tx).await;

    assert_eq!(registry.members(board_id).await, vec![client_id]);
}

#[tokio::test]
async fn join_twice_keeps_single_entry() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx_a, _rx_a) = channel();
    let (tx_b, _rx_b) = channel();

    registry.join(board_id, client_id, tx_a).await;
    registry.join(board_id, client_id, tx_b).await;

    assert_eq!(registry.members(board_id).await.len(), 1);
}

#[tokio::test]
async fn rejoin_replaces_sender() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx_old, mut rx_old) = channel();
    let (tx_new, mut rx_new) = channel();

    registry.join(board_id, client_id, tx_old).await;
    registry.join(board_id, client_id, tx_new).await;

    registry.broadcast(board_id, &ServerEvent::ack(), None).await;

    let _ = recv_event(&mut rx_new).await;
    // The replaced sender was dropped by the registry; its channel closes
    // without ever seeing the broadcast.
    assert!(rx_old.recv().await.is_none());
}

#[tokio::test]
async fn leave_removes_member_and_keeps_others() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_a = Uuid::new_v4();
    let client_b = Uuid::new_v4();
    let (tx_a, _rx_a) = channel();
    let (tx_b, _rx_b) = channel();

    registry.join(board_id, client_a, tx_a).await;
    registry.join(board_id, client_b, tx_b).await;
    registry.leave(board_id, client_a).await;

    assert_eq!(registry.members(board_id).await, vec![client_b]);
}

#[tokio::test]
async fn leave_without_join_is_noop() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();

    registry.leave(board_id, Uuid::new_v4()).await;

    assert!(registry.members(board_id).await.is_empty());
}

#[tokio::test]
async fn last_leave_drops_empty_board_entry() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = channel();

    registry.join(board_id, client_id, tx).await;
    registry.leave(board_id, client_id).await;

    let rooms = registry.rooms.read().await;
    assert!(!rooms.contains_key(&board_id));
}

#[tokio::test]
async fn same_user_two_connections_tracked_independently() {
    // Membership is keyed by connection, not user: dropping one tab leaves
    // the other joined.
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let tab_a = Uuid::new_v4();
    let tab_b = Uuid::new_v4();
    let (tx_a, _rx_a) = channel();
    let (tx_b, _rx_b) = channel();

    registry.join(board_id, tab_a, tx_a).await;
    registry.join(board_id, tab_b, tx_b).await;
    registry.drop_connection(tab_a).await;

    assert_eq!(registry.members(board_id).await, vec![tab_b]);
}

// =============================================================================
// drop_connection
// =============================================================================

#[tokio::test]
async fn drop_connection_removes_from_all_boards() {
    let registry = Registry::new();
    let board_a = Uuid::new_v4();
    let board_b = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = channel();

    registry.join(board_a, client_id, tx.clone()).await;
    registry.join(board_b, client_id, tx).await;

    let mut removed = registry.drop_connection(client_id).await;
    removed.sort();
    let mut expected = vec![board_a, board_b];
    expected.sort();

    assert_eq!(removed, expected);
    assert!(registry.members(board_a).await.is_empty());
    assert!(registry.members(board_b).await.is_empty());
}

#[tokio::test]
async fn drop_connection_reports_only_joined_boards() {
    let registry = Registry::new();
    let joined = Uuid::new_v4();
    let other = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let bystander = Uuid::new_v4();
    let (tx, _rx) = channel();
    let (tx_other, _rx_other) = channel();

    registry.join(joined, client_id, tx).await;
    registry.join(other, bystander, tx_other).await;

    let removed = registry.drop_connection(client_id).await;

    assert_eq!(removed, vec![joined]);
    assert_eq!(registry.members(other).await, vec![bystander]);
}

#[tokio::test]
async fn drop_connection_twice_is_idempotent() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = channel();

    registry.join(board_id, client_id, tx).await;
    assert_eq!(registry.drop_connection(client_id).await, vec![board_id]);
    assert!(registry.drop_connection(client_id).await.is_empty());
}

#[tokio::test]
async fn drop_connection_for_unknown_connection_returns_empty() {
    let registry = Registry::new();
    assert!(registry.drop_connection(Uuid::new_v4()).await.is_empty());
}

// =============================================================================
// broadcast
// =============================================================================

#[tokio::test]
async fn broadcast_reaches_all_members_except_excluded() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let client_a = Uuid::new_v4();
    let client_b = Uuid::new_v4();
    let client_c = Uuid::new_v4();
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();
    let (tx_c, mut rx_c) = channel();

    registry.join(board_id, client_a, tx_a).await;
    registry.join(board_id, client_b, tx_b).await;
    registry.join(board_id, client_c, tx_c).await;

    let event = ServerEvent::UserJoined { user_id: Uuid::new_v4(), email: "new@peer".into() };
    registry.broadcast(board_id, &event, Some(client_b)).await;

    assert!(matches!(recv_event(&mut rx_a).await, ServerEvent::UserJoined { .. }));
    assert!(matches!(recv_event(&mut rx_c).await, ServerEvent::UserJoined { .. }));
    assert_no_event(&mut rx_b).await;
}

#[tokio::test]
async fn broadcast_to_unknown_board_is_noop() {
    let registry = Registry::new();
    registry
        .broadcast(Uuid::new_v4(), &ServerEvent::ack(), None)
        .await;
}

#[tokio::test]
async fn broadcast_does_not_cross_boards() {
    let registry = Registry::new();
    let board_a = Uuid::new_v4();
    let board_b = Uuid::new_v4();
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();

    registry.join(board_a, Uuid::new_v4(), tx_a).await;
    registry.join(board_b, Uuid::new_v4(), tx_b).await;

    registry.broadcast(board_a, &ServerEvent::ack(), None).await;

    let _ = recv_event(&mut rx_a).await;
    assert_no_event(&mut rx_b).await;
}

#[tokio::test]
async fn broadcast_preserves_send_order_per_receiver() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(16);

    registry.join(board_id, Uuid::new_v4(), tx).await;

    for i in 0..5_i32 {
        let event = ServerEvent::PostitMoving {
            postit_id: Uuid::nil(),
            x: f64::from(i),
            y: 0.0,
            user_id: Uuid::nil(),
        };
        registry.broadcast(board_id, &event, None).await;
    }

    for i in 0..5_i32 {
        let ServerEvent::PostitMoving { x, .. } = recv_event(&mut rx).await else {
            panic!("expected postit-moving");
        };
        assert!((x - f64::from(i)).abs() < f64::EPSILON);
    }
}

#[tokio::test]
async fn broadcast_skips_member_with_full_queue() {
    let registry = Registry::new();
    let board_id = Uuid::new_v4();
    let (tx_full, mut rx_full) = mpsc::channel(1);
    let (tx_ok, mut rx_ok) = channel();

    registry.join(board_id, Uuid::new_v4(), tx_full).await;
    registry.join(board_id, Uuid::new_v4(), tx_ok).await;

    registry.broadcast(board_id, &ServerEvent::ack(), None).await;
    registry.broadcast(board_id, &ServerEvent::ack(), None).await;

    // The saturated peer got the first event only; the healthy peer got both.
    let _ = recv_event(&mut rx_full).await;
    assert_no_event(&mut rx_full).await;
    let _ = recv_event(&mut rx_ok).await;
    let _ = recv_event(&mut rx_ok).await;
}
