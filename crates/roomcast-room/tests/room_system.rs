//! Integration tests for room actors driven through their handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roomcast_protocol::{
    Codec, Envelope, JsonCodec, MessageKind, PlayerId, Position, ResultCode,
    RoomId, RoomStateNotification,
};
use roomcast_room::{
    mailbox, room_handlers, Mailbox, MemberProfile, PlayerDirectory,
    RoomActor, RoomConfig, RoomError, RoomHandle,
};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(2);

// =========================================================================
// Test directory: players register their outbound mailbox up front.
// =========================================================================

#[derive(Default)]
struct TestDirectory {
    players: Mutex<HashMap<PlayerId, Mailbox<Envelope>>>,
}

impl TestDirectory {
    fn register(&self, id: &str) -> mpsc::Receiver<Envelope> {
        let (mb, rx) = mailbox(format!("{id}/out"), 32);
        self.players.lock().unwrap().insert(PlayerId::from(id), mb);
        rx
    }
}

impl PlayerDirectory for TestDirectory {
    fn outbox(&self, player: &PlayerId) -> Option<Mailbox<Envelope>> {
        self.players.lock().unwrap().get(player).cloned()
    }
}

fn new_room(
    directory: Arc<TestDirectory>,
    config: RoomConfig,
) -> (RoomHandle, RoomActor) {
    RoomActor::new(RoomId(7), "lobby", &config, directory, Arc::new(room_handlers()))
}

fn profile(name: &str) -> MemberProfile {
    MemberProfile {
        name: name.into(),
        position: Position::default(),
    }
}

async fn next_state(rx: &mut mpsc::Receiver<Envelope>) -> RoomStateNotification {
    let env = tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("notification in time")
        .expect("mailbox open");
    assert_eq!(env.id, MessageKind::RoomStateNotification);
    assert_eq!(env.msg_serial_no, -1);
    assert!(env.client_id.is_empty());
    JsonCodec.decode(&env.data).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_and_leave_through_handle() {
    let directory = Arc::new(TestDirectory::default());
    let mut rx_a = directory.register("a");
    let mut rx_b = directory.register("b");

    let (handle, actor) = new_room(Arc::clone(&directory), RoomConfig::default());
    let task = tokio::spawn(actor.run());

    let joined = handle.join(PlayerId::from("a"), profile("Ann"), WAIT).await.unwrap();
    assert_eq!(joined.ret, ResultCode::Ok);
    assert_eq!(joined.room.players.len(), 1);

    let joined = handle.join(PlayerId::from("b"), profile("Bob"), WAIT).await.unwrap();
    assert_eq!(joined.ret, ResultCode::Ok);
    assert_eq!(joined.room.players.len(), 2);

    let state = next_state(&mut rx_a).await;
    assert_eq!(state.room.id, RoomId(7));
    assert_eq!(state.room.players.len(), 2);

    let moved = MemberProfile {
        name: "Bobby".into(),
        position: Position::new(4.0, 5.0, 6.0),
    };
    handle.send_move(PlayerId::from("b"), moved).unwrap();
    let state = next_state(&mut rx_a).await;
    let bob = state.room.players.iter().find(|p| p.name == "Bobby").unwrap();
    assert_eq!(bob.position, Position::new(4.0, 5.0, 6.0));

    let left = handle.leave(PlayerId::from("b"), WAIT).await.unwrap();
    assert_eq!(left.ret, ResultCode::Ok);
    assert_eq!(left.room.players.len(), 1);
    let state = next_state(&mut rx_a).await;
    assert_eq!(state.room.players.len(), 1);

    // b never received anything about its own actions.
    assert!(rx_b.try_recv().is_err());

    handle.cancel();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_join_times_out_on_stalled_room() {
    let directory = Arc::new(TestDirectory::default());
    let _rx = directory.register("a");

    // The actor is never run, so the event is queued but never answered.
    let (handle, _actor) = new_room(directory, RoomConfig::default());
    let err = handle
        .join(PlayerId::from("a"), profile("Ann"), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Timeout(RoomId(7))));
}

#[tokio::test]
async fn test_join_unavailable_when_actor_gone() {
    let directory = Arc::new(TestDirectory::default());
    let (handle, actor) = new_room(directory, RoomConfig::default());
    drop(actor);

    let err = handle
        .join(PlayerId::from("a"), profile("Ann"), WAIT)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Unavailable(_)));
    assert!(matches!(
        handle.leave(PlayerId::from("a"), WAIT).await,
        Err(RoomError::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_send_move_busy_when_mailbox_full() {
    let directory = Arc::new(TestDirectory::default());
    let config = RoomConfig {
        event_capacity: 1,
        ..RoomConfig::default()
    };
    let (handle, _actor) = new_room(directory, config);

    handle.send_move(PlayerId::from("a"), profile("Ann")).unwrap();
    let err = handle.send_chat(PlayerId::from("a"), "hi").unwrap_err();
    assert!(matches!(err, RoomError::Busy(RoomId(7))));
}

#[tokio::test]
async fn test_send_leave_is_applied_without_reply() {
    let directory = Arc::new(TestDirectory::default());
    let mut rx_a = directory.register("a");
    let _rx_b = directory.register("b");
    let (handle, actor) = new_room(directory, RoomConfig::default());
    let task = tokio::spawn(actor.run());

    handle.join(PlayerId::from("a"), profile("Ann"), WAIT).await.unwrap();
    handle.join(PlayerId::from("b"), profile("Bob"), WAIT).await.unwrap();
    next_state(&mut rx_a).await;

    handle.send_leave(PlayerId::from("b")).unwrap();
    let state = next_state(&mut rx_a).await;
    assert_eq!(state.room.players.len(), 1);

    handle.cancel();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_cancelled_room_rejects_requests() {
    let directory = Arc::new(TestDirectory::default());
    let _rx = directory.register("a");
    let (handle, actor) = new_room(directory, RoomConfig::default());
    let task = tokio::spawn(actor.run());

    handle.cancel();
    assert!(handle.is_cancelled());
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();

    let err = handle
        .join(PlayerId::from("a"), profile("Ann"), WAIT)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::Unavailable(_)));
}

#[tokio::test]
async fn test_handle_header_has_identity_and_no_players() {
    let directory = Arc::new(TestDirectory::default());
    let (handle, _actor) = new_room(directory, RoomConfig::default());
    let header = handle.header();
    assert_eq!(header.id, RoomId(7));
    assert_eq!(header.name, "lobby");
    assert!(header.players.is_empty());
    assert_eq!(handle.id(), RoomId(7));
    assert_eq!(handle.name(), "lobby");
}
