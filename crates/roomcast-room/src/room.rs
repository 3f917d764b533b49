//! Room actor: an isolated Tokio task that owns one room's membership.
//!
//! All membership and position changes for a room happen inside its event
//! loop, one event at a time, in mailbox arrival order. Nothing outside the
//! loop touches `members`, so no lock guards it.
//!
//! The loop looks up each event's handler in an [`EventTable`]; kinds
//! without a handler are drained and ignored.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use roomcast_protocol::{
    Codec, Envelope, HandlerTable, JsonCodec, MessageKind, PlayerId,
    PlayerInfo, Position, ResultCode, RoomId, RoomSnapshot,
    RoomStateNotification,
};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    EventBody, EventKind, JoinOutcome, LeaveOutcome, Mailbox, MemberProfile,
    RoomConfig, RoomError, RoomEvent,
};

/// Resolves a player identity to that player's outbound mailbox.
///
/// A room never holds player state it didn't receive through an event;
/// this is the one lookup it performs, at join time.
pub trait PlayerDirectory: Send + Sync + 'static {
    fn outbox(&self, player: &PlayerId) -> Option<Mailbox<Envelope>>;
}

/// A room-scoped handler. Runs inside the room's event loop.
pub type EventHandler = fn(&mut RoomActor, RoomEvent);

/// Event kind → handler table for rooms.
pub type EventTable = HandlerTable<EventKind, EventHandler>;

/// The standard table: Join, Leave, Chat and Move.
pub fn room_handlers() -> EventTable {
    let mut table = EventTable::new();
    table.register(EventKind::Join, on_join);
    table.register(EventKind::Leave, on_leave);
    table.register(EventKind::Chat, on_chat);
    table.register(EventKind::Move, on_move);
    table
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor.
///
/// Cheap to clone. Carries the room's immutable identity so listings don't
/// need a round trip through the actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    name: Arc<str>,
    events: mpsc::Sender<RoomEvent>,
    cancel: CancellationToken,
}

impl RoomHandle {
    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The room's identity with an empty member list.
    pub fn header(&self) -> RoomSnapshot {
        RoomSnapshot::header(self.id, self.name.as_ref())
    }

    /// Asks the room to admit `player` and waits for its answer.
    ///
    /// Both the enqueue and the reply are bounded by `timeout`.
    pub async fn join(
        &self,
        player: PlayerId,
        profile: MemberProfile,
        timeout: Duration,
    ) -> Result<JoinOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let event = RoomEvent::join(player, profile, Some(reply_tx));
        self.request(event, reply_rx, timeout).await
    }

    /// Asks the room to remove `player` and waits until it has, so the
    /// departure broadcast is already queued when this returns.
    pub async fn leave(
        &self,
        player: PlayerId,
        timeout: Duration,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request(RoomEvent::leave(player, Some(reply_tx)), reply_rx, timeout)
            .await
    }

    /// Forwards the member's current profile without waiting (best effort).
    pub fn send_move(
        &self,
        player: PlayerId,
        profile: MemberProfile,
    ) -> Result<(), RoomError> {
        self.offer(RoomEvent::moved(player, profile))
    }

    /// Enqueues a Leave without waiting for the room's answer.
    ///
    /// Used to settle a membership whose outcome the caller never saw.
    pub fn send_leave(&self, player: PlayerId) -> Result<(), RoomError> {
        self.offer(RoomEvent::leave(player, None))
    }

    /// Forwards a chat line without waiting (best effort).
    pub fn send_chat(
        &self,
        player: PlayerId,
        text: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.offer(RoomEvent::chat(player, text))
    }

    /// Signals the room's event loop to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn offer(&self, event: RoomEvent) -> Result<(), RoomError> {
        self.events.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!(
                    room_id = %self.id,
                    "room mailbox full, dropping event"
                );
                RoomError::Busy(self.id)
            }
            mpsc::error::TrySendError::Closed(_) => RoomError::Unavailable(self.id),
        })
    }

    async fn request<R>(
        &self,
        event: RoomEvent,
        reply: oneshot::Receiver<R>,
        timeout: Duration,
    ) -> Result<R, RoomError> {
        tokio::time::timeout(timeout, self.events.send(event))
            .await
            .map_err(|_| RoomError::Timeout(self.id))?
            .map_err(|_| RoomError::Unavailable(self.id))?;

        tokio::time::timeout(timeout, reply)
            .await
            .map_err(|_| RoomError::Timeout(self.id))?
            .map_err(|_| RoomError::Unavailable(self.id))
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

struct Member {
    name: String,
    position: Position,
    outbox: Mailbox<Envelope>,
}

/// The room's state, owned by its event loop task.
pub struct RoomActor {
    id: RoomId,
    name: Arc<str>,
    /// Keyed by player id, which also fixes snapshot member order.
    members: BTreeMap<PlayerId, Member>,
    events: mpsc::Receiver<RoomEvent>,
    cancel: CancellationToken,
    directory: Arc<dyn PlayerDirectory>,
    handlers: Arc<EventTable>,
    codec: JsonCodec,
}

impl RoomActor {
    /// Creates a room actor and the handle that talks to it.
    ///
    /// The actor does nothing until [`run`](Self::run) is awaited; the
    /// caller decides where to spawn it.
    pub fn new(
        id: RoomId,
        name: impl Into<Arc<str>>,
        config: &RoomConfig,
        directory: Arc<dyn PlayerDirectory>,
        handlers: Arc<EventTable>,
    ) -> (RoomHandle, Self) {
        let (tx, rx) = mpsc::channel(config.event_capacity.max(1));
        let name = name.into();
        let cancel = CancellationToken::new();

        let handle = RoomHandle {
            id,
            name: Arc::clone(&name),
            events: tx,
            cancel: cancel.clone(),
        };
        let actor = Self {
            id,
            name,
            members: BTreeMap::new(),
            events: rx,
            cancel,
            directory,
            handlers,
            codec: JsonCodec,
        };
        (handle, actor)
    }

    /// Runs the event loop until cancelled or every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(room_id = %self.id, name = %self.name, "room actor started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(room_id = %self.id, "room cancelled");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        self.events.close();
        tracing::info!(room_id = %self.id, "room actor stopped");
    }

    /// Applies one event through the handler table.
    pub fn handle(&mut self, event: RoomEvent) {
        let kind = event.kind();
        match self.handlers.get(&kind).copied() {
            Some(handler) => handler(self, event),
            None => {
                tracing::trace!(room_id = %self.id, ?kind, "no handler for event");
            }
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.members.contains_key(player)
    }

    pub fn member_ids(&self) -> Vec<PlayerId> {
        self.members.keys().cloned().collect()
    }

    pub fn position_of(&self, player: &PlayerId) -> Option<Position> {
        self.members.get(player).map(|m| m.position)
    }

    /// Rebuilds the room view from scratch.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            name: self.name.to_string(),
            players: self
                .members
                .iter()
                .map(|(id, m)| PlayerInfo {
                    id: id.clone(),
                    name: m.name.clone(),
                    position: m.position,
                })
                .collect(),
        }
    }

    /// Enqueues `msg` on every member's outbound mailbox except `exclude`.
    ///
    /// Delivery is best effort; returns how many mailboxes accepted it.
    pub fn broadcast(&self, exclude: &PlayerId, msg: &Envelope) -> usize {
        let mut delivered = 0;
        for (id, member) in &self.members {
            if id == exclude {
                continue;
            }
            match member.outbox.offer(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        room_id = %self.id,
                        player_id = %id,
                        error = %e,
                        "broadcast delivery failed"
                    );
                }
            }
        }
        delivered
    }

    /// Broadcasts a fresh [`RoomStateNotification`] to everyone but `exclude`.
    fn notify_state(&self, exclude: &PlayerId) {
        let notification = RoomStateNotification {
            room: self.snapshot(),
        };
        match self.codec.encode(&notification) {
            Ok(data) => {
                let msg = Envelope::notification(MessageKind::RoomStateNotification, data);
                self.broadcast(exclude, &msg);
            }
            Err(e) => {
                tracing::error!(room_id = %self.id, error = %e, "failed to encode room state");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Standard event handlers
// ---------------------------------------------------------------------------

fn on_join(room: &mut RoomActor, event: RoomEvent) {
    let RoomEvent { player, body } = event;
    let EventBody::Join { profile, reply } = body else {
        return;
    };

    // The requester stopped waiting; it already reported the join as failed.
    if reply.as_ref().is_some_and(|r| r.is_closed()) {
        tracing::debug!(
            room_id = %room.id,
            player_id = %player,
            "join abandoned by requester, skipping"
        );
        return;
    }

    if room.members.contains_key(&player) {
        reply_join(room, reply, ResultCode::PlayerAlreadyInRoom);
        return;
    }
    let Some(outbox) = room.directory.outbox(&player) else {
        tracing::debug!(
            room_id = %room.id,
            player_id = %player,
            "joining player not registered"
        );
        reply_join(room, reply, ResultCode::PlayerNotFound);
        return;
    };

    room.members.insert(
        player.clone(),
        Member {
            name: profile.name,
            position: profile.position,
            outbox,
        },
    );

    // Membership only sticks once the requester has the answer.
    if !reply_join(room, reply, ResultCode::Ok) {
        room.members.remove(&player);
        tracing::debug!(
            room_id = %room.id,
            player_id = %player,
            "join reply undeliverable, rolled back"
        );
        return;
    }

    tracing::info!(
        room_id = %room.id,
        player_id = %player,
        players = room.members.len(),
        "player joined"
    );
    room.notify_state(&player);
}

/// Answers a Join. Returns `false` if the requester is gone.
fn reply_join(
    room: &RoomActor,
    reply: Option<oneshot::Sender<JoinOutcome>>,
    ret: ResultCode,
) -> bool {
    match reply {
        Some(reply) => reply
            .send(JoinOutcome {
                ret,
                room: room.snapshot(),
            })
            .is_ok(),
        None => true,
    }
}

fn on_leave(room: &mut RoomActor, event: RoomEvent) {
    let RoomEvent { player, body } = event;
    let EventBody::Leave { reply } = body else {
        return;
    };

    // Applied even when the requester stopped waiting: leaving is the state
    // both sides converge on.
    let ret = if room.members.remove(&player).is_some() {
        tracing::info!(
            room_id = %room.id,
            player_id = %player,
            players = room.members.len(),
            "player left"
        );
        room.notify_state(&player);
        ResultCode::Ok
    } else {
        ResultCode::PlayerNotFound
    };

    if let Some(reply) = reply {
        let _ = reply.send(LeaveOutcome {
            ret,
            room: room.snapshot(),
        });
    }
}

fn on_chat(room: &mut RoomActor, event: RoomEvent) {
    if let EventBody::Chat { text } = &event.body {
        tracing::trace!(
            room_id = %room.id,
            player_id = %event.player,
            len = text.len(),
            "chat event"
        );
    }
}

fn on_move(room: &mut RoomActor, event: RoomEvent) {
    let RoomEvent { player, body } = event;
    let EventBody::Move { profile } = body else {
        return;
    };

    let Some(member) = room.members.get_mut(&player) else {
        tracing::debug!(
            room_id = %room.id,
            player_id = %player,
            "move from non-member, ignoring"
        );
        return;
    };
    member.name = profile.name;
    member.position = profile.position;
    tracing::debug!(
        room_id = %room.id,
        player_id = %player,
        position = ?member.position,
        "player moved"
    );
    room.notify_state(&player);
}
