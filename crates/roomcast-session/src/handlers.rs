//! Player-scoped request handlers.
//!
//! Each handler decodes its payload, applies the request, and answers with
//! a response paired to the request (same client id and serial, kind
//! `request + 1`). Application failures are result codes in the response;
//! an `Err` here means the request couldn't be read or answered at all.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use roomcast_protocol::{
    Codec, CreateRoomRequest, CreateRoomResponse, Envelope,
    GetRoomListRequest, GetRoomListResponse, HandlerTable, JoinRoomRequest,
    JoinRoomResponse, JsonCodec, LeaveRoomRequest, LeaveRoomResponse,
    LoginRequest, LoginResponse, MessageKind, MoveRequest, MoveResponse,
    PlayerId, Position, ResultCode, RoomId,
};
use roomcast_room::{JoinOutcome, Mailbox, MemberProfile, RoomError, RoomHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{PlayerConfig, Registry, SessionError};

/// The future a [`PlayerHandler`] returns.
pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), SessionError>> + Send + 'a>>;

/// A player-scoped handler. Borrows the player's state for the duration of
/// one request.
pub type PlayerHandler =
    for<'a> fn(&'a mut PlayerContext, Envelope) -> HandlerFuture<'a>;

/// Message kind → handler table for players.
pub type PlayerHandlers = HandlerTable<MessageKind, PlayerHandler>;

/// The standard table: every request kind the server answers.
pub fn player_handlers() -> PlayerHandlers {
    let mut table = PlayerHandlers::new();
    table.register(MessageKind::LoginRequest, login);
    table.register(MessageKind::GetRoomListRequest, get_room_list);
    table.register(MessageKind::CreateRoomRequest, create_room);
    table.register(MessageKind::JoinRoomRequest, join_room);
    table.register(MessageKind::MoveRequest, move_player);
    table.register(MessageKind::LeaveRoomRequest, leave_room);
    table
}

/// A player's own state, owned by its dispatcher task.
pub struct PlayerContext {
    id: PlayerId,
    name: String,
    position: Position,
    /// Set only after the room approved a join.
    room: Option<RoomId>,
    /// Rooms that may still list this player although `room` doesn't name
    /// them: a join or leave whose answer never arrived, and whose
    /// follow-up Leave couldn't be queued either.
    unconfirmed: Vec<RoomId>,
    outbox: Mailbox<Envelope>,
    registry: Arc<Registry>,
    config: PlayerConfig,
    codec: JsonCodec,
}

impl PlayerContext {
    pub fn new(
        id: PlayerId,
        outbox: Mailbox<Envelope>,
        registry: Arc<Registry>,
        config: PlayerConfig,
    ) -> Self {
        Self {
            id,
            name: String::new(),
            position: Position::default(),
            room: None,
            unconfirmed: Vec::new(),
            outbox,
            registry,
            config,
            codec: JsonCodec,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The room this player currently belongs to.
    pub fn room(&self) -> Option<RoomId> {
        self.room
    }

    /// Every room that may hold this player: the confirmed one first, then
    /// any still unsettled.
    pub fn memberships(&self) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self.room.into_iter().collect();
        for id in &self.unconfirmed {
            if !rooms.contains(id) {
                rooms.push(*id);
            }
        }
        rooms
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Decodes the payload carried by `request`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        request: &Envelope,
    ) -> Result<T, SessionError> {
        Ok(self.codec.decode(&request.data)?)
    }

    /// Sends `payload` as the response to `request`.
    pub fn respond<T: Serialize>(
        &self,
        request: &Envelope,
        payload: &T,
    ) -> Result<(), SessionError> {
        let data = self.codec.encode(payload)?;
        let response = Envelope::response_to(request, data)?;
        self.outbox.offer(response)?;
        Ok(())
    }

    fn profile(&self) -> MemberProfile {
        MemberProfile {
            name: self.name.clone(),
            position: self.position,
        }
    }

    /// Joins `room` through its event loop and records the membership the
    /// room reported.
    ///
    /// If the room's answer doesn't arrive in time, the join may still be
    /// applied later; a Leave is queued behind it so the room ends up
    /// without this player either way.
    async fn enter(&mut self, room: &RoomHandle) -> Result<JoinOutcome, RoomError> {
        self.settle();
        let result = room
            .join(self.id.clone(), self.profile(), self.config.reply_timeout)
            .await;
        match &result {
            Ok(outcome) if outcome.ret == ResultCode::Ok => {
                self.room = Some(room.id());
                self.unconfirmed.retain(|id| *id != room.id());
            }
            Ok(_) => {}
            Err(RoomError::Timeout(_)) => self.abandon(room),
            Err(_) => {}
        }
        result
    }

    /// Queues a Leave for a membership whose state is unknown.
    fn abandon(&mut self, room: &RoomHandle) {
        if let Err(e) = room.send_leave(self.id.clone()) {
            tracing::warn!(
                player_id = %self.id,
                room_id = %room.id(),
                error = %e,
                "could not queue leave, membership unsettled"
            );
            if !self.unconfirmed.contains(&room.id()) {
                self.unconfirmed.push(room.id());
            }
        }
    }

    /// Retries the Leave for every unsettled room.
    fn settle(&mut self) {
        let registry = Arc::clone(&self.registry);
        let id = self.id.clone();
        self.unconfirmed.retain(|room_id| match registry.room(*room_id) {
            Some(room) => room.send_leave(id.clone()).is_err(),
            None => false,
        });
    }
}

fn login(ctx: &mut PlayerContext, req: Envelope) -> HandlerFuture<'_> {
    Box::pin(async move {
        let body: LoginRequest = ctx.decode(&req)?;
        ctx.name = body.player_name;
        tracing::info!(player_id = %ctx.id, name = %ctx.name, "player logged in");

        // The room keeps its own copy of the profile.
        if let Some(room) = ctx.room.and_then(|id| ctx.registry.room(id)) {
            if let Err(e) = room.send_move(ctx.id.clone(), ctx.profile()) {
                tracing::debug!(player_id = %ctx.id, error = %e, "rename not forwarded");
            }
        }

        ctx.respond(
            &req,
            &LoginResponse {
                player_id: ctx.id.clone(),
            },
        )
    })
}

fn get_room_list(ctx: &mut PlayerContext, req: Envelope) -> HandlerFuture<'_> {
    Box::pin(async move {
        let _: GetRoomListRequest = ctx.decode(&req)?;
        let rooms = ctx
            .registry
            .rooms()
            .iter()
            .map(|room| room.header())
            .collect();

        ctx.respond(
            &req,
            &GetRoomListResponse {
                ret: ResultCode::Ok,
                rooms,
            },
        )
    })
}

fn create_room(ctx: &mut PlayerContext, req: Envelope) -> HandlerFuture<'_> {
    Box::pin(async move {
        let body: CreateRoomRequest = ctx.decode(&req)?;
        if ctx.room.is_some() {
            return ctx.respond(
                &req,
                &CreateRoomResponse {
                    ret: ResultCode::PlayerAlreadyInRoom,
                    room: None,
                },
            );
        }

        let room = ctx.registry.create_room(body.name);
        let created = room.header();

        // The creator goes in through the room's own event loop like
        // everyone else.
        let ret = match ctx.enter(&room).await {
            Ok(outcome) => outcome.ret,
            Err(e) => {
                tracing::warn!(
                    player_id = %ctx.id,
                    room_id = %room.id(),
                    error = %e,
                    "creator could not join new room"
                );
                ResultCode::RoomNotFound
            }
        };

        ctx.respond(
            &req,
            &CreateRoomResponse {
                ret,
                room: Some(created),
            },
        )
    })
}

fn join_room(ctx: &mut PlayerContext, req: Envelope) -> HandlerFuture<'_> {
    Box::pin(async move {
        let body: JoinRoomRequest = ctx.decode(&req)?;
        if ctx.room.is_some() {
            return ctx.respond(
                &req,
                &JoinRoomResponse {
                    ret: ResultCode::PlayerAlreadyInRoom,
                    room: None,
                },
            );
        }

        let not_found = JoinRoomResponse {
            ret: ResultCode::RoomNotFound,
            room: None,
        };
        let Some(room) = ctx.registry.room(body.room_id) else {
            tracing::debug!(
                player_id = %ctx.id,
                room_id = %body.room_id,
                "join for unknown room"
            );
            return ctx.respond(&req, &not_found);
        };

        match ctx.enter(&room).await {
            Ok(outcome) => ctx.respond(
                &req,
                &JoinRoomResponse {
                    ret: outcome.ret,
                    room: Some(outcome.room),
                },
            ),
            Err(e) => {
                tracing::warn!(
                    player_id = %ctx.id,
                    room_id = %room.id(),
                    error = %e,
                    "join failed"
                );
                ctx.respond(&req, &not_found)
            }
        }
    })
}

fn move_player(ctx: &mut PlayerContext, req: Envelope) -> HandlerFuture<'_> {
    Box::pin(async move {
        let body: MoveRequest = ctx.decode(&req)?;
        ctx.position = body.position;

        let room = ctx.room.and_then(|id| ctx.registry.room(id));
        let Some(room) = room else {
            return ctx.respond(
                &req,
                &MoveResponse {
                    ret: ResultCode::RoomNotFound,
                    room: None,
                },
            );
        };

        // Best effort: a busy room drops the update, the next move
        // supersedes it anyway.
        if let Err(e) = room.send_move(ctx.id.clone(), ctx.profile()) {
            tracing::debug!(player_id = %ctx.id, error = %e, "move not forwarded");
        }

        ctx.respond(
            &req,
            &MoveResponse {
                ret: ResultCode::Ok,
                room: Some(room.header()),
            },
        )
    })
}

fn leave_room(ctx: &mut PlayerContext, req: Envelope) -> HandlerFuture<'_> {
    Box::pin(async move {
        let _: LeaveRoomRequest = ctx.decode(&req)?;

        let not_found = LeaveRoomResponse {
            ret: ResultCode::RoomNotFound,
            room: None,
        };
        let Some(room_id) = ctx.room.take() else {
            return ctx.respond(&req, &not_found);
        };
        let Some(room) = ctx.registry.room(room_id) else {
            return ctx.respond(&req, &not_found);
        };

        match room.leave(ctx.id.clone(), ctx.config.reply_timeout).await {
            Ok(outcome) => ctx.respond(
                &req,
                &LeaveRoomResponse {
                    ret: outcome.ret,
                    room: Some(outcome.room),
                },
            ),
            Err(e) => {
                tracing::warn!(
                    player_id = %ctx.id,
                    %room_id,
                    error = %e,
                    "leave failed"
                );
                // A Leave is idempotent, so queue one more in case the
                // first never reached the room.
                if matches!(e, RoomError::Timeout(_)) {
                    ctx.abandon(&room);
                }
                ctx.respond(&req, &not_found)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_handlers_cover_every_request_kind() {
        let table = player_handlers();
        for kind in [
            MessageKind::LoginRequest,
            MessageKind::GetRoomListRequest,
            MessageKind::CreateRoomRequest,
            MessageKind::JoinRoomRequest,
            MessageKind::MoveRequest,
            MessageKind::LeaveRoomRequest,
        ] {
            assert!(table.contains(&kind), "{kind} should have a handler");
        }
        assert!(!table.contains(&MessageKind::RoomStateNotification));
        assert_eq!(table.len(), 6);
    }
}
