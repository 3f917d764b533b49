//! Events consumed by a room's event loop.
//!
//! An event names the player it originates from and carries a payload
//! specific to its kind. Kinds that need an acknowledgment carry an
//! optional `oneshot` reply channel; the room answers on it once the
//! event has been applied.

use roomcast_protocol::{PlayerId, Position, ResultCode, RoomSnapshot};
use tokio::sync::oneshot;

/// Discriminant of a [`RoomEvent`], used as the room handler table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Join,
    Leave,
    Chat,
    Move,
}

/// What the room records about a joining player.
///
/// The player's own task owns its name and position; the room keeps the
/// copy it was handed at join time and replaces it from Move events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberProfile {
    pub name: String,
    pub position: Position,
}

/// Reply to a Join: the outcome plus the room as it stands afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub ret: ResultCode,
    pub room: RoomSnapshot,
}

/// Reply to a Leave.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveOutcome {
    pub ret: ResultCode,
    pub room: RoomSnapshot,
}

/// Kind-specific event payload.
#[derive(Debug)]
pub enum EventBody {
    Join {
        profile: MemberProfile,
        reply: Option<oneshot::Sender<JoinOutcome>>,
    },
    Leave {
        reply: Option<oneshot::Sender<LeaveOutcome>>,
    },
    Chat {
        text: String,
    },
    /// The member's current profile: position and name both.
    Move {
        profile: MemberProfile,
    },
}

/// One event sent into a room's mailbox.
#[derive(Debug)]
pub struct RoomEvent {
    /// The player the event originates from.
    pub player: PlayerId,
    pub body: EventBody,
}

impl RoomEvent {
    pub fn kind(&self) -> EventKind {
        match self.body {
            EventBody::Join { .. } => EventKind::Join,
            EventBody::Leave { .. } => EventKind::Leave,
            EventBody::Chat { .. } => EventKind::Chat,
            EventBody::Move { .. } => EventKind::Move,
        }
    }

    pub fn join(
        player: PlayerId,
        profile: MemberProfile,
        reply: Option<oneshot::Sender<JoinOutcome>>,
    ) -> Self {
        Self {
            player,
            body: EventBody::Join { profile, reply },
        }
    }

    pub fn leave(
        player: PlayerId,
        reply: Option<oneshot::Sender<LeaveOutcome>>,
    ) -> Self {
        Self {
            player,
            body: EventBody::Leave { reply },
        }
    }

    pub fn chat(player: PlayerId, text: impl Into<String>) -> Self {
        Self {
            player,
            body: EventBody::Chat { text: text.into() },
        }
    }

    pub fn moved(player: PlayerId, profile: MemberProfile) -> Self {
        Self {
            player,
            body: EventBody::Move { profile },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_matches_body() {
        let p = PlayerId::from("p");
        let profile = MemberProfile::default();
        assert_eq!(
            RoomEvent::join(p.clone(), profile.clone(), None).kind(),
            EventKind::Join
        );
        assert_eq!(RoomEvent::leave(p.clone(), None).kind(), EventKind::Leave);
        assert_eq!(RoomEvent::chat(p.clone(), "hi").kind(), EventKind::Chat);
        assert_eq!(RoomEvent::moved(p, profile).kind(), EventKind::Move);
    }
}
