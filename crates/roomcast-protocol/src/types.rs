//! Core protocol types for Roomcast's wire format.
//!
//! Every type here is serialized onto the wire. Field names are camelCase
//! and every payload field defaults when missing, so a client may omit
//! anything it doesn't care about. Message kinds and result codes travel
//! as their integer values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Derived from the player's connection, so it is an opaque string rather
/// than a number. Serialized as the bare string.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A unique identifier for a room.
///
/// Assigned from a monotonically increasing counter starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The kind of message carried in an [`Envelope`].
///
/// Requests have even values and their response is always `request + 1`.
/// [`MessageKind::RoomStateNotification`] is a server push with no request
/// counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum MessageKind {
    LoginRequest = 0,
    LoginResponse = 1,
    GetRoomListRequest = 2,
    GetRoomListResponse = 3,
    CreateRoomRequest = 4,
    CreateRoomResponse = 5,
    JoinRoomRequest = 6,
    JoinRoomResponse = 7,
    MoveRequest = 8,
    MoveResponse = 9,
    LeaveRoomRequest = 10,
    LeaveRoomResponse = 11,
    RoomStateNotification = 12,
}

impl MessageKind {
    /// Returns the wire value of this kind.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns `true` for client-issued request kinds.
    pub fn is_request(self) -> bool {
        let value = self.as_i32();
        value % 2 == 0 && self != Self::RoomStateNotification
    }

    /// Returns the response kind paired with this request (`request + 1`).
    ///
    /// `None` for kinds that aren't requests.
    pub fn response(self) -> Option<Self> {
        if !self.is_request() {
            return None;
        }
        Self::try_from(self.as_i32() + 1).ok()
    }
}

impl TryFrom<i32> for MessageKind {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::LoginRequest,
            1 => Self::LoginResponse,
            2 => Self::GetRoomListRequest,
            3 => Self::GetRoomListResponse,
            4 => Self::CreateRoomRequest,
            5 => Self::CreateRoomResponse,
            6 => Self::JoinRoomRequest,
            7 => Self::JoinRoomResponse,
            8 => Self::MoveRequest,
            9 => Self::MoveResponse,
            10 => Self::LeaveRoomRequest,
            11 => Self::LeaveRoomResponse,
            12 => Self::RoomStateNotification,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown message kind {other}"
                )));
            }
        })
    }
}

impl From<MessageKind> for i32 {
    fn from(kind: MessageKind) -> Self {
        kind.as_i32()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.as_i32())
    }
}

// ---------------------------------------------------------------------------
// ResultCode
// ---------------------------------------------------------------------------

/// Application-level outcome carried in response payloads.
///
/// Failures like "room not found" are reported here, never as a
/// transport fault.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum ResultCode {
    #[default]
    Ok = 0,
    RoomNotFound = 1,
    /// Defined by the protocol; rooms have no capacity limit, so the server
    /// never produces it.
    RoomFull = 2,
    PlayerNotFound = 3,
    PlayerAlreadyInRoom = 4,
}

impl TryFrom<i32> for ResultCode {
    type Error = ProtocolError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Ok,
            1 => Self::RoomNotFound,
            2 => Self::RoomFull,
            3 => Self::PlayerNotFound,
            4 => Self::PlayerAlreadyInRoom,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown result code {other}"
                )));
            }
        })
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code as i32
    }
}

// ---------------------------------------------------------------------------
// Room snapshot
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One member as seen in a room snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
}

/// A freshly built view of a room and its members.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub players: Vec<PlayerInfo>,
}

impl RoomSnapshot {
    /// A snapshot carrying only the room's identity, with no members.
    pub fn header(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            players: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginResponse {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetRoomListRequest {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetRoomListResponse {
    pub ret: ResultCode,
    pub rooms: Vec<RoomSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateRoomRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateRoomResponse {
    pub ret: ResultCode,
    pub room: Option<RoomSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub player: Option<PlayerInfo>,
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinRoomResponse {
    pub ret: ResultCode,
    pub room: Option<RoomSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveRequest {
    pub player_id: PlayerId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveResponse {
    pub ret: ResultCode,
    pub room: Option<RoomSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveRoomResponse {
    pub ret: ResultCode,
    pub room: Option<RoomSnapshot>,
}

/// Server push sent to room members whenever membership or positions change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomStateNotification {
    pub room: RoomSnapshot,
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// Serial number stamped on server-initiated pushes.
pub const NOTIFICATION_SERIAL_NO: i32 = -1;

/// The top-level message wrapper. Every frame on the wire carries one.
///
/// ```text
/// ┌─────────────────────────────────┐
/// │ clientId: "c-1"                 │  ← who issued the request
/// │ msgSerialNo: 42                 │  ← per-client request counter
/// │ id: 6 (JoinRoomRequest)         │  ← what `data` holds
/// │ ┌─────────────────────────────┐ │
/// │ │ data: [...payload bytes...] │ │  ← kind-specific payload
/// │ └─────────────────────────────┘ │
/// └─────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Client-chosen identity, echoed back on responses.
    #[serde(default)]
    pub client_id: String,

    /// Increases with every client-issued request; responses copy it so
    /// the client can pair them with the pending request.
    #[serde(default)]
    pub msg_serial_no: i32,

    /// The message kind, which determines how `data` is decoded.
    pub id: MessageKind,

    /// Kind-specific payload, opaque at this level.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Envelope {
    /// Builds the response to `request`: kind `request.id + 1`, same
    /// client identity and serial number.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` when `request` isn't a
    /// request kind.
    pub fn response_to(
        request: &Envelope,
        data: Vec<u8>,
    ) -> Result<Self, ProtocolError> {
        let id = request.id.response().ok_or_else(|| {
            ProtocolError::InvalidMessage(format!(
                "{} has no response kind",
                request.id
            ))
        })?;
        Ok(Self {
            client_id: request.client_id.clone(),
            msg_serial_no: request.msg_serial_no,
            id,
            data,
        })
    }

    /// Builds a server-initiated push.
    pub fn notification(id: MessageKind, data: Vec<u8>) -> Self {
        Self {
            client_id: String::new(),
            msg_serial_no: NOTIFICATION_SERIAL_NO,
            id,
            data,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_serializes_as_integer() {
        let json = serde_json::to_string(&MessageKind::JoinRoomRequest).unwrap();
        assert_eq!(json, "6");
    }

    #[test]
    fn test_message_kind_unknown_value_rejected() {
        let result: Result<MessageKind, _> = serde_json::from_str("99");
        assert!(result.is_err());
    }

    #[test]
    fn test_every_request_pairs_with_next_kind() {
        let pairs = [
            (MessageKind::LoginRequest, MessageKind::LoginResponse),
            (MessageKind::GetRoomListRequest, MessageKind::GetRoomListResponse),
            (MessageKind::CreateRoomRequest, MessageKind::CreateRoomResponse),
            (MessageKind::JoinRoomRequest, MessageKind::JoinRoomResponse),
            (MessageKind::MoveRequest, MessageKind::MoveResponse),
            (MessageKind::LeaveRoomRequest, MessageKind::LeaveRoomResponse),
        ];
        for (request, response) in pairs {
            assert_eq!(request.response(), Some(response));
            assert_eq!(response.as_i32(), request.as_i32() + 1);
        }
    }

    #[test]
    fn test_non_requests_have_no_response() {
        assert_eq!(MessageKind::LoginResponse.response(), None);
        assert_eq!(MessageKind::RoomStateNotification.response(), None);
        assert!(!MessageKind::RoomStateNotification.is_request());
    }

    #[test]
    fn test_result_code_values() {
        assert_eq!(i32::from(ResultCode::Ok), 0);
        assert_eq!(i32::from(ResultCode::RoomNotFound), 1);
        assert_eq!(i32::from(ResultCode::RoomFull), 2);
        assert_eq!(i32::from(ResultCode::PlayerNotFound), 3);
        assert_eq!(i32::from(ResultCode::PlayerAlreadyInRoom), 4);
    }

    #[test]
    fn test_envelope_json_uses_camel_case() {
        let env = Envelope {
            client_id: "abc".into(),
            msg_serial_no: 3,
            id: MessageKind::MoveRequest,
            data: vec![1],
        };
        let json: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(json["clientId"], "abc");
        assert_eq!(json["msgSerialNo"], 3);
        assert_eq!(json["id"], 8);
        assert_eq!(json["data"], serde_json::json!([1]));
    }

    #[test]
    fn test_envelope_requires_kind() {
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"clientId":"a","msgSerialNo":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_copies_identity_and_serial() {
        let request = Envelope {
            client_id: "client-9".into(),
            msg_serial_no: 41,
            id: MessageKind::CreateRoomRequest,
            data: vec![9, 9],
        };
        let response = Envelope::response_to(&request, vec![1]).unwrap();
        assert_eq!(response.id, MessageKind::CreateRoomResponse);
        assert_eq!(response.client_id, "client-9");
        assert_eq!(response.msg_serial_no, 41);
        assert_eq!(response.data, vec![1]);
    }

    #[test]
    fn test_response_to_non_request_fails() {
        let push = Envelope::notification(MessageKind::RoomStateNotification, vec![]);
        assert!(Envelope::response_to(&push, vec![]).is_err());
    }

    #[test]
    fn test_notification_uses_sentinel_serial() {
        let push = Envelope::notification(MessageKind::RoomStateNotification, vec![]);
        assert_eq!(push.msg_serial_no, NOTIFICATION_SERIAL_NO);
        assert!(push.client_id.is_empty());
    }

    #[test]
    fn test_join_room_request_field_names() {
        let req: JoinRoomRequest =
            serde_json::from_str(r#"{"roomId": 5}"#).unwrap();
        assert_eq!(req.room_id, RoomId(5));
        assert!(req.player.is_none());
    }

    #[test]
    fn test_room_snapshot_shape() {
        let snap = RoomSnapshot {
            id: RoomId(1),
            name: "alpha".into(),
            players: vec![PlayerInfo {
                id: PlayerId::from("p1"),
                name: "ann".into(),
                position: Position::new(1.0, 2.0, 3.0),
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["players"][0]["id"], "p1");
        assert_eq!(json["players"][0]["position"]["z"], 3.0);
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }
}
