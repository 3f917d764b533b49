//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The codec is used twice per message: once for the [`Envelope`] itself
//! and once for the kind-specific payload carried in `Envelope::data`.
//! Nothing above this module cares which format is in use.
//!
//! [`Envelope`]: crate::Envelope

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec value is shared by every
/// player and room task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use roomcast_protocol::{Codec, Envelope, JsonCodec, MessageKind};
///
/// let codec = JsonCodec;
///
/// let envelope = Envelope {
///     client_id: "c-1".into(),
///     msg_serial_no: 7,
///     id: MessageKind::LoginRequest,
///     data: vec![1, 2, 3],
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{LoginRequest, MoveRequest, PlayerId, Position};

    #[test]
    fn test_json_codec_decodes_payload_with_missing_fields() {
        // Payload fields default when absent, like proto3 scalars.
        let req: MoveRequest = JsonCodec.decode(br#"{"playerId":"p"}"#).unwrap();
        assert_eq!(req.player_id, PlayerId::from("p"));
        assert_eq!(req.position, Position::default());
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<LoginRequest, _> = JsonCodec.decode(b"\x00\x01nope");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
