//! JSON text-frame encoding/decoding for relay messages.
//!
//! Every frame is a single UTF-8 JSON object with a string `type` field
//! and type-specific fields:
//!
//! ```text
//! Inbound (client → relay)
//! ------------------------
//! {"type":"join",           "profile": <any>}
//! {"type":"signal",         "targetId": <string>, "data": <any>}
//! {"type":"chat_broadcast", "message": <any>}
//! {"type":"ai_request",     "text": <string>}
//!
//! Outbound (relay → client)
//! -------------------------
//! {"type":"presence_update", "users": [<profile>, ...]}
//! {"type":"signal",          "from": <string>, "data": <any>}
//! {"type":"new_message",     "message": <any>}
//! {"type":"typing",          "status": <bool>}
//! {"type":"ai_response",     "text": <string>, "senderId": <string>}
//! ```
//!
//! Field names are the compatibility surface with existing clients and
//! must not change. Unknown extra fields on inbound frames are ignored;
//! `profile`, `data` and `message` default to `null` when absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use relay_core::{
    AiRequest, AiResponse, ChatBroadcast, ClientId, InboundMessage, Join, NewMessage,
    OutboundMessage, PresenceUpdate, Profile, SignalRelay, SignalRequest, Typing,
};

use crate::wire_types::{WireInboundType, WireOutboundType, TYPE_FIELD};

/// Errors that can arise when encoding/decoding a text frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not valid JSON at all.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// No `type` field, or it is not a string.
    #[error("missing or non-string `type` field")]
    MissingType,

    /// `type` names a message we do not know.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// Known `type`, but the payload fields have the wrong shape.
    #[error("malformed `{kind}` message: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// INBOUND: client → relay
// ============================================================================

#[derive(Deserialize)]
struct JoinFrame {
    #[serde(default)]
    profile: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignalFrame {
    target_id: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct ChatBroadcastFrame {
    #[serde(default)]
    message: Value,
}

#[derive(Deserialize)]
struct AiRequestFrame {
    text: String,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundFrameRef<'a> {
    Join {
        profile: &'a Profile,
    },
    Signal {
        #[serde(rename = "targetId")]
        target_id: &'a ClientId,
        data: &'a Value,
    },
    ChatBroadcast {
        message: &'a Value,
    },
    AiRequest {
        text: &'a str,
    },
}

/// Decode a single inbound text frame.
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;

    let wire_type = {
        let tag = read_tag(&value)?;
        WireInboundType::from_tag(tag).ok_or_else(|| ProtocolError::UnknownType(tag.to_string()))?
    };

    match wire_type {
        WireInboundType::Join => {
            let frame: JoinFrame = payload(wire_type.as_tag(), value)?;
            Ok(InboundMessage::Join(Join {
                profile: Profile::new(frame.profile),
            }))
        }
        WireInboundType::Signal => {
            let frame: SignalFrame = payload(wire_type.as_tag(), value)?;
            Ok(InboundMessage::Signal(SignalRequest {
                target_id: ClientId::new(frame.target_id),
                data: frame.data,
            }))
        }
        WireInboundType::ChatBroadcast => {
            let frame: ChatBroadcastFrame = payload(wire_type.as_tag(), value)?;
            Ok(InboundMessage::ChatBroadcast(ChatBroadcast {
                message: frame.message,
            }))
        }
        WireInboundType::AiRequest => {
            let frame: AiRequestFrame = payload(wire_type.as_tag(), value)?;
            Ok(InboundMessage::AiRequest(AiRequest { text: frame.text }))
        }
    }
}

/// Encode a single inbound message as a text frame (client side).
pub fn encode_inbound(msg: &InboundMessage) -> Result<String, ProtocolError> {
    let frame = match msg {
        InboundMessage::Join(j) => InboundFrameRef::Join {
            profile: &j.profile,
        },
        InboundMessage::Signal(s) => InboundFrameRef::Signal {
            target_id: &s.target_id,
            data: &s.data,
        },
        InboundMessage::ChatBroadcast(c) => InboundFrameRef::ChatBroadcast {
            message: &c.message,
        },
        InboundMessage::AiRequest(a) => InboundFrameRef::AiRequest { text: &a.text },
    };

    Ok(serde_json::to_string(&frame)?)
}

// ============================================================================
// OUTBOUND: relay → client
// ============================================================================

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundFrameRef<'a> {
    PresenceUpdate {
        users: &'a [Profile],
    },
    Signal {
        from: &'a ClientId,
        data: &'a Value,
    },
    NewMessage {
        message: &'a Value,
    },
    Typing {
        status: bool,
    },
    AiResponse {
        text: &'a str,
        #[serde(rename = "senderId")]
        sender_id: &'a str,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutboundFrame {
    PresenceUpdate {
        users: Vec<Profile>,
    },
    Signal {
        from: ClientId,
        data: Value,
    },
    NewMessage {
        message: Value,
    },
    Typing {
        status: bool,
    },
    AiResponse {
        text: String,
        #[serde(rename = "senderId")]
        sender_id: String,
    },
}

/// Encode a single outbound message as a text frame.
pub fn encode_outbound(msg: &OutboundMessage) -> Result<String, ProtocolError> {
    let frame = match msg {
        OutboundMessage::PresenceUpdate(p) => OutboundFrameRef::PresenceUpdate { users: &p.users },
        OutboundMessage::Signal(s) => OutboundFrameRef::Signal {
            from: &s.from,
            data: &s.data,
        },
        OutboundMessage::NewMessage(n) => OutboundFrameRef::NewMessage {
            message: &n.message,
        },
        OutboundMessage::Typing(t) => OutboundFrameRef::Typing { status: t.status },
        OutboundMessage::AiResponse(a) => OutboundFrameRef::AiResponse {
            text: &a.text,
            sender_id: &a.sender_id,
        },
    };

    Ok(serde_json::to_string(&frame)?)
}

/// Decode a single outbound text frame (client side).
///
/// Stricter than [`decode_inbound`]: every defined field must be present.
pub fn decode_outbound(text: &str) -> Result<OutboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;

    let wire_type = {
        let tag = read_tag(&value)?;
        WireOutboundType::from_tag(tag)
            .ok_or_else(|| ProtocolError::UnknownType(tag.to_string()))?
    };

    let frame: OutboundFrame = payload(wire_type.as_tag(), value)?;

    Ok(match frame {
        OutboundFrame::PresenceUpdate { users } => {
            OutboundMessage::PresenceUpdate(PresenceUpdate { users })
        }
        OutboundFrame::Signal { from, data } => OutboundMessage::Signal(SignalRelay { from, data }),
        OutboundFrame::NewMessage { message } => OutboundMessage::NewMessage(NewMessage { message }),
        OutboundFrame::Typing { status } => OutboundMessage::Typing(Typing { status }),
        OutboundFrame::AiResponse { text, sender_id } => {
            OutboundMessage::AiResponse(AiResponse { text, sender_id })
        }
    })
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn read_tag(value: &Value) -> Result<&str, ProtocolError> {
    value
        .as_object()
        .ok_or(ProtocolError::NotAnObject)?
        .get(TYPE_FIELD)
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)
}

fn payload<T: DeserializeOwned>(kind: &'static str, value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::Shape { kind, source })
}
