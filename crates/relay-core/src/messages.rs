//! Message types used by the relay.
//!
//! These are **transport-agnostic** logical messages:
//! - [`InboundMessage`]: what a client sends to the relay.
//! - [`OutboundMessage`]: what the relay sends to one or more clients.
//!
//! Note: the JSON text-frame codec lives in the `relay-protocol` crate;
//! this module is purely logical.

use serde_json::Value;

use crate::client_id::ClientId;
use crate::profile::Profile;

/// `senderId` stamped on every `ai_response`.
pub const AI_SENDER_ID: &str = "ai-gemini";

/// Reply text used when a completion fails for any reason.
pub const AI_ERROR_TEXT: &str = "AI connection error...";

/// A request from a client into the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Announce (or update) the sender's profile.
    Join(Join),

    /// Point-to-point signaling payload for another client.
    Signal(SignalRequest),

    /// Chat message for everyone.
    ChatBroadcast(ChatBroadcast),

    /// Prompt for the text-generation collaborator.
    AiRequest(AiRequest),
}

/// An event emitted by the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Full snapshot of every announced profile.
    PresenceUpdate(PresenceUpdate),

    /// Signaling payload relayed from another client.
    Signal(SignalRelay),

    /// Chat message relayed to everyone.
    NewMessage(NewMessage),

    /// Typing indicator (only ever `true` today).
    Typing(Typing),

    /// Reply to an `ai_request`.
    AiResponse(AiResponse),
}

/// `join` (input).
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub profile: Profile,
}

/// `signal` (input).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRequest {
    /// Client the payload is meant for.
    pub target_id: ClientId,

    /// Opaque negotiation payload (SDP offer/answer, ICE candidate, ...).
    pub data: Value,
}

/// `chat_broadcast` (input).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatBroadcast {
    pub message: Value,
}

/// `ai_request` (input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    pub text: String,
}

/// `presence_update` (output).
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceUpdate {
    /// Registry iteration order at the time of the snapshot.
    pub users: Vec<Profile>,
}

/// `signal` (output).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRelay {
    pub from: ClientId,
    pub data: Value,
}

/// `new_message` (output).
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub message: Value,
}

/// `typing` (output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typing {
    pub status: bool,
}

/// `ai_response` (output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub text: String,
    pub sender_id: String,
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl OutboundMessage {
    pub fn presence_update(users: Vec<Profile>) -> Self {
        OutboundMessage::PresenceUpdate(PresenceUpdate { users })
    }

    pub fn signal(from: ClientId, data: Value) -> Self {
        OutboundMessage::Signal(SignalRelay { from, data })
    }

    pub fn new_message(message: Value) -> Self {
        OutboundMessage::NewMessage(NewMessage { message })
    }

    pub fn typing(status: bool) -> Self {
        OutboundMessage::Typing(Typing { status })
    }

    /// Successful completion reply.
    pub fn ai_response(text: impl Into<String>) -> Self {
        OutboundMessage::AiResponse(AiResponse {
            text: text.into(),
            sender_id: AI_SENDER_ID.to_string(),
        })
    }

    /// The fixed reply sent when a completion fails.
    pub fn ai_error() -> Self {
        Self::ai_response(AI_ERROR_TEXT)
    }

    /// Wire `type` tag for this message, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::PresenceUpdate(_) => "presence_update",
            OutboundMessage::Signal(_) => "signal",
            OutboundMessage::NewMessage(_) => "new_message",
            OutboundMessage::Typing(_) => "typing",
            OutboundMessage::AiResponse(_) => "ai_response",
        }
    }
}

impl InboundMessage {
    /// Wire `type` tag for this message, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Join(_) => "join",
            InboundMessage::Signal(_) => "signal",
            InboundMessage::ChatBroadcast(_) => "chat_broadcast",
            InboundMessage::AiRequest(_) => "ai_request",
        }
    }
}
