//! Low-level wire types and constants.
//!
//! This module defines:
//! - The `type` tags for inbound and outbound frames.
//! - The JSON field names that are part of the client compatibility
//!   surface.
//!
//! The actual encode/decode logic lives in `json_codec`.

/// Name of the discriminator field present in every frame.
pub const TYPE_FIELD: &str = "type";

/// Inbound message tags (client → relay).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireInboundType {
    /// `{"type":"join","profile":{...}}`
    Join,

    /// `{"type":"signal","targetId":"...","data":...}`
    Signal,

    /// `{"type":"chat_broadcast","message":...}`
    ChatBroadcast,

    /// `{"type":"ai_request","text":"..."}`
    AiRequest,
}

impl WireInboundType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "join" => Some(WireInboundType::Join),
            "signal" => Some(WireInboundType::Signal),
            "chat_broadcast" => Some(WireInboundType::ChatBroadcast),
            "ai_request" => Some(WireInboundType::AiRequest),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            WireInboundType::Join => "join",
            WireInboundType::Signal => "signal",
            WireInboundType::ChatBroadcast => "chat_broadcast",
            WireInboundType::AiRequest => "ai_request",
        }
    }
}

/// Outbound message tags (relay → client).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireOutboundType {
    /// `{"type":"presence_update","users":[...]}`
    PresenceUpdate,

    /// `{"type":"signal","from":"...","data":...}`
    Signal,

    /// `{"type":"new_message","message":...}`
    NewMessage,

    /// `{"type":"typing","status":true}`
    Typing,

    /// `{"type":"ai_response","text":"...","senderId":"ai-gemini"}`
    AiResponse,
}

impl WireOutboundType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "presence_update" => Some(WireOutboundType::PresenceUpdate),
            "signal" => Some(WireOutboundType::Signal),
            "new_message" => Some(WireOutboundType::NewMessage),
            "typing" => Some(WireOutboundType::Typing),
            "ai_response" => Some(WireOutboundType::AiResponse),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            WireOutboundType::PresenceUpdate => "presence_update",
            WireOutboundType::Signal => "signal",
            WireOutboundType::NewMessage => "new_message",
            WireOutboundType::Typing => "typing",
            WireOutboundType::AiResponse => "ai_response",
        }
    }
}
