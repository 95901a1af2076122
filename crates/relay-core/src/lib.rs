//! relay-core
//!
//! Pure relay logic:
//! - client identifiers and profiles
//! - messages (inbound/outbound logical types)
//! - the connection registry

pub mod client_id;
pub mod profile;
pub mod messages;
pub mod registry;

pub use client_id::ClientId;
pub use profile::Profile;

pub use messages::{
    AiRequest,
    AiResponse,
    ChatBroadcast,
    InboundMessage,
    Join,
    NewMessage,
    OutboundMessage,
    PresenceUpdate,
    SignalRelay,
    SignalRequest,
    Typing,
    AI_ERROR_TEXT,
    AI_SENDER_ID,
};

pub use registry::Registry;
