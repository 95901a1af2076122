//! relay-protocol
//!
//! Wire-level encoding/decoding for the relay hub.
//!
//! This crate is responsible for turning logical relay messages
//! (`relay_core::InboundMessage` / `OutboundMessage`) into UTF-8 JSON
//! text frames and back again.
//!
//! - [`wire_types`] : `type` tags and field names
//! - [`json_codec`] : serde-based encode/decode

pub mod wire_types;
pub mod json_codec;

pub use json_codec::{
    ProtocolError,
    decode_inbound,
    encode_inbound,
    decode_outbound,
    encode_outbound,
};
