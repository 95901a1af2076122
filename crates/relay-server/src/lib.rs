//! relay-server
//!
//! Multi-client WebSocket relay hub: presence, chat broadcast, peer
//! signaling and AI completions relayed back to the requester.

pub mod config;
pub mod delivery;
pub mod gateway;
pub mod router;
pub mod server;
pub mod types;

// internal module, not re-exported
mod client;
