//! Shared types for the relay server.
//!
//! This module defines:
//! - the connection handle type (`OutboundTx`) and its receiving half
//! - `ClientRegistry`: the single shared, lock-guarded registry
//! - `AppState`: everything a connection task needs, built once in
//!   `main` and passed in explicitly

use std::sync::Arc;

use relay_core::{OutboundMessage, Registry};
use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::gateway::CompletionGateway;

pub use relay_core::ClientId;

/// Outbound messages from the relay to a given client.
///
/// The sender is the connection handle stored in the registry; the
/// receiver is drained by that connection's writer task.
pub type OutboundTx = mpsc::UnboundedSender<OutboundMessage>;
pub type OutboundRx = mpsc::UnboundedReceiver<OutboundMessage>;

/// Registry of connected clients, their outbound channels and profiles.
///
/// Every read and write goes through this one lock.
pub type ClientRegistry = Arc<RwLock<Registry<OutboundTx>>>;

pub fn new_client_registry() -> ClientRegistry {
    Arc::new(RwLock::new(Registry::new()))
}

/// Process-scoped state shared by every connection task.
#[derive(Clone)]
pub struct AppState {
    pub registry: ClientRegistry,
    pub gateway: Arc<dyn CompletionGateway>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn CompletionGateway>) -> Self {
        AppState {
            registry: new_client_registry(),
            gateway,
            config: Arc::new(config),
        }
    }

    /// Number of currently registered connections.
    pub async fn active_connections(&self) -> usize {
        self.registry.read().await.len()
    }
}
