//! Shared helpers for relay-server integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use relay_server::config::Config;
use relay_server::gateway::{CompletionError, CompletionGateway};
use relay_server::types::AppState;
use tokio::sync::Notify;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);
pub const SILENCE: Duration = Duration::from_millis(200);

/// Answers every prompt with a fixed reply (or a fixed failure) and
/// remembers what it was asked.
pub struct ScriptedGateway {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn replying(text: &str) -> Self {
        ScriptedGateway {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        ScriptedGateway {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(CompletionError::Timeout(Duration::from_secs(30))),
        }
    }
}

/// Blocks every completion until `release` is notified.
pub struct HeldGateway {
    pub release: Arc<Notify>,
    reply: String,
}

impl HeldGateway {
    pub fn new(reply: &str) -> (Self, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        (
            HeldGateway {
                release: release.clone(),
                reply: reply.to_string(),
            },
            release,
        )
    }
}

#[async_trait]
impl CompletionGateway for HeldGateway {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.release.notified().await;
        Ok(self.reply.clone())
    }
}

pub fn state_with(gateway: Arc<dyn CompletionGateway>) -> AppState {
    AppState::new(Config::default(), gateway)
}
