//! External completion gateway.
//!
//! Wraps the text-generation collaborator behind one call:
//! `complete(prompt) -> Result<text, CompletionError>`.
//!
//! The router never awaits this on a connection's receive loop; it
//! spawns the call as its own task (see `router`), so a slow or failing
//! provider only delays the reply to the client that asked.
//!
//! [`GeminiGateway`] talks to the Gemini `generateContent` REST endpoint
//! with an API key. Tests substitute their own [`CompletionGateway`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::AiConfig;

/// Why a completion produced no text.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No credential was configured at startup.
    #[error("no API key configured for the completion provider")]
    MissingApiKey,

    /// Transport failure, or a body that did not decode.
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("completion provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The round trip exceeded the configured bound.
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    /// A well-formed reply with no text in it.
    #[error("completion provider returned no text")]
    EmptyResponse,
}

/// One request/response round trip with a text-generation provider.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

// -----------------------------------------------------------------------------
// Gemini
// -----------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Gemini `generateContent` client.
pub struct GeminiGateway {
    /// HTTP client (reused across requests).
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    system_prompt: Option<String>,
}

impl GeminiGateway {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a gateway with a shared HTTP client.
    pub fn with_client(config: &AiConfig, client: reqwest::Client) -> Self {
        GeminiGateway {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            system_prompt: config.system_prompt.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            system_instruction: self.system_prompt.as_deref().map(|text| SystemInstruction {
                parts: vec![RequestPart { text }],
            }),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateContentResponse = response.json().await?;
        data.into_text().ok_or(CompletionError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionGateway for GeminiGateway {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        match tokio::time::timeout(self.timeout, self.generate(api_key, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.timeout)),
        }
    }
}
