//! Configuration for the relay server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `RELAY_BIND_ADDR`        (default: "0.0.0.0")
//! - `RELAY_PORT`             (default: "8000")
//! - `RELAY_MAX_CLIENTS`      (default: "1024")
//! - `API_KEY`                (default: unset; every completion then fails)
//! - `RELAY_AI_MODEL`         (default: "gemini-2.5-flash-lite-latest")
//! - `RELAY_AI_BASE_URL`      (default: "https://generativelanguage.googleapis.com")
//! - `RELAY_AI_TIMEOUT_SECS`  (default: "30")
//! - `RELAY_AI_SYSTEM_PROMPT` (default: unset)
//!
//! Everything is read once at process start.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash-lite-latest";
pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Settings for the external completion gateway.
    pub ai: AiConfig,
}

/// Completion gateway settings.
#[derive(Clone)]
pub struct AiConfig {
    /// Provider credential; `None` leaves the gateway unusable.
    pub api_key: Option<String>,

    pub model: String,

    pub base_url: String,

    /// Upper bound on a single completion round trip.
    pub timeout: Duration,

    /// Optional persona / system instruction sent with every prompt.
    pub system_prompt: Option<String>,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            max_clients: 1024,
            ai: AiConfig::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            api_key: None,
            model: DEFAULT_AI_MODEL.to_string(),
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            system_prompt: None,
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to reasonable defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_addr = lookup("RELAY_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = read_or_default(&lookup, "RELAY_PORT", defaults.port)?;
        let max_clients = read_or_default(&lookup, "RELAY_MAX_CLIENTS", defaults.max_clients)?;

        let timeout_secs = read_or_default(
            &lookup,
            "RELAY_AI_TIMEOUT_SECS",
            defaults.ai.timeout.as_secs(),
        )?;

        let ai = AiConfig {
            api_key: non_empty(lookup("API_KEY")),
            model: non_empty(lookup("RELAY_AI_MODEL")).unwrap_or(defaults.ai.model),
            base_url: non_empty(lookup("RELAY_AI_BASE_URL")).unwrap_or(defaults.ai.base_url),
            timeout: Duration::from_secs(timeout_secs),
            system_prompt: non_empty(lookup("RELAY_AI_SYSTEM_PROMPT")),
        };

        Ok(Config {
            bind_addr,
            port,
            max_clients,
            ai,
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_or_default<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value: val,
        }),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
