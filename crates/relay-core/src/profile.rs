//! Self-announced display state for a client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client's profile as sent in `join`.
///
/// The relay never looks inside it: whatever JSON the client announced
/// (usually an object with `name`, `avatar`, ...) is stored and echoed
/// verbatim in every `presence_update`. A `join` without a profile
/// stores `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(pub Value);

impl Profile {
    pub fn new(value: Value) -> Self {
        Profile(value)
    }

    /// Convenience lookup of a top-level string field (e.g. `"name"`).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Value> for Profile {
    fn from(value: Value) -> Self {
        Profile(value)
    }
}
