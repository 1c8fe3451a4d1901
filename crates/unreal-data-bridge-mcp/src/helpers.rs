//! Helper utilities for building editor command parameters

use serde_json::{Map, Value};

use crate::Error;

/// Split a comma-separated tool argument into trimmed items
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

/// Parse a JSON-encoded tool argument, naming the argument on failure
pub fn parse_json_arg(name: &str, raw: &str) -> crate::Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::MalformedInput(format!("Invalid JSON in {name}: {e}")))
}

/// Builder for the `params` object of a command envelope
#[derive(Debug, Default, Clone)]
pub struct CommandParams(Map<String, Value>);

impl CommandParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Insert `value` only when it is non-empty
    #[must_use]
    pub fn with_non_empty(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.with(key, value)
        }
    }

    /// Insert a comma-separated argument as a string array, skipping empty input
    #[must_use]
    pub fn with_list(self, key: &str, raw: &str) -> Self {
        if raw.is_empty() {
            self
        } else {
            self.with(key, split_list(raw))
        }
    }

    /// Insert a JSON-encoded argument, parsed
    pub fn with_json(self, key: &str, raw: &str) -> crate::Result<Self> {
        let value = parse_json_arg(key, raw)?;
        Ok(self.with(key, value))
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<CommandParams> for Map<String, Value> {
    fn from(params: CommandParams) -> Self {
        params.0
    }
}
