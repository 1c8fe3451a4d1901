//! Line-delimited JSON envelopes exchanged with the editor plugin
//!
//! Each message is one compact JSON object followed by a single `\n`. The
//! client always speaks first and waits for exactly one response line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{UNKNOWN_ERROR_CODE, UNKNOWN_ERROR_MESSAGE};
use crate::error::{Error, Result};

/// Outgoing request
#[derive(Debug, Clone, Serialize)]
pub struct CommandEnvelope<'a> {
    pub command: &'a str,
    pub params: &'a Map<String, Value>,
}

impl<'a> CommandEnvelope<'a> {
    pub const fn new(command: &'a str, params: &'a Map<String, Value>) -> Self {
        Self { command, params }
    }

    /// Serialize to a single newline-terminated line.
    ///
    /// Compact JSON escapes newlines inside strings, so the only raw `\n` is
    /// the terminator.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| Error::MalformedInput(format!("cannot serialize params: {e}")))?;
        line.push('\n');
        Ok(line)
    }
}

/// Failure details reported by the editor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Incoming response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub error: Option<RemoteError>,
    #[serde(default)]
    pub warnings: Vec<Value>,
    #[serde(default)]
    pub timing_ms: Option<f64>,
}

impl ResultEnvelope {
    /// Parse one response line (without its terminator)
    pub fn parse(line: &[u8]) -> Result<Self> {
        serde_json::from_slice(line).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    /// Turn an unsuccessful envelope into `RemoteCommandFailed`
    pub fn into_result(self, command: &str) -> Result<Self> {
        if self.success {
            return Ok(self);
        }

        let error = self.error.unwrap_or_default();
        Err(Error::remote_command_failed(
            command,
            error
                .message
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
            error.code.unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string()),
        ))
    }
}
