use rmcp::ErrorData;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Cannot connect to Unreal Editor at {host}:{port}. Is the editor running with UnrealDataBridge plugin enabled? Error: {reason}"
    )]
    ConnectionUnavailable {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Lost connection to Unreal Editor: {0}")]
    ConnectionLost(String),

    #[error("UE command '{command}' failed: {message} (code: {code})")]
    RemoteCommandFailed {
        command: String,
        message: String,
        code: String,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Malformed response from Unreal Editor: {0}")]
    MalformedResponse(String),

    #[error("Response too large: {size} characters")]
    ResponseTooLarge { size: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    pub fn connection_unavailable(
        host: impl Into<String>,
        port: u16,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::ConnectionUnavailable {
            host: host.into(),
            port,
            reason: reason.to_string(),
        }
    }

    pub fn remote_command_failed(
        command: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::RemoteCommandFailed {
            command: command.into(),
            message: message.into(),
            code: code.into(),
        }
    }

    /// Transport-level failure that the one-shot retry may recover from
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionUnavailable { .. } | Self::ConnectionLost(_)
        )
    }

    #[must_use]
    pub const fn is_connection_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionUnavailable { .. })
    }

    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteCommandFailed { .. })
    }

    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Remote error code, if the editor rejected the command
    #[must_use]
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::RemoteCommandFailed { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Convert our Error type to rmcp `ErrorData`
impl From<Error> for ErrorData {
    fn from(err: Error) -> Self {
        match err {
            Error::ConnectionUnavailable { .. } | Error::ConnectionLost(_) => {
                Self::internal_error(err.to_string(), None)
            }
            Error::RemoteCommandFailed {
                ref command,
                ref code,
                ..
            } => {
                let data = serde_json::json!({ "command": command, "code": code });
                Self::internal_error(err.to_string(), Some(data))
            }
            Error::MalformedInput(msg) => Self::invalid_params(format!("Malformed input: {msg}"), None),
            Error::MalformedResponse(msg) => {
                Self::internal_error(format!("Malformed response: {msg}"), None)
            }
            Error::ResponseTooLarge { size } => Self::internal_error(
                format!("Response too large: {size} characters"),
                None,
            ),
            Error::Config(msg) => Self::invalid_params(format!("Configuration error: {msg}"), None),
            Error::Transport(msg) => Self::internal_error(format!("Transport error: {msg}"), None),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
