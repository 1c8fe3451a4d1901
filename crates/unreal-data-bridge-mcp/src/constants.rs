//! Constants for the Unreal Data Bridge MCP server

use std::time::Duration;

/// Default host of the UnrealDataBridge plugin TCP server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the UnrealDataBridge plugin TCP server
pub const DEFAULT_PORT: u16 = 8742;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Pause before the single reconnect attempt after a connection-class failure
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Bytes requested per socket read while waiting for a response line
pub const READ_CHUNK_SIZE: usize = 65_536;

/// Default response budget in characters
pub const DEFAULT_MAX_RESPONSE_CHARS: usize = 40_000;

/// Smallest budget accepted from configuration
pub const MIN_MAX_RESPONSE_CHARS: usize = 1_000;

/// Top-level array fields the size guard may truncate, in priority order
pub const TRUNCATABLE_FIELDS: &[&str] = &[
    "rows",
    "results",
    "tags",
    "datatables",
    "data_assets",
    "string_tables",
    "assets",
    "entries",
    "resolved",
];

/// Guidance attached to truncated or rejected responses
pub const SIZE_SUGGESTION: &str = "Use 'fields' parameter to select only needed fields, or reduce 'limit' to get fewer rows.";

/// Error marker used when an oversized response has no truncatable field
pub const RESPONSE_TOO_LARGE: &str = "response_too_large";

/// Fallback remote error message when the editor omits one
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Fallback remote error code when the editor omits one
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN";

/// Largest `limit` forwarded to `search_assets`
pub const MAX_SEARCH_ASSETS_LIMIT: u32 = 500;

/// Cache key prefixes dropped after DataTable row-count changes
pub const DATATABLE_LIST_PREFIXES: &[&str] = &["list_datatables:", "get_data_catalog:"];
