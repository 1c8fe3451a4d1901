//! MCP server bridging AI tools to Unreal Editor data
//!
//! The bridge forwards MCP tool calls as newline-delimited JSON commands to the
//! UnrealDataBridge editor plugin over TCP, caches read-only answers, and keeps
//! every tool response inside a character budget.

pub mod cache;
pub mod config;
pub mod connection;
mod constants;
mod error;
pub mod guard;
mod helpers;
pub mod observability;
pub mod server;
pub mod transport;
pub mod types;

pub use cache::{
    CacheConfig, CacheKey, CacheStats, CacheTtlConfig, Invalidation, ResponseCache, make_key,
};
pub use config::{Config, ConfigBuilder, ResponseConfig, TelemetryConfig};
pub use connection::{ConnectionConfig, ConnectionManager, ResultEnvelope};
pub use error::{Error, Result};
pub use guard::{GuardOutcome, Guarded, ResponseSizeGuard, format_response};
pub use server::ServerHandler;
pub use types::*;
