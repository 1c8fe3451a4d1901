//! TCP client for the UnrealDataBridge editor plugin
//!
//! [`ConnectionManager`] owns one socket to the plugin, frames requests and
//! responses as newline-delimited JSON, retries once on transport failure and
//! fronts read-only commands with the response cache.

mod manager;
mod protocol;

pub use manager::{ConnectionConfig, ConnectionManager};
pub use protocol::{CommandEnvelope, RemoteError, ResultEnvelope};
