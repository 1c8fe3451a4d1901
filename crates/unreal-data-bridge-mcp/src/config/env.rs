//! Environment variable loading for configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::builder::ConfigBuilder;
use crate::Result;

/// Environment variable names
mod vars {
    pub const UDB_HOST: &str = "UDB_HOST";
    pub const UDB_PORT: &str = "UDB_PORT";
    pub const UDB_CONNECT_TIMEOUT_SECS: &str = "UDB_CONNECT_TIMEOUT_SECS";
    pub const UDB_READ_TIMEOUT_SECS: &str = "UDB_READ_TIMEOUT_SECS";
    pub const UDB_RETRY_DELAY_MS: &str = "UDB_RETRY_DELAY_MS";
    pub const UDB_CACHE_ENABLED: &str = "UDB_CACHE_ENABLED";
    pub const UDB_CACHE_LIST_TTL_SECS: &str = "UDB_CACHE_LIST_TTL_SECS";
    pub const UDB_CACHE_SCHEMA_TTL_SECS: &str = "UDB_CACHE_SCHEMA_TTL_SECS";
    pub const UDB_CACHE_SEARCH_TTL_SECS: &str = "UDB_CACHE_SEARCH_TTL_SECS";
    pub const UDB_CACHE_CATALOG_TTL_SECS: &str = "UDB_CACHE_CATALOG_TTL_SECS";
    pub const UDB_MAX_RESPONSE_CHARS: &str = "UDB_MAX_RESPONSE_CHARS";
    pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
    pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const UDB_JSON_LOGS: &str = "UDB_JSON_LOGS";
}

/// Read and parse a variable, failing on values that do not parse
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("Invalid {name}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Connection
    if let Ok(host) = env::var(vars::UDB_HOST) {
        builder = builder.host(host);
    }

    if let Some(port) = parse_var::<u16>(vars::UDB_PORT)? {
        builder = builder.port(port);
    }

    if let Some(secs) = parse_var::<u64>(vars::UDB_CONNECT_TIMEOUT_SECS)? {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }

    if let Some(secs) = parse_var::<u64>(vars::UDB_READ_TIMEOUT_SECS)? {
        builder = builder.read_timeout(Duration::from_secs(secs));
    }

    if let Some(ms) = parse_var::<u64>(vars::UDB_RETRY_DELAY_MS)? {
        builder = builder.retry_delay(Duration::from_millis(ms));
    }

    // Cache
    if let Ok(val) = env::var(vars::UDB_CACHE_ENABLED) {
        builder = builder.cache_enabled(parse_bool(&val));
    }

    if let Some(secs) = parse_var::<u64>(vars::UDB_CACHE_LIST_TTL_SECS)? {
        builder = builder.cache_list_ttl(Duration::from_secs(secs));
    }

    if let Some(secs) = parse_var::<u64>(vars::UDB_CACHE_SCHEMA_TTL_SECS)? {
        builder = builder.cache_schema_ttl(Duration::from_secs(secs));
    }

    if let Some(secs) = parse_var::<u64>(vars::UDB_CACHE_SEARCH_TTL_SECS)? {
        builder = builder.cache_search_ttl(Duration::from_secs(secs));
    }

    if let Some(secs) = parse_var::<u64>(vars::UDB_CACHE_CATALOG_TTL_SECS)? {
        builder = builder.cache_catalog_ttl(Duration::from_secs(secs));
    }

    // Response budget
    if let Some(max_chars) = parse_var::<usize>(vars::UDB_MAX_RESPONSE_CHARS)? {
        builder = builder.max_response_chars(max_chars);
    }

    // Telemetry
    if let Ok(endpoint) = env::var(vars::OTEL_EXPORTER_OTLP_ENDPOINT) {
        builder = builder.otlp_endpoint(Some(endpoint));
    }

    if let Ok(name) = env::var(vars::OTEL_SERVICE_NAME) {
        builder = builder.service_name(name);
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::UDB_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
