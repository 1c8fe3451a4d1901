//! TOML configuration file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::builder::ConfigBuilder;
use crate::Result;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./unreal-data-bridge-mcp.toml",
    "~/.config/unreal-data-bridge-mcp/config.toml",
    "/etc/unreal-data-bridge-mcp/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_PATHS.iter().find_map(|path_str| {
        let path = match path_str.strip_prefix('~') {
            Some(rest) => PathBuf::from(format!("{}{rest}", std::env::var("HOME").ok()?)),
            None => PathBuf::from(path_str),
        };
        path.exists().then_some(path)
    })
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(apply_file_config(builder, file_config))
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> ConfigBuilder {
    if let Some(conn) = config.connection {
        if let Some(host) = conn.host {
            builder = builder.host(host);
        }
        if let Some(port) = conn.port {
            builder = builder.port(port);
        }
        if let Some(secs) = conn.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = conn.read_timeout_secs {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = conn.retry_delay_ms {
            builder = builder.retry_delay(Duration::from_millis(ms));
        }
    }

    if let Some(cache) = config.cache {
        if let Some(enabled) = cache.enabled {
            builder = builder.cache_enabled(enabled);
        }
        if let Some(secs) = cache.list_ttl_secs {
            builder = builder.cache_list_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = cache.schema_ttl_secs {
            builder = builder.cache_schema_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = cache.search_ttl_secs {
            builder = builder.cache_search_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = cache.catalog_ttl_secs {
            builder = builder.cache_catalog_ttl(Duration::from_secs(secs));
        }
    }

    if let Some(max_chars) = config.response.and_then(|r| r.max_chars) {
        builder = builder.max_response_chars(max_chars);
    }

    if let Some(obs) = config.observability {
        if let Some(endpoint) = obs.otlp_endpoint {
            builder = builder.otlp_endpoint(Some(endpoint));
        }
        if let Some(name) = obs.service_name {
            builder = builder.service_name(name);
        }
        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }
        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    builder
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    connection: Option<ConnectionSection>,
    cache: Option<CacheSection>,
    response: Option<ResponseSection>,
    observability: Option<ObservabilitySection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionSection {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CacheSection {
    enabled: Option<bool>,
    list_ttl_secs: Option<u64>,
    schema_ttl_secs: Option<u64>,
    search_ttl_secs: Option<u64>,
    catalog_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseSection {
    max_chars: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObservabilitySection {
    otlp_endpoint: Option<String>,
    service_name: Option<String>,
    log_level: Option<String>,
    json_logs: Option<bool>,
}
