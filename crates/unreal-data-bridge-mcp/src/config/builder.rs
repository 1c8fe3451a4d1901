//! Configuration builder

use std::time::Duration;

use crate::Error;
use crate::cache::{CacheConfig, CacheTtlConfig};
use crate::connection::ConnectionConfig;
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_MAX_RESPONSE_CHARS, DEFAULT_PORT,
    DEFAULT_READ_TIMEOUT, DEFAULT_RETRY_DELAY, MIN_MAX_RESPONSE_CHARS,
};
use crate::guard::ResponseSizeGuard;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub cache: CacheConfig,
    pub response: ResponseConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    #[must_use]
    pub const fn size_guard(&self) -> ResponseSizeGuard {
        ResponseSizeGuard::new(self.response.max_chars)
    }
}

/// Tool response limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseConfig {
    /// Character budget for rendered tool output
    pub max_chars: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_RESPONSE_CHARS,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    retry_delay: Duration,
    cache: CacheConfig,
    max_response_chars: usize,
    telemetry: TelemetryConfig,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            cache: CacheConfig::new(),
            max_response_chars: DEFAULT_MAX_RESPONSE_CHARS,
            telemetry: TelemetryConfig {
                otlp_endpoint: None,
                service_name: String::new(),
                log_level: String::new(),
                json_logs: false,
            },
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub const fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    #[must_use]
    pub const fn cache_ttl(mut self, ttl: CacheTtlConfig) -> Self {
        self.cache.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn cache_list_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl.list = ttl;
        self
    }

    #[must_use]
    pub const fn cache_schema_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl.schema = ttl;
        self
    }

    #[must_use]
    pub const fn cache_search_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl.search = ttl;
        self
    }

    #[must_use]
    pub const fn cache_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl.catalog = ttl;
        self
    }

    #[must_use]
    pub const fn max_response_chars(mut self, max_chars: usize) -> Self {
        self.max_response_chars = max_chars;
        self
    }

    #[must_use]
    pub fn otlp_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.telemetry.otlp_endpoint = endpoint;
        self
    }

    #[must_use]
    pub fn service_name(mut self, name: String) -> Self {
        self.telemetry.service_name = name;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> crate::Result<Config> {
        let host = if self.host.is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            self.host.trim().to_string()
        };
        if host.is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }

        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".into()));
        }

        for (name, value) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::Config(format!("{name} must be non-zero")));
            }
        }

        if self.max_response_chars < MIN_MAX_RESPONSE_CHARS {
            return Err(Error::Config(format!(
                "max_response_chars must be at least {MIN_MAX_RESPONSE_CHARS}, got {}",
                self.max_response_chars
            )));
        }

        let service_name = if self.telemetry.service_name.is_empty() {
            env!("CARGO_PKG_NAME").to_string()
        } else {
            self.telemetry.service_name
        };

        let log_level = if self.telemetry.log_level.is_empty() {
            "info".to_string()
        } else {
            self.telemetry.log_level
        };

        Ok(Config {
            connection: ConnectionConfig {
                host,
                port: self.port,
                connect_timeout: self.connect_timeout,
                read_timeout: self.read_timeout,
                retry_delay: self.retry_delay,
            },
            cache: self.cache,
            response: ResponseConfig {
                max_chars: self.max_response_chars,
            },
            telemetry: TelemetryConfig {
                otlp_endpoint: self.telemetry.otlp_endpoint,
                service_name,
                log_level,
                json_logs: self.telemetry.json_logs,
            },
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
