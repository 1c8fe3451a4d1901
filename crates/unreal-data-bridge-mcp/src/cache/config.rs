//! Cache configuration types

use std::time::Duration;

/// Per-category cache TTLs used by the tool layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtlConfig {
    /// Asset and table listings (`list_datatables`, `list_data_assets`, ...)
    pub list: Duration,
    /// Struct and table schemas; these only change after a recompile
    pub schema: Duration,
    /// Asset registry searches
    pub search: Duration,
    /// Data catalog summaries
    pub catalog: Duration,
}

impl CacheTtlConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            list: Duration::from_secs(300),
            schema: Duration::from_secs(1800),
            search: Duration::from_secs(120),
            catalog: Duration::from_secs(300),
        }
    }
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether `execute_cached` consults the cache at all
    pub enabled: bool,
    /// TTL configuration
    pub ttl: CacheTtlConfig,
}

impl CacheConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            ttl: CacheTtlConfig::new(),
        }
    }

    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            ttl: CacheTtlConfig::new(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}
