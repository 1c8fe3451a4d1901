//! Response cache for read-only editor queries
//!
//! Expensive listing and schema commands (`list_datatables`,
//! `get_datatable_schema`, ...) are cached in memory for a per-category TTL so
//! repeated tool calls within a session skip the editor round-trip.
//!
//! # Keys
//!
//! [`CacheKey`] is `<command>:<canonical-params>`. Parameters are serialized
//! with sorted object keys, so logically equal parameter maps always hit the
//! same entry.
//!
//! # Staleness
//!
//! Entries expire lazily on read against the monotonic clock. Tools that
//! mutate editor data drop the affected listings through
//! [`Invalidation::Prefix`] (for example `list_datatables:` after a row is
//! added), and the whole cache is cleared when the connection to the editor is
//! re-established after a loss, since the editor may have restarted.

mod config;
mod key;
mod memory;

pub use config::{CacheConfig, CacheTtlConfig};
pub use key::{CacheKey, make_key};
pub use memory::{CacheStats, Invalidation, ResponseCache};
