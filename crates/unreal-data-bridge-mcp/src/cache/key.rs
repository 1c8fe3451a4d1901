//! Cache key canonicalization

use std::fmt;

use serde_json::{Map, Value};

/// Deterministic cache key built from a command name and its parameters.
///
/// Rendered as `<command>:<canonical-params>` where the parameters are
/// compact JSON with object keys sorted at every nesting level. Two parameter
/// maps holding the same entries in a different insertion order produce the
/// same key, and absent parameters are equivalent to an empty map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn new(command: &str, params: Option<&Map<String, Value>>) -> Self {
        let canonical = params.map_or_else(|| Value::Object(Map::new()), canonicalize_object);
        Self(format!("{command}:{canonical}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Command portion of the key
    #[must_use]
    pub fn command(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(cmd, _)| cmd)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a deterministic cache key from command + params
#[must_use]
pub fn make_key(command: &str, params: Option<&Map<String, Value>>) -> CacheKey {
    CacheKey::new(command, params)
}

// serde_json may be compiled with `preserve_order`, so sorting is explicit.
fn canonicalize_object(map: &Map<String, Value>) -> Value {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut sorted = Map::with_capacity(entries.len());
    for (key, value) in entries {
        sorted.insert(key.clone(), canonicalize(value));
    }
    Value::Object(sorted)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => canonicalize_object(map),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
