use std::time::Duration;

use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use super::protocol::{CommandEnvelope, ResultEnvelope};
use crate::cache::{CacheConfig, CacheKey, CacheStats, Invalidation, ResponseCache};
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_READ_TIMEOUT,
    DEFAULT_RETRY_DELAY, READ_CHUNK_SIZE,
};
use crate::error::{Error, Result};

/// Where and how to reach the editor plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Bound on each individual socket read while awaiting a response
    pub read_timeout: Duration,
    pub retry_delay: Duration,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    stream: Option<TcpStream>,
    cache: ResponseCache,
    /// Set when a live connection dropped; the next successful connect clears the cache
    lost: bool,
}

impl State {
    async fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let address = (config.host.as_str(), config.port);
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                Error::connection_unavailable(
                    &config.host,
                    config.port,
                    format!("timed out after {:?}", config.connect_timeout),
                )
            })?
            .map_err(|e| Error::connection_unavailable(&config.host, config.port, e))?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
        }
        self.stream = Some(stream);
        tracing::info!(address = %config.address(), "Connected to Unreal Editor");

        if self.lost {
            self.lost = false;
            let dropped = self.cache.invalidate(&Invalidation::All);
            tracing::info!(
                cache.removed = dropped,
                "Reconnected after connection loss, cleared response cache"
            );
        }

        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            tracing::debug!("Disconnected from Unreal Editor");
        }
    }

    /// One full connect + send + receive attempt
    async fn round_trip(
        &mut self,
        config: &ConnectionConfig,
        command: &str,
        line: &str,
    ) -> Result<ResultEnvelope> {
        self.connect(config).await?;
        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::ConnectionLost("socket not open".to_string()));
        };

        let response = match exchange(stream, line, config.read_timeout).await {
            Ok(response) => response,
            Err(e) => {
                self.lost = true;
                self.close().await;
                return Err(e);
            }
        };

        let envelope = ResultEnvelope::parse(&response)?;
        if let Some(timing_ms) = envelope.timing_ms {
            tracing::debug!(command, timing_ms, "Editor reported command timing");
        }
        if !envelope.warnings.is_empty() {
            tracing::debug!(command, warnings = ?envelope.warnings, "Editor returned warnings");
        }
        envelope.into_result(command)
    }
}

fn lost(e: impl std::fmt::Display) -> Error {
    Error::ConnectionLost(e.to_string())
}

/// Write one request line and read up to the first newline of the reply.
///
/// Bytes after the newline are discarded.
async fn exchange(stream: &mut TcpStream, line: &str, read_timeout: Duration) -> Result<Vec<u8>> {
    stream.write_all(line.as_bytes()).await.map_err(lost)?;
    stream.flush().await.map_err(lost)?;

    let mut buffer = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let read = tokio::time::timeout(read_timeout, stream.read(&mut chunk))
            .await
            .map_err(|_| lost(format!("no response within {read_timeout:?}")))?
            .map_err(lost)?;

        if read == 0 {
            return Err(lost("Connection closed by Unreal Editor"));
        }

        let received = &chunk[..read];
        if let Some(end) = received.iter().position(|&b| b == b'\n') {
            buffer.extend_from_slice(&received[..end]);
            return Ok(buffer);
        }
        buffer.extend_from_slice(received);
    }
}

/// Single-connection client for the editor plugin with an owned response cache.
///
/// All operations take one internal lock for their full duration, including
/// the retry delay, so concurrent callers are served one at a time and request
/// lines never interleave on the socket.
#[derive(Debug)]
pub struct ConnectionManager {
    config: ConnectionConfig,
    cache_config: CacheConfig,
    state: Mutex<State>,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig, cache_config: CacheConfig) -> Self {
        Self {
            config,
            cache_config,
            state: Mutex::new(State::default()),
        }
    }

    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub const fn cache_config(&self) -> &CacheConfig {
        &self.cache_config
    }

    /// Open the socket if not already open
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.connect(&self.config).await
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        state.close().await;
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.stream.is_some()
    }

    /// Send `command` and wait for its response, retrying once on connection failure
    pub async fn execute(
        &self,
        command: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<ResultEnvelope> {
        let mut state = self.state.lock().await;
        self.execute_locked(&mut state, command, params).await
    }

    /// Like [`execute`](Self::execute) but serves and stores the `data` mapping
    /// through the response cache
    pub async fn execute_cached(
        &self,
        command: &str,
        params: Option<&Map<String, Value>>,
        ttl: Duration,
    ) -> Result<Map<String, Value>> {
        let mut state = self.state.lock().await;

        if !self.cache_config.enabled {
            return Ok(self.execute_locked(&mut state, command, params).await?.data);
        }

        let key = CacheKey::new(command, params);
        if let Some(data) = state.cache.get(&key) {
            return Ok(data);
        }

        let data = self.execute_locked(&mut state, command, params).await?.data;
        state.cache.set(key, data.clone(), ttl);
        Ok(data)
    }

    pub async fn invalidate_cache(&self, invalidation: &Invalidation) -> usize {
        self.state.lock().await.cache.invalidate(invalidation)
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.state.lock().await.cache.stats()
    }

    pub async fn reset_cache_stats(&self) {
        self.state.lock().await.cache.reset_stats();
    }

    async fn execute_locked(
        &self,
        state: &mut State,
        command: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<ResultEnvelope> {
        let empty = Map::new();
        let line = CommandEnvelope::new(command, params.unwrap_or(&empty)).to_line()?;

        match state.round_trip(&self.config, command, &line).await {
            Err(e) if e.is_connection_error() => {
                tracing::warn!(
                    command,
                    attempt = 1,
                    error = %e,
                    retry_delay = ?self.config.retry_delay,
                    "Connection failure, retrying once"
                );
                state.close().await;
                tokio::time::sleep(self.config.retry_delay).await;

                let result = state.round_trip(&self.config, command, &line).await;
                if let Err(e) = &result {
                    tracing::warn!(command, attempt = 2, error = %e, "Retry failed");
                }
                result
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    use super::*;

    fn config_for(port: u16) -> ConnectionConfig {
        ConnectionConfig {
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(2),
            retry_delay: Duration::from_millis(20),
            ..ConnectionConfig::new("127.0.0.1", port)
        }
    }

    /// Port with nothing listening on it
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Fake editor answering every request line with `reply`, counting connections
    async fn spawn_editor(reply: &'static str) -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut lines = BufReader::new(read).lines();
                    while let Ok(Some(_)) = lines.next_line().await {
                        if write.write_all(reply.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        (port, accepted)
    }

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8742);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.address(), "127.0.0.1:8742");
    }

    #[tokio::test]
    async fn test_connect_refused_is_unavailable() {
        let port = closed_port().await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        let err = manager.connect().await.unwrap_err();
        assert!(err.is_connection_unavailable());
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let (port, accepted) = spawn_editor("{\"success\":true}\n").await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        manager.connect().await.unwrap();
        manager.connect().await.unwrap();
        assert!(manager.is_connected().await);

        manager.execute("get_status", None).await.unwrap();
        assert_eq!(accepted.load(Ordering::SeqCst), 1);

        manager.disconnect().await;
        assert!(!manager.is_connected().await);
        manager.disconnect().await;
    }

    #[tokio::test]
    async fn test_execute_returns_envelope() {
        let (port, _) =
            spawn_editor("{\"success\":true,\"data\":{\"project_name\":\"Lyra\"},\"timing_ms\":1.5}\n")
                .await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        let envelope = manager.execute("get_status", None).await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data["project_name"], "Lyra");
        assert_eq!(envelope.timing_ms, Some(1.5));
    }

    #[tokio::test]
    async fn test_remote_failure_is_not_retried() {
        let (port, accepted) = spawn_editor(
            "{\"success\":false,\"error\":{\"message\":\"Row not found\",\"code\":\"ROW_NOT_FOUND\"}}\n",
        )
        .await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        let err = manager.execute("get_datatable_row", None).await.unwrap_err();
        assert_eq!(err.remote_code(), Some("ROW_NOT_FOUND"));
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let (port, accepted) = spawn_editor("this is not json\n").await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        let err = manager.execute("get_status", None).await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unavailable_twice_fails_after_single_retry() {
        let port = closed_port().await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        let err = manager.execute("get_status", None).await.unwrap_err();
        assert!(err.is_connection_unavailable());
    }

    #[tokio::test]
    async fn test_execute_cached_hit_skips_network() {
        let (port, accepted) = spawn_editor("{\"success\":true,\"data\":{\"datatables\":[]}}\n").await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());
        let params = json!({"path_filter": "/Game"});
        let params = params.as_object().unwrap();

        let first = manager
            .execute_cached("list_datatables", Some(params), Duration::from_secs(60))
            .await
            .unwrap();
        manager.disconnect().await;
        let second = manager
            .execute_cached("list_datatables", Some(params), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert!(!manager.is_connected().await);

        let stats = manager.cache_stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_execute_cached_disabled_always_executes() {
        let (port, _) = spawn_editor("{\"success\":true,\"data\":{\"tags\":[]}}\n").await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::disabled());

        for _ in 0..2 {
            let data = manager
                .execute_cached("list_gameplay_tags", None, Duration::from_secs(60))
                .await
                .unwrap();
            assert_eq!(data["tags"], json!([]));
        }

        let stats = manager.cache_stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (port, accepted) =
            spawn_editor("{\"success\":false,\"error\":{\"message\":\"boom\"}}\n").await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());

        for _ in 0..2 {
            let err = manager
                .execute_cached("list_datatables", None, Duration::from_secs(60))
                .await
                .unwrap_err();
            assert!(err.is_remote());
        }
        assert_eq!(manager.cache_stats().await.entries, 0);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_reset_stats() {
        let (port, _) = spawn_editor("{\"success\":true,\"data\":{}}\n").await;
        let manager = ConnectionManager::new(config_for(port), CacheConfig::new());
        let ttl = Duration::from_secs(60);

        manager.execute_cached("list_datatables", None, ttl).await.unwrap();
        manager.execute_cached("get_data_catalog", None, ttl).await.unwrap();
        manager.execute_cached("list_gameplay_tags", None, ttl).await.unwrap();

        let removed = manager
            .invalidate_cache(&Invalidation::prefix("list_datatables:"))
            .await;
        assert_eq!(removed, 1);
        assert_eq!(manager.invalidate_cache(&Invalidation::All).await, 2);

        manager.reset_cache_stats().await;
        let stats = manager.cache_stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (0, 0, 0));
    }
}
