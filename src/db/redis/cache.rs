use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::error::AppResult;

/// Keys for cached catalog responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CatalogSearch(String),
    CatalogGame(i64),
    CatalogDetails(i64),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::CatalogSearch(query) => {
                write!(f, "catalog:search:{}", query.trim().to_lowercase())
            }
            CacheKey::CatalogGame(id) => write!(f, "catalog:game:{}", id),
            CacheKey::CatalogDetails(id) => write!(f, "catalog:details:{}", id),
        }
    }
}

/// Creates a Redis client
///
/// Only parses the URL; connections are opened per operation, so an
/// unreachable server surfaces on first use rather than here.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Upper bound on opening a Redis connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens a multiplexed connection, failing with `Storage` after `CONNECT_TIMEOUT`
pub(crate) async fn connect(client: &Client) -> AppResult<MultiplexedConnection> {
    match tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection()).await {
        Ok(conn) => Ok(conn?),
        Err(_) => Err(AppError::Storage(format!(
            "redis connection timed out after {:?}",
            CONNECT_TIMEOUT
        ))),
    }
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Catalog response cache backed by Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until its queue is flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task ended abnormally");
        }
        tracing::info!("Cache writer stopped");
    }
}

impl Cache {
    /// Creates the cache and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Drains write messages until shutdown, then flushes what is queued
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::warn!(error = %e, "Failed to write catalog response to cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = connect(client).await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = connect(&self.redis_client).await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Like `get_from_cache`, but an unreachable or corrupt cache is a miss
    pub async fn get_or_miss<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.get_from_cache(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Queues a write on the background task; returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_search_normalizes_query() {
        let key = CacheKey::CatalogSearch("  Hollow KNIGHT ".to_string());
        assert_eq!(key.to_string(), "catalog:search:hollow knight");
    }

    #[test]
    fn test_cache_key_display_game_and_details() {
        assert_eq!(CacheKey::CatalogGame(3328).to_string(), "catalog:game:3328");
        assert_eq!(
            CacheKey::CatalogDetails(3328).to_string(),
            "catalog:details:3328"
        );
    }

    #[tokio::test]
    async fn test_unreachable_cache_is_a_miss() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        let hit: Option<Vec<String>> = cache.get_or_miss(&CacheKey::CatalogGame(1)).await;
        assert_eq!(hit, None);

        cache.set_in_background(&CacheKey::CatalogGame(1), &vec!["x"], 60);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_writer_to_drain() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        for id in 0..3 {
            cache.set_in_background(&CacheKey::CatalogGame(id), &id, 60);
        }
        handle.shutdown().await;

        // The writer has exited and dropped its receiver
        assert!(cache.write_tx.is_closed());
    }

    #[tokio::test]
    async fn test_connect_to_unroutable_host_is_bounded() {
        // 10.255.255.1 drops SYNs; the connect must give up on its own
        let client = create_redis_client("redis://10.255.255.1:6379").unwrap();
        let started = std::time::Instant::now();

        assert!(connect(&client).await.is_err());
        assert!(started.elapsed() < CONNECT_TIMEOUT + Duration::from_secs(1));
    }
}
