use std::collections::HashMap;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use crate::{
    db::StorageBackend,
    error::{AppError, AppResult},
    models::TrackedGame,
};

/// Primary library backend: one Redis hash, field = record id, value = JSON
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    key: String,
}

impl RedisBackend {
    pub fn new(client: Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        super::cache::connect(&self.client).await
    }
}

/// Decodes one hash value; corrupt entries are logged and dropped
fn decode(id: &str, json: &str) -> Option<TrackedGame> {
    match serde_json::from_str(json) {
        Ok(game) => Some(game),
        Err(e) => {
            tracing::warn!(game_id = %id, error = %e, backend = "redis", "Skipping malformed library record");
            None
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedisBackend {
    async fn list(&self) -> AppResult<Vec<TrackedGame>> {
        let mut conn = self.connection().await?;
        let raw: HashMap<String, String> = conn.hgetall(&self.key).await?;

        let games: Vec<TrackedGame> = raw
            .iter()
            .filter_map(|(id, json)| decode(id, json))
            .collect();

        tracing::debug!(count = games.len(), backend = "redis", "Library listed");
        Ok(games)
    }

    async fn get(&self, id: &str) -> AppResult<Option<TrackedGame>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.hget(&self.key, id).await?;
        Ok(raw.and_then(|json| decode(id, &json)))
    }

    async fn put(&self, game: &TrackedGame) -> AppResult<()> {
        let json = serde_json::to_string(game)?;
        let mut conn = self.connection().await?;
        let _: () = conn.hset(&self.key, &game.id, json).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.hdel(&self.key, id).await?;
        Ok(removed > 0)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
