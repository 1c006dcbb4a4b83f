use crate::{error::AppResult, models::TrackedGame};

/// Keyed storage for tracked games
///
/// Implementations hold the full library keyed by record id. They perform no
/// validation or merging; `LibraryStore` builds the logical operations on top
/// of these primitives and decides which backend serves each call.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// All records, in backend order
    async fn list(&self) -> AppResult<Vec<TrackedGame>>;

    async fn get(&self, id: &str) -> AppResult<Option<TrackedGame>>;

    /// Inserts or replaces the record with `game.id`
    async fn put(&self, game: &TrackedGame) -> AppResult<()>;

    /// Returns false when no record had this id
    async fn remove(&self, id: &str) -> AppResult<bool>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
