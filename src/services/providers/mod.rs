//! External game-data providers
//!
//! The catalog provider answers search, lookup, detail and popular-list
//! queries; the trailer finder resolves a game name to an embeddable video.
//! Both are remote and individually fallible: callers treat their failures as
//! "no data for this field" rather than aborting.

use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::AppResult,
    models::{CatalogGame, GameDetails, PopularGames},
};

pub mod rawg;
pub mod youtube;

pub use rawg::RawgProvider;
pub use youtube::YouTubeTrailers;

/// Upper bound on one provider request, connect through body
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client(timeout: Duration) -> HttpClient {
    HttpClient::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "HTTP client builder failed, using default client");
        HttpClient::new()
    })
}

/// Read-only access to the remote game catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search by name. A blank query yields an empty list.
    async fn search(&self, query: &str) -> AppResult<Vec<CatalogGame>>;

    /// Summary record for one catalog id, including genres and platforms
    async fn get_game(&self, catalog_id: i64) -> AppResult<Option<CatalogGame>>;

    /// Full detail view with screenshots and movies
    async fn get_details(&self, catalog_id: i64) -> AppResult<Option<GameDetails>>;

    /// Top-rated list, possibly served from a cache up to a day old
    async fn popular(&self) -> AppResult<PopularGames>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trailer lookup by game name
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrailerFinder: Send + Sync {
    async fn find_trailer(&self, game_name: &str) -> AppResult<Option<String>>;
}
