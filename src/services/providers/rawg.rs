//! RAWG catalog provider
//!
//! Search, lookup and detail responses are cached in Redis (when configured)
//! through the `cached!` macro. The popular list lives in an in-process
//! `TtlCache` for a day and is served stale if a refresh fails.
//!
//! API Flow:
//! 1. Search: /games?search= → summaries
//! 2. Lookup: /games/{id} → summary with genres and platforms
//! 3. Details: /games/{id}, /games/{id}/screenshots, /games/{id}/movies in parallel
//! 4. Popular: /games?ordering=-rating
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    cached,
    db::{Cache, CacheKey, TtlCache},
    error::{AppError, AppResult},
    models::{
        catalog::{RawgGame, RawgGameDetails, RawgMovie, RawgPage, RawgScreenshot},
        CatalogGame, GameDetails, PopularGames,
    },
    services::providers::{http_client, CatalogProvider, REQUEST_TIMEOUT},
};

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const GAME_CACHE_TTL: u64 = 86400; // 1 day
pub const POPULAR_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const SEARCH_PAGE_SIZE: &str = "20";
const POPULAR_PAGE_SIZE: &str = "100";
const SCREENSHOT_PAGE_SIZE: &str = "10";

#[derive(Clone)]
pub struct RawgProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Option<Cache>,
    popular: Arc<TtlCache<Vec<CatalogGame>>>,
}

impl RawgProvider {
    pub fn new(api_key: Option<String>, api_url: String, cache: Option<Cache>) -> Self {
        Self::with_popular_ttl(api_key, api_url, cache, POPULAR_TTL)
    }

    pub fn with_popular_ttl(
        api_key: Option<String>,
        api_url: String,
        cache: Option<Cache>,
        popular_ttl: Duration,
    ) -> Self {
        if api_key.is_none() {
            tracing::warn!("RAWG API key not configured; catalog requests will likely be rejected");
        }

        Self {
            http_client: http_client(REQUEST_TIMEOUT),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            popular: Arc::new(TtlCache::new(popular_ttl).with_empty_check(Vec::is_empty)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = http_client(timeout);
        self
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
        let builder = self.http_client.get(url);
        match &self.api_key {
            Some(key) => builder.query(&[("key", key.as_str())]),
            None => builder,
        }
    }

    /// GET + decode; a 404 is `None`, any other non-success is an error
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<Option<T>> {
        let response = self.request(path).query(query).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "RAWG API returned status {}: {}",
                status, body
            )));
        }

        Ok(Some(response.json().await?))
    }

    async fn fetch_list(&self, query: &[(&str, &str)]) -> AppResult<Vec<CatalogGame>> {
        let page: Option<RawgPage<RawgGame>> = self.fetch_json("games", query).await?;
        Ok(page
            .map(|p| p.results)
            .unwrap_or_default()
            .into_iter()
            .map(CatalogGame::from)
            .collect())
    }

    async fn fetch_details(&self, catalog_id: i64) -> AppResult<Option<GameDetails>> {
        let game_path = format!("games/{}", catalog_id);
        let screenshots_path = format!("games/{}/screenshots", catalog_id);
        let movies_path = format!("games/{}/movies", catalog_id);

        let (details, screenshots, movies) = tokio::join!(
            self.fetch_json::<RawgGameDetails>(&game_path, &[]),
            self.fetch_json::<RawgPage<RawgScreenshot>>(
                &screenshots_path,
                &[("page_size", SCREENSHOT_PAGE_SIZE)]
            ),
            self.fetch_json::<RawgPage<RawgMovie>>(&movies_path, &[]),
        );

        let Some(details) = details? else {
            return Ok(None);
        };

        let screenshots = media_or_empty(screenshots, "screenshots", catalog_id);
        let movies = media_or_empty(movies, "movies", catalog_id);

        Ok(Some(GameDetails::from_parts(details, screenshots, movies)))
    }
}

/// Media lists are optional extras; their failures never fail the detail view
fn media_or_empty<T>(
    result: AppResult<Option<RawgPage<T>>>,
    kind: &'static str,
    catalog_id: i64,
) -> Vec<T> {
    match result {
        Ok(page) => page.map(|p| p.results).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(catalog_id, kind, error = %e, "Catalog media fetch failed");
            Vec::new()
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for RawgProvider {
    async fn search(&self, query: &str) -> AppResult<Vec<CatalogGame>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache.as_ref(),
            CacheKey::CatalogSearch(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let games = self
                    .fetch_list(&[("search", query), ("page_size", SEARCH_PAGE_SIZE)])
                    .await?;

                tracing::info!(
                    query = %query,
                    results = games.len(),
                    provider = "rawg",
                    "Catalog search completed"
                );

                Ok::<_, AppError>(games)
            }
        )
    }

    async fn get_game(&self, catalog_id: i64) -> AppResult<Option<CatalogGame>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::CatalogGame(catalog_id),
            GAME_CACHE_TTL,
            async move {
                let game: Option<RawgGame> = self
                    .fetch_json(&format!("games/{}", catalog_id), &[])
                    .await?;
                Ok::<_, AppError>(game.map(CatalogGame::from))
            }
        )
    }

    async fn get_details(&self, catalog_id: i64) -> AppResult<Option<GameDetails>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::CatalogDetails(catalog_id),
            GAME_CACHE_TTL,
            self.fetch_details(catalog_id)
        )
    }

    async fn popular(&self) -> AppResult<PopularGames> {
        let served = self
            .popular
            .get_or_refresh(|| async {
                let games = self
                    .fetch_list(&[("ordering", "-rating"), ("page_size", POPULAR_PAGE_SIZE)])
                    .await?;
                tracing::info!(count = games.len(), provider = "rawg", "Popular list refreshed");
                Ok(games)
            })
            .await?;

        Ok(PopularGames {
            games: served.value,
            cached: served.from_cache,
        })
    }

    fn name(&self) -> &'static str {
        "rawg"
    }
}
