//! YouTube trailer lookup
//!
//! Resolves a game name to an autoplaying, muted, looping embed URL for the
//! first matching video. Missing credentials or an upstream rejection mean
//! "no trailer", not an error.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::AppResult,
    services::providers::{http_client, TrailerFinder, REQUEST_TIMEOUT},
};

pub const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Clone)]
pub struct YouTubeTrailers {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl YouTubeTrailers {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_api_url(api_key, YOUTUBE_SEARCH_URL.to_string())
    }

    pub fn with_api_url(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: http_client(REQUEST_TIMEOUT),
            api_key,
            api_url,
        }
    }
}

/// Embed URL that autoplays muted, hides controls and loops the single video
pub fn embed_url(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{id}?autoplay=1&mute=1&controls=0&loop=1&playlist={id}",
        id = video_id
    )
}

pub fn trailer_query(game_name: &str) -> String {
    format!("{} official trailer gameplay", game_name.trim())
}

#[async_trait::async_trait]
impl TrailerFinder for YouTubeTrailers {
    async fn find_trailer(&self, game_name: &str) -> AppResult<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("YouTube API key not configured, skipping trailer lookup");
            return Ok(None);
        };

        let query = trailer_query(game_name);
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("maxResults", "1"),
                ("videoDuration", "short"),
                ("key", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(
                game = %game_name,
                status = %response.status(),
                "YouTube search rejected trailer lookup"
            );
            return Ok(None);
        }

        let body: SearchResponse = response.json().await?;
        let trailer = body
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .map(|id| embed_url(&id));

        tracing::debug!(game = %game_name, found = trailer.is_some(), "Trailer lookup completed");

        Ok(trailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn search(Query(params): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        match params.get("q").map(String::as_str) {
            Some("Hades official trailer gameplay") => Ok(Json(json!({
                "items": [{"id": {"kind": "youtube#video", "videoId": "abc123"}}]
            }))),
            Some("Forbidden official trailer gameplay") => Err(StatusCode::FORBIDDEN),
            _ => Ok(Json(json!({"items": []}))),
        }
    }

    async fn spawn_search() -> String {
        let app = Router::new().route("/search", get(search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/search", addr)
    }

    #[test]
    fn test_embed_url_loops_single_video() {
        assert_eq!(
            embed_url("abc123"),
            "https://www.youtube.com/embed/abc123?autoplay=1&mute=1&controls=0&loop=1&playlist=abc123"
        );
    }

    #[test]
    fn test_trailer_query() {
        assert_eq!(trailer_query(" Hades "), "Hades official trailer gameplay");
    }

    #[tokio::test]
    async fn test_missing_key_is_no_trailer() {
        let trailers = YouTubeTrailers::with_api_url(None, "http://127.0.0.1:1".to_string());
        assert_eq!(trailers.find_trailer("Hades").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_first_result_becomes_embed_url() {
        let trailers = YouTubeTrailers::with_api_url(Some("key".to_string()), spawn_search().await);

        let trailer = trailers.find_trailer("Hades").await.unwrap();
        assert_eq!(trailer, Some(embed_url("abc123")));
    }

    #[tokio::test]
    async fn test_no_results_or_rejection_is_no_trailer() {
        let trailers = YouTubeTrailers::with_api_url(Some("key".to_string()), spawn_search().await);

        assert_eq!(trailers.find_trailer("Unknown Game").await.unwrap(), None);
        assert_eq!(trailers.find_trailer("Forbidden").await.unwrap(), None);
    }
}
