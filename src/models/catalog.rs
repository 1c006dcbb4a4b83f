use serde::{Deserialize, Serialize};

use super::NamedRef;

/// Catalog game summary returned by search, lookup and the popular list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGame {
    pub catalog_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<NamedRef>,
    #[serde(default)]
    pub platforms: Vec<NamedRef>,
}

/// Popular list plus whether it came out of the gateway's cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularGames {
    pub games: Vec<CatalogGame>,
    pub cached: bool,
}

/// Full catalog detail for one game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    pub catalog_id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub released: Option<String>,
    pub background_image: Option<String>,
    pub background_image_additional: Option<String>,
    pub rating: Option<f64>,
    pub rating_top: Option<i32>,
    pub ratings_count: Option<i64>,
    pub metacritic: Option<i32>,
    pub playtime: Option<i32>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub platforms: Vec<PlatformRelease>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub esrb_rating: Option<String>,
    pub stores: Vec<StoreLink>,
    pub website: Option<String>,
    pub screenshots: Vec<String>,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRelease {
    pub name: String,
    pub slug: Option<String>,
    pub released_at: Option<String>,
    pub requirements: Option<PlatformRequirements>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformRequirements {
    #[serde(default)]
    pub minimum: Option<String>,
    #[serde(default)]
    pub recommended: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreLink {
    pub name: String,
    pub slug: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub name: String,
    pub preview: Option<String>,
    pub video_480: Option<String>,
    pub video_max: Option<String>,
}

// ============================================================================
// RAWG API Types
// ============================================================================

/// Paged list envelope used by every RAWG collection endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawgPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgRef {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl From<RawgRef> for NamedRef {
    fn from(raw: RawgRef) -> Self {
        NamedRef::new(raw.id, raw.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgPlatformEntry {
    pub platform: RawgRef,
    #[serde(default)]
    pub released_at: Option<String>,
    #[serde(default)]
    pub requirements: Option<PlatformRequirements>,
}

/// Game record from `/games` and `/games/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct RawgGame {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub metacritic: Option<i32>,
    #[serde(default)]
    pub description_raw: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<RawgRef>>,
    #[serde(default)]
    pub platforms: Option<Vec<RawgPlatformEntry>>,
}

impl From<RawgGame> for CatalogGame {
    fn from(raw: RawgGame) -> Self {
        CatalogGame {
            catalog_id: raw.id,
            slug: raw.slug,
            name: raw.name,
            background_image: raw.background_image,
            released: raw.released,
            rating: raw.rating,
            metacritic: raw.metacritic,
            description: raw.description_raw.or(raw.description),
            genres: raw
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(NamedRef::from)
                .collect(),
            platforms: raw
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|entry| NamedRef::from(entry.platform))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgTag {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgStoreEntry {
    #[serde(default)]
    pub url: Option<String>,
    pub store: RawgRef,
}

/// Extra fields only present on the detail endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RawgGameDetails {
    #[serde(flatten)]
    pub game: RawgGame,
    #[serde(default)]
    pub background_image_additional: Option<String>,
    #[serde(default)]
    pub rating_top: Option<i32>,
    #[serde(default)]
    pub ratings_count: Option<i64>,
    #[serde(default)]
    pub playtime: Option<i32>,
    #[serde(default)]
    pub developers: Option<Vec<RawgRef>>,
    #[serde(default)]
    pub publishers: Option<Vec<RawgRef>>,
    #[serde(default)]
    pub tags: Option<Vec<RawgTag>>,
    #[serde(default)]
    pub esrb_rating: Option<RawgRef>,
    #[serde(default)]
    pub stores: Option<Vec<RawgStoreEntry>>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgScreenshot {
    pub image: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgMovie {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub data: Option<RawgMovieData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgMovieData {
    #[serde(rename = "480", default)]
    pub low: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

/// Max English tags kept on a detail record
pub const DETAIL_TAG_LIMIT: usize = 15;

impl GameDetails {
    /// Assembles the detail view from the three catalog responses
    pub fn from_parts(
        raw: RawgGameDetails,
        screenshots: Vec<RawgScreenshot>,
        movies: Vec<RawgMovie>,
    ) -> Self {
        let names = |refs: Option<Vec<RawgRef>>| -> Vec<String> {
            refs.unwrap_or_default().into_iter().map(|r| r.name).collect()
        };

        let game = raw.game;
        GameDetails {
            catalog_id: game.id,
            name: game.name,
            slug: game.slug,
            description: game.description_raw.or(game.description).unwrap_or_default(),
            released: game.released,
            background_image: game.background_image,
            background_image_additional: raw.background_image_additional,
            rating: game.rating,
            rating_top: raw.rating_top,
            ratings_count: raw.ratings_count,
            metacritic: game.metacritic,
            playtime: raw.playtime,
            developers: names(raw.developers),
            publishers: names(raw.publishers),
            platforms: game
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|entry| PlatformRelease {
                    name: entry.platform.name,
                    slug: entry.platform.slug,
                    released_at: entry.released_at,
                    requirements: entry.requirements,
                })
                .collect(),
            genres: names(game.genres),
            tags: raw
                .tags
                .unwrap_or_default()
                .into_iter()
                .filter(|t| t.language.as_deref() == Some("eng"))
                .map(|t| t.name)
                .take(DETAIL_TAG_LIMIT)
                .collect(),
            esrb_rating: raw.esrb_rating.map(|r| r.name),
            stores: raw
                .stores
                .unwrap_or_default()
                .into_iter()
                .map(|entry| StoreLink {
                    name: entry.store.name,
                    slug: entry.store.slug,
                    url: entry.url,
                })
                .collect(),
            website: raw.website.filter(|w| !w.is_empty()),
            screenshots: screenshots.into_iter().map(|s| s.image).collect(),
            movies: movies
                .into_iter()
                .map(|m| {
                    let data = m.data;
                    Movie {
                        id: m.id,
                        name: m.name,
                        preview: m.preview,
                        video_480: data.as_ref().and_then(|d| d.low.clone()),
                        video_max: data.and_then(|d| d.max),
                    }
                })
                .collect(),
        }
    }
}
