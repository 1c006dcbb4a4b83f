use serde::{Deserialize, Serialize};

use super::{CatalogGame, GameStatus, NamedRef, TrackedGame};

// ============================================================================
// Similarity
// ============================================================================

/// Where a similarity candidate came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Collection,
    Popular,
}

/// Common shape for library entries and catalog results when comparing games
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparableGame {
    /// Library store id, when the game is tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<i32>,
    #[serde(default)]
    pub genres: Vec<NamedRef>,
    #[serde(default)]
    pub platforms: Vec<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    pub source: CandidateSource,
}

impl ComparableGame {
    /// Overlays live catalog data onto this game. Catalog values win where
    /// present; empty catalog lists leave the stored lists alone.
    pub fn enrich_with(&mut self, catalog: CatalogGame) {
        self.catalog_id = Some(catalog.catalog_id);
        self.name = catalog.name;
        if catalog.background_image.is_some() {
            self.background_image = catalog.background_image;
        }
        if catalog.released.is_some() {
            self.released = catalog.released;
        }
        if catalog.rating.is_some() {
            self.rating = catalog.rating;
        }
        if catalog.metacritic.is_some() {
            self.metacritic = catalog.metacritic;
        }
        if !catalog.genres.is_empty() {
            self.genres = catalog.genres;
        }
        if !catalog.platforms.is_empty() {
            self.platforms = catalog.platforms;
        }
    }
}

impl From<&TrackedGame> for ComparableGame {
    fn from(game: &TrackedGame) -> Self {
        ComparableGame {
            id: Some(game.id.clone()),
            catalog_id: Some(game.catalog_id),
            name: game.name.clone(),
            background_image: game.background_image.clone(),
            released: game.released.clone(),
            rating: game.rating_external,
            metacritic: game.metacritic,
            genres: game.genres.clone(),
            platforms: game.platforms.clone(),
            status: game.status,
            user_rating: game.user_rating,
            source: CandidateSource::Collection,
        }
    }
}

impl From<CatalogGame> for ComparableGame {
    fn from(game: CatalogGame) -> Self {
        ComparableGame {
            id: None,
            catalog_id: Some(game.catalog_id),
            name: game.name,
            background_image: game.background_image,
            released: game.released,
            rating: game.rating,
            metacritic: game.metacritic,
            genres: game.genres,
            platforms: game.platforms,
            status: None,
            user_rating: None,
            source: CandidateSource::Popular,
        }
    }
}

/// A ranked similarity result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarGame {
    #[serde(flatten)]
    pub game: ComparableGame,
    /// 0-100
    pub match_score: u8,
    pub match_reasons: Vec<String>,
}

// ============================================================================
// Analytics
// ============================================================================

/// Derived library summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_games: usize,
    pub completed_games: usize,
    pub playing_games: usize,
    pub backlog_games: usize,
    pub dropped_games: usize,
    pub wishlist_games: usize,
    pub total_hours_played: f64,
    pub average_rating: f64,
    pub favorite_count: usize,
    pub genre_stats: Vec<GenreStat>,
    pub status_distribution: Vec<StatusCount>,
    pub yearly_stats: Vec<YearStat>,
    pub top_rated_games: Vec<RatedGame>,
    pub most_played_games: Vec<PlayedGame>,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenreStat {
    pub name: String,
    pub count: usize,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YearStat {
    pub year: i32,
    pub completed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatedGame {
    pub name: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayedGame {
    pub name: String,
    pub hours: f64,
}
