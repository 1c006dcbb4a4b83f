use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{
        AnalyticsSummary, CatalogGame, GameDetails, GameUpdate, LibrarySort, NewGame,
        PopularGames, SimilarGame, TrackedGame,
    },
    services::{library_analytics, similar_games, DEFAULT_SIMILAR_LIMIT},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub sort: LibrarySort,
}

#[derive(Debug, Deserialize)]
pub struct AddScreenshotsRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveScreenshotQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct TrailerQuery {
    #[serde(default)]
    pub game: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerResponse {
    pub trailer_url: Option<String>,
}

fn game_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Game {} not found", id))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List the library, ordered by `?sort=`
pub async fn list_games(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<TrackedGame>>> {
    let mut games = state.store.list().await?;
    params.sort.apply(&mut games);
    Ok(Json(games))
}

pub async fn add_game(
    State(state): State<AppState>,
    Json(candidate): Json<NewGame>,
) -> AppResult<(StatusCode, Json<TrackedGame>)> {
    let game = state.store.add(candidate).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TrackedGame>> {
    state
        .store
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| game_not_found(&id))
}

pub async fn update_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<GameUpdate>,
) -> AppResult<Json<TrackedGame>> {
    state
        .store
        .update(&id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| game_not_found(&id))
}

pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if state.store.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(game_not_found(&id))
    }
}

pub async fn add_screenshots(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddScreenshotsRequest>,
) -> AppResult<Json<TrackedGame>> {
    state
        .store
        .add_screenshots(&id, request.urls)
        .await?
        .map(Json)
        .ok_or_else(|| game_not_found(&id))
}

pub async fn remove_screenshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<RemoveScreenshotQuery>,
) -> AppResult<Json<TrackedGame>> {
    state
        .store
        .remove_screenshot(&id, &params.url)
        .await?
        .map(Json)
        .ok_or_else(|| game_not_found(&id))
}

/// Ranked similar games for one library entry
pub async fn get_similar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<Vec<SimilarGame>>> {
    let limit = params.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT);
    let similar = similar_games(&state.store, state.catalog.clone(), &id, limit).await?;
    Ok(Json(similar))
}

pub async fn get_analytics(State(state): State<AppState>) -> AppResult<Json<AnalyticsSummary>> {
    Ok(Json(library_analytics(&state.store).await?))
}

/// Catalog search passthrough
pub async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogGame>>> {
    let games = state.catalog.search(&params.q).await?;
    Ok(Json(games))
}

pub async fn get_catalog_details(
    State(state): State<AppState>,
    Path(catalog_id): Path<i64>,
) -> AppResult<Json<GameDetails>> {
    state
        .catalog
        .get_details(catalog_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Catalog game {} not found", catalog_id)))
}

pub async fn get_popular(State(state): State<AppState>) -> AppResult<Json<PopularGames>> {
    Ok(Json(state.catalog.popular().await?))
}

pub async fn get_trailer(
    State(state): State<AppState>,
    Query(params): Query<TrailerQuery>,
) -> AppResult<Json<TrailerResponse>> {
    let game = params.game.trim();
    if game.is_empty() {
        return Err(AppError::Validation("game name is required".to_string()));
    }

    let trailer_url = state.trailers.find_trailer(game).await?;
    Ok(Json(TrailerResponse { trailer_url }))
}
