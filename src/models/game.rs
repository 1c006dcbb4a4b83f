use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Maximum number of user screenshots attached to one library entry
pub const MAX_SCREENSHOTS: usize = 10;

/// Play status of a tracked game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Playing,
    Completed,
    Backlog,
    Dropped,
    Wishlist,
}

impl GameStatus {
    /// Every status, in display order
    pub const ALL: [GameStatus; 5] = [
        GameStatus::Playing,
        GameStatus::Completed,
        GameStatus::Backlog,
        GameStatus::Dropped,
        GameStatus::Wishlist,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GameStatus::Playing => "Playing",
            GameStatus::Completed => "Completed",
            GameStatus::Backlog => "Backlog",
            GameStatus::Dropped => "Dropped",
            GameStatus::Wishlist => "Wishlist",
        }
    }
}

/// A catalog genre or platform reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedRef {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A user's persisted library entry for one catalog game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedGame {
    /// Store key, assigned once at creation
    pub id: String,
    pub catalog_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_external: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_metacritic",
        skip_serializing_if = "Option::is_none"
    )]
    pub metacritic: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_refs")]
    pub genres: Vec<NamedRef>,
    #[serde(default, deserialize_with = "lenient_refs")]
    pub platforms: Vec<NamedRef>,
    /// Epoch millis of creation
    pub stored_at: i64,
    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<GameStatus>,
    #[serde(default)]
    pub is_favorite: bool,
    /// 1 to 5 stars
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_hours")]
    pub hours_played: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_screenshots")]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub platforms_owned: Vec<String>,
}

// ============================================================================
// Creation
// ============================================================================

/// Catalog result submitted for addition to the library
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    #[serde(default)]
    pub catalog_id: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rating_external: Option<f64>,
    #[serde(default)]
    pub metacritic: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_refs")]
    pub genres: Vec<NamedRef>,
    #[serde(default, deserialize_with = "lenient_refs")]
    pub platforms: Vec<NamedRef>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<GameStatus>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub user_rating: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_hours")]
    pub hours_played: f64,
    #[serde(default)]
    pub date_completed: Option<i64>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub platforms_owned: Vec<String>,
}

impl NewGame {
    pub fn new(catalog_id: i64, name: impl Into<String>) -> Self {
        Self {
            catalog_id: Some(catalog_id),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Rejects submissions that must never reach a backend
    pub fn validate(&self) -> AppResult<()> {
        if self.catalog_id.is_none() {
            return Err(AppError::Validation("catalogId is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if self.screenshots.len() > MAX_SCREENSHOTS {
            return Err(AppError::Validation(format!(
                "at most {} screenshots per game",
                MAX_SCREENSHOTS
            )));
        }
        Ok(())
    }

    /// Builds the stored record, assigning its id and creation time
    pub fn into_tracked(self, now_ms: i64) -> TrackedGame {
        let id = derive_id(self.catalog_id, self.slug.as_deref(), now_ms);

        TrackedGame {
            id,
            catalog_id: self.catalog_id.unwrap_or_default(),
            name: self.name.trim().to_string(),
            background_image: self.background_image,
            released: self.released,
            rating_external: self.rating_external,
            metacritic: self.metacritic,
            description: self.description,
            genres: self.genres,
            platforms: self.platforms,
            stored_at: now_ms,
            status: self.status,
            is_favorite: self.is_favorite,
            user_rating: self.user_rating,
            notes: self.notes,
            tags: normalize_tags(self.tags),
            hours_played: clamp_hours(self.hours_played),
            date_completed: self.date_completed,
            screenshots: self.screenshots,
            platforms_owned: self.platforms_owned,
        }
    }
}

/// Store id for a new record: catalog id, then slug, then creation time
pub fn derive_id(catalog_id: Option<i64>, slug: Option<&str>, now_ms: i64) -> String {
    if let Some(id) = catalog_id.filter(|id| *id != 0) {
        return id.to_string();
    }
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => slug.to_string(),
        None => now_ms.to_string(),
    }
}

// ============================================================================
// Partial update
// ============================================================================

/// Sparse field-level patch for a tracked game.
///
/// Present fields replace the stored value wholesale (lists are not merged).
/// For `status`, `userRating`, `notes` and `dateCompleted`, an explicit
/// `null` clears the field. `id`, `catalogId` and `storedAt` cannot be
/// patched; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub name: Option<String>,
    pub background_image: Option<String>,
    pub released: Option<String>,
    pub rating_external: Option<f64>,
    pub metacritic: Option<i32>,
    pub description: Option<String>,
    pub genres: Option<Vec<NamedRef>>,
    pub platforms: Option<Vec<NamedRef>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<GameStatus>>,
    pub is_favorite: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub user_rating: Option<Option<u8>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub hours_played: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub date_completed: Option<Option<i64>>,
    pub screenshots: Option<Vec<String>>,
    pub platforms_owned: Option<Vec<String>>,
}

impl GameUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("name cannot be empty".to_string()));
            }
        }
        if let Some(screenshots) = &self.screenshots {
            if screenshots.len() > MAX_SCREENSHOTS {
                return Err(AppError::Validation(format!(
                    "at most {} screenshots per game",
                    MAX_SCREENSHOTS
                )));
            }
        }
        Ok(())
    }

    /// Shallow-merges this patch into `game`
    pub fn apply(&self, game: &mut TrackedGame) {
        if let Some(name) = &self.name {
            game.name = name.trim().to_string();
        }
        if let Some(image) = &self.background_image {
            game.background_image = Some(image.clone());
        }
        if let Some(released) = &self.released {
            game.released = Some(released.clone());
        }
        if let Some(rating) = self.rating_external {
            game.rating_external = Some(rating);
        }
        if let Some(metacritic) = self.metacritic {
            game.metacritic = Some(metacritic);
        }
        if let Some(description) = &self.description {
            game.description = Some(description.clone());
        }
        if let Some(genres) = &self.genres {
            game.genres = genres.clone();
        }
        if let Some(platforms) = &self.platforms {
            game.platforms = platforms.clone();
        }
        if let Some(status) = self.status {
            game.status = status;
        }
        if let Some(favorite) = self.is_favorite {
            game.is_favorite = favorite;
        }
        if let Some(rating) = self.user_rating {
            game.user_rating = rating;
        }
        if let Some(notes) = &self.notes {
            game.notes = notes.clone();
        }
        if let Some(tags) = &self.tags {
            game.tags = normalize_tags(tags.clone());
        }
        if let Some(hours) = self.hours_played {
            game.hours_played = clamp_hours(hours);
        }
        if let Some(completed) = self.date_completed {
            game.date_completed = completed;
        }
        if let Some(screenshots) = &self.screenshots {
            game.screenshots = screenshots.clone();
        }
        if let Some(owned) = &self.platforms_owned {
            game.platforms_owned = owned.clone();
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Caller-side ordering for library listings
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LibrarySort {
    /// Most recently added first
    #[default]
    Recent,
    Name,
    /// Favorites first, then most recently added
    Favorites,
}

impl LibrarySort {
    pub fn apply(&self, games: &mut [TrackedGame]) {
        match self {
            LibrarySort::Recent => games.sort_by(|a, b| b.stored_at.cmp(&a.stored_at)),
            LibrarySort::Name => {
                games.sort_by_cached_key(|g| g.name.to_lowercase());
            }
            LibrarySort::Favorites => games.sort_by(|a, b| {
                b.is_favorite
                    .cmp(&a.is_favorite)
                    .then(b.stored_at.cmp(&a.stored_at))
            }),
        }
    }
}

// ============================================================================
// Read-boundary coercion
// ============================================================================

/// Keeps only string tags, trimmed, non-empty and first-occurrence unique.
/// Legacy records may carry numbers, nulls or objects in their tag lists.
pub fn sanitize_tags(values: Vec<Value>) -> Vec<String> {
    normalize_tags(
        values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(tag) => Some(tag),
                _ => None,
            })
            .collect(),
    )
}

pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

/// Hours are never negative; NaN and infinities read as zero
pub fn clamp_hours(hours: f64) -> f64 {
    if hours.is_finite() {
        hours.max(0.0)
    } else {
        0.0
    }
}

/// Accepts `{id, name}` or the catalog's nested `{platform: {id, name}}`;
/// anything else is dropped
fn ref_from_value(value: Value) -> Option<NamedRef> {
    let value = match value {
        Value::Object(mut map) if map.contains_key("platform") => map.remove("platform")?,
        other => other,
    };
    let name = value.get("name")?.as_str()?.to_string();
    let id = value.get("id").and_then(Value::as_i64).unwrap_or_default();
    Some(NamedRef { id, name })
}

fn lenient_refs<'de, D>(deserializer: D) -> Result<Vec<NamedRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter_map(ref_from_value).collect(),
        _ => Vec::new(),
    })
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => sanitize_tags(items),
        _ => Vec::new(),
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<GameStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().map(clamp_hours).unwrap_or_default())
}

/// Any finite number, rounded and clamped to 0..=5
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 5.0) as u8))
}

/// Any finite number, rounded and clamped to 0..=100
fn lenient_metacritic<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as i32))
}

fn lenient_screenshots<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .take(MAX_SCREENSHOTS)
            .collect(),
        _ => Vec::new(),
    })
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_game() -> TrackedGame {
        let mut candidate = NewGame::new(3498, "Grand Theft Auto V");
        candidate.genres = vec![NamedRef::new(4, "Action")];
        candidate.tags = vec!["open world".to_string()];
        candidate.hours_played = 12.5;
        candidate.into_tracked(1_700_000_000_000)
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&GameStatus::Wishlist).unwrap(),
            "\"wishlist\""
        );
        assert_eq!(GameStatus::Completed.label(), "Completed");
    }

    #[test]
    fn test_derive_id_prefers_catalog_id() {
        assert_eq!(derive_id(Some(3498), Some("gta-v"), 1), "3498");
    }

    #[test]
    fn test_derive_id_falls_back_to_slug_then_time() {
        assert_eq!(derive_id(None, Some("gta-v"), 1), "gta-v");
        assert_eq!(derive_id(Some(0), Some("  "), 1_700_000_000_000), "1700000000000");
    }

    #[test]
    fn test_validate_requires_catalog_id_and_name() {
        let mut candidate = NewGame::new(1, "  ");
        assert!(matches!(candidate.validate(), Err(AppError::Validation(_))));

        candidate.name = "Portal".to_string();
        candidate.catalog_id = None;
        assert!(matches!(candidate.validate(), Err(AppError::Validation(_))));

        candidate.catalog_id = Some(1);
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_too_many_screenshots() {
        let mut candidate = NewGame::new(1, "Portal");
        candidate.screenshots = vec!["https://img/x.png".to_string(); MAX_SCREENSHOTS + 1];
        assert!(matches!(candidate.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_into_tracked_sets_identity_and_defaults() {
        let game = sample_game();
        assert_eq!(game.id, "3498");
        assert_eq!(game.catalog_id, 3498);
        assert_eq!(game.stored_at, 1_700_000_000_000);
        assert!(!game.is_favorite);
        assert_eq!(game.status, None);
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let value = serde_json::to_value(sample_game()).unwrap();
        assert_eq!(value["catalogId"], 3498);
        assert_eq!(value["storedAt"], 1_700_000_000_000i64);
        assert_eq!(value["hoursPlayed"], 12.5);
        assert_eq!(value["isFavorite"], false);
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_read_filters_non_string_tags() {
        let raw = json!({
            "id": "1",
            "catalogId": 1,
            "name": "Celeste",
            "storedAt": 1,
            "tags": ["indie", 42, null, {"x": 1}, "indie", " platformer "]
        });
        let game: TrackedGame = serde_json::from_value(raw).unwrap();
        assert_eq!(game.tags, vec!["indie", "platformer"]);
    }

    #[test]
    fn test_read_coerces_malformed_optional_fields() {
        let raw = json!({
            "id": "1",
            "catalogId": 1,
            "name": "Celeste",
            "storedAt": 1,
            "genres": "not a list",
            "platforms": [{"platform": {"id": 4, "name": "PC"}}, {"name": "Switch"}, 7],
            "status": "abandoned",
            "hoursPlayed": -3,
            "tags": null
        });
        let game: TrackedGame = serde_json::from_value(raw).unwrap();
        assert!(game.genres.is_empty());
        assert_eq!(
            game.platforms,
            vec![NamedRef::new(4, "PC"), NamedRef::new(0, "Switch")]
        );
        assert_eq!(game.status, None);
        assert_eq!(game.hours_played, 0.0);
        assert!(game.tags.is_empty());
    }

    #[test]
    fn test_read_rounds_fractional_ratings() {
        let base = json!({"id": "1", "catalogId": 1, "name": "Celeste", "storedAt": 1});
        let read = |rating: Value, metacritic: Value| {
            let mut raw = base.clone();
            raw["userRating"] = rating;
            raw["metacritic"] = metacritic;
            serde_json::from_value::<TrackedGame>(raw).unwrap()
        };

        let game = read(json!(4.5), json!(91.6));
        assert_eq!(game.user_rating, Some(5));
        assert_eq!(game.metacritic, Some(92));

        let game = read(json!(9), json!(-4));
        assert_eq!(game.user_rating, Some(5));
        assert_eq!(game.metacritic, Some(0));

        let game = read(json!("four"), json!(null));
        assert_eq!(game.user_rating, None);
        assert_eq!(game.metacritic, None);
    }

    #[test]
    fn test_update_only_touches_supplied_fields() {
        let original = sample_game();
        let mut game = original.clone();
        let patch: GameUpdate = serde_json::from_value(json!({ "notes": "x" })).unwrap();
        patch.apply(&mut game);

        assert_eq!(game.notes.as_deref(), Some("x"));
        game.notes = original.notes.clone();
        assert_eq!(game, original);
    }

    #[test]
    fn test_update_null_clears_nullable_fields() {
        let mut game = sample_game();
        game.status = Some(GameStatus::Playing);
        game.user_rating = Some(4);

        let patch: GameUpdate =
            serde_json::from_value(json!({ "status": null, "userRating": null })).unwrap();
        patch.apply(&mut game);

        assert_eq!(game.status, None);
        assert_eq!(game.user_rating, None);
    }

    #[test]
    fn test_update_replaces_lists_and_clamps_hours() {
        let mut game = sample_game();
        let patch: GameUpdate = serde_json::from_value(json!({
            "tags": ["co-op", "co-op", ""],
            "hoursPlayed": -10.0,
            "id": "ignored",
            "storedAt": 5
        }))
        .unwrap();
        patch.apply(&mut game);

        assert_eq!(game.tags, vec!["co-op"]);
        assert_eq!(game.hours_played, 0.0);
        assert_eq!(game.id, "3498");
        assert_eq!(game.stored_at, 1_700_000_000_000);
    }

    #[test]
    fn test_update_validation() {
        let patch = GameUpdate {
            screenshots: Some(vec!["a".to_string(); MAX_SCREENSHOTS + 1]),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(AppError::Validation(_))));

        let patch = GameUpdate {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_library_sort_orders() {
        let mut a = sample_game();
        a.name = "beta".to_string();
        a.stored_at = 1;
        let mut b = sample_game();
        b.name = "Alpha".to_string();
        b.stored_at = 2;
        let mut c = sample_game();
        c.name = "gamma".to_string();
        c.stored_at = 3;
        a.is_favorite = true;

        let mut games = vec![a.clone(), b.clone(), c.clone()];
        LibrarySort::Recent.apply(&mut games);
        assert_eq!(games.iter().map(|g| g.stored_at).collect::<Vec<_>>(), vec![3, 2, 1]);

        LibrarySort::Name.apply(&mut games);
        assert_eq!(games[0].name, "Alpha");

        LibrarySort::Favorites.apply(&mut games);
        assert_eq!(games[0].name, "beta");
        assert_eq!(games[1].name, "gamma");
    }
}
