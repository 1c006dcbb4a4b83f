use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::StorageBackend,
    error::{AppError, AppResult},
    models::{GameUpdate, NewGame, TrackedGame, MAX_SCREENSHOTS},
};

/// Runs one logical operation against the primary backend, then against the
/// fallback if the primary is absent or fails.
///
/// Every call tries the primary first, so a recovered primary is picked up
/// again without any re-promotion step. A primary failure is only logged; the
/// caller sees an error only when the fallback fails too.
///
/// # Arguments
/// * `$store`: the `LibraryStore`.
/// * `$op`: operation name for logs.
/// * `$backend`: identifier bound to `&dyn StorageBackend` inside `$body`.
/// * `$body`: future producing `AppResult<T>` for one backend.
macro_rules! with_fallback {
    ($store:expr, $op:literal, |$backend:ident| $body:expr) => {{
        let mut outcome = None;

        if let Some(primary) = $store.primary.as_deref() {
            let $backend: &dyn StorageBackend = primary;
            match $body.await {
                Ok(value) => outcome = Some(value),
                Err(e) => tracing::warn!(
                    op = $op,
                    backend = primary.name(),
                    error = %e,
                    "Primary backend failed, falling back"
                ),
            }
        }

        match outcome {
            Some(value) => Ok(value),
            None => {
                let $backend: &dyn StorageBackend = $store.fallback.as_ref();
                $body.await.map_err(|e| {
                    tracing::error!(
                        op = $op,
                        backend = $backend.name(),
                        error = %e,
                        "Fallback backend failed"
                    );
                    AppError::Storage(format!("{} failed on every backend: {}", $op, e))
                })
            }
        }
    }};
}

/// Durable CRUD over the user's tracked games
///
/// Holds an optional primary backend (Redis) and a mandatory fallback
/// (local file). The two are not kept in sync: a write that lands on the
/// fallback while the primary is down will not show up once the primary is
/// reachable again.
pub struct LibraryStore {
    primary: Option<Arc<dyn StorageBackend>>,
    fallback: Arc<dyn StorageBackend>,
}

impl LibraryStore {
    pub fn new(
        primary: Option<Arc<dyn StorageBackend>>,
        fallback: Arc<dyn StorageBackend>,
    ) -> Self {
        match &primary {
            Some(primary) => tracing::info!(
                primary = primary.name(),
                fallback = fallback.name(),
                "Library store configured"
            ),
            None => tracing::info!(
                fallback = fallback.name(),
                "Library store configured without primary backend"
            ),
        }

        Self { primary, fallback }
    }

    /// Validates and stores a new record. A record with the same derived id
    /// is replaced.
    pub async fn add(&self, candidate: NewGame) -> AppResult<TrackedGame> {
        candidate.validate()?;
        let record = candidate.into_tracked(Utc::now().timestamp_millis());

        with_fallback!(self, "add", |backend| backend.put(&record))?;

        tracing::info!(game_id = %record.id, name = %record.name, "Game added to library");
        Ok(record)
    }

    pub async fn list(&self) -> AppResult<Vec<TrackedGame>> {
        with_fallback!(self, "list", |backend| backend.list())
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Option<TrackedGame>> {
        with_fallback!(self, "get", |backend| backend.get(id))
    }

    /// Shallow-merges `patch` into the record; `None` when the id is unknown
    pub async fn update(&self, id: &str, patch: GameUpdate) -> AppResult<Option<TrackedGame>> {
        patch.validate()?;

        let updated = with_fallback!(self, "update", |backend| update_on(backend, id, &patch))?;

        if updated.is_some() {
            tracing::info!(game_id = %id, "Game updated");
        } else {
            tracing::debug!(game_id = %id, "Update for unknown game");
        }
        Ok(updated)
    }

    /// Hard delete; false when the id is unknown
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let removed = with_fallback!(self, "delete", |backend| backend.remove(id))?;

        if removed {
            tracing::info!(game_id = %id, "Game removed from library");
        }
        Ok(removed)
    }

    /// Appends screenshot URLs, rejecting the whole batch if it would push
    /// the record past `MAX_SCREENSHOTS`
    pub async fn add_screenshots(
        &self,
        id: &str,
        urls: Vec<String>,
    ) -> AppResult<Option<TrackedGame>> {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        if urls.is_empty() {
            return Err(AppError::Validation("no screenshot URLs supplied".to_string()));
        }

        let Some(game) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        if game.screenshots.len() + urls.len() > MAX_SCREENSHOTS {
            return Err(AppError::Validation(format!(
                "maximum {} screenshots per game allowed ({} already stored)",
                MAX_SCREENSHOTS,
                game.screenshots.len()
            )));
        }

        let mut screenshots = game.screenshots;
        screenshots.extend(urls);

        self.update(
            id,
            GameUpdate {
                screenshots: Some(screenshots),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn remove_screenshot(&self, id: &str, url: &str) -> AppResult<Option<TrackedGame>> {
        let Some(game) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let screenshots: Vec<String> = game.screenshots.into_iter().filter(|s| s != url).collect();

        self.update(
            id,
            GameUpdate {
                screenshots: Some(screenshots),
                ..Default::default()
            },
        )
        .await
    }
}

/// Read-merge-write of one record on a single backend
async fn update_on(
    backend: &dyn StorageBackend,
    id: &str,
    patch: &GameUpdate,
) -> AppResult<Option<TrackedGame>> {
    let Some(mut game) = backend.get(id).await? else {
        return Ok(None);
    };

    patch.apply(&mut game);
    backend.put(&game).await?;
    Ok(Some(game))
}
