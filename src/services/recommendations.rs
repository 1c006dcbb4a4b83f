use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::LibraryStore,
    error::{AppError, AppResult},
    models::{ComparableGame, SimilarGame, TrackedGame},
    services::{providers::CatalogProvider, similarity::find_similar},
};

/// Default number of similar games returned
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;

/// Maximum popular-list entries added to the candidate pool
pub const POPULAR_POOL_SIZE: usize = 100;

/// Per-entry budget for a catalog lookup during enrichment
pub const ENRICH_TIMEOUT: Duration = Duration::from_secs(5);

/// Finds games similar to the library entry `id`
///
/// The pool is the whole library, refreshed with live catalog data, plus the
/// head of the popular list. The reference comes out of the same enriched
/// snapshot.
pub async fn similar_games(
    store: &LibraryStore,
    catalog: Arc<dyn CatalogProvider>,
    id: &str,
    limit: usize,
) -> AppResult<Vec<SimilarGame>> {
    let library = store.list().await?;
    if !library.iter().any(|g| g.id == id) {
        return Err(AppError::NotFound(format!("Game {} not found", id)));
    }

    let enriched = enrich_library(catalog.clone(), &library).await;
    let reference = enriched
        .iter()
        .find(|g| g.id.as_deref() == Some(id))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Game {} not found", id)))?;

    let pool = build_candidate_pool(catalog.as_ref(), enriched).await;
    let similar = find_similar(&reference, &pool, limit);

    tracing::info!(
        game_id = %id,
        pool_size = pool.len(),
        matches = similar.len(),
        "Similar games computed"
    );

    Ok(similar)
}

/// Refreshes each library entry from the catalog, one task per entry.
/// An entry whose lookup fails keeps its stored fields.
pub async fn enrich_library(
    catalog: Arc<dyn CatalogProvider>,
    games: &[TrackedGame],
) -> Vec<ComparableGame> {
    enrich_library_within(catalog, games, ENRICH_TIMEOUT).await
}

/// `enrich_library` with an explicit per-entry timeout; a lookup that
/// exceeds it counts as failed
pub async fn enrich_library_within(
    catalog: Arc<dyn CatalogProvider>,
    games: &[TrackedGame],
    timeout: Duration,
) -> Vec<ComparableGame> {
    let mut tasks = Vec::with_capacity(games.len());

    for game in games {
        // Entries without a catalog id have nothing to look up
        let task = (game.catalog_id > 0).then(|| {
            let catalog = catalog.clone();
            let catalog_id = game.catalog_id;
            tokio::spawn(async move {
                tokio::time::timeout(timeout, catalog.get_game(catalog_id))
                    .await
                    .unwrap_or_else(|_| {
                        Err(AppError::ExternalApi(format!(
                            "catalog lookup for {} timed out after {:?}",
                            catalog_id, timeout
                        )))
                    })
            })
        });
        tasks.push(task);
    }

    let mut pool = Vec::with_capacity(games.len());
    let mut failures = 0usize;

    for (game, task) in games.iter().zip(tasks) {
        let mut comparable = ComparableGame::from(game);

        if let Some(task) = task {
            match task.await {
                Ok(Ok(Some(live))) => comparable.enrich_with(live),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::debug!(game_id = %game.id, error = %e, "Catalog enrichment failed");
                }
                Err(e) => {
                    failures += 1;
                    tracing::debug!(game_id = %game.id, error = %e, "Catalog enrichment task failed");
                }
            }
        }

        pool.push(comparable);
    }

    if failures > 0 {
        tracing::warn!(
            enriched = games.len() - failures,
            error_count = failures,
            "Partial catalog enrichment failure"
        );
    }

    pool
}

/// Library entries followed by popular games that are not already tracked
pub async fn build_candidate_pool(
    catalog: &dyn CatalogProvider,
    library: Vec<ComparableGame>,
) -> Vec<ComparableGame> {
    let popular = match catalog.popular().await {
        Ok(popular) => popular.games,
        Err(e) => {
            tracing::warn!(error = %e, "Popular list unavailable, using library only");
            Vec::new()
        }
    };

    let tracked: HashSet<i64> = library.iter().filter_map(|g| g.catalog_id).collect();

    let mut pool = library;
    pool.extend(
        popular
            .into_iter()
            .take(POPULAR_POOL_SIZE)
            .filter(|g| !tracked.contains(&g.catalog_id))
            .map(ComparableGame::from),
    );
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FileBackend;
    use crate::models::{
        CandidateSource, CatalogGame, GameDetails, NamedRef, NewGame, PopularGames,
    };
    use crate::services::providers::MockCatalogProvider;
    use tempfile::TempDir;

    fn catalog_game(id: i64, genres: &[&str]) -> CatalogGame {
        CatalogGame {
            catalog_id: id,
            slug: None,
            name: format!("Popular {}", id),
            background_image: None,
            released: None,
            rating: None,
            metacritic: None,
            description: None,
            genres: genres.iter().map(|n| NamedRef::new(0, *n)).collect(),
            platforms: vec![],
        }
    }

    fn file_store(dir: &TempDir) -> LibraryStore {
        LibraryStore::new(
            None,
            Arc::new(FileBackend::new(dir.path().join("games.json"))),
        )
    }

    fn library_game(catalog_id: i64, genres: &[&str]) -> TrackedGame {
        let mut candidate = NewGame::new(catalog_id, format!("Tracked {}", catalog_id));
        candidate.genres = genres.iter().map(|n| NamedRef::new(0, *n)).collect();
        candidate.into_tracked(1)
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_stored_fields() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_get_game().returning(|id| {
            if id == 1 {
                Err(AppError::ExternalApi("timeout".to_string()))
            } else {
                Ok(Some(catalog_game(id, &["Shooter"])))
            }
        });

        let games = vec![library_game(1, &["RPG"]), library_game(2, &["RPG"])];
        let pool = enrich_library(Arc::new(catalog), &games).await;

        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].name, "Tracked 1");
        assert_eq!(pool[0].genres[0].name, "RPG");
        assert_eq!(pool[1].name, "Popular 2");
        assert_eq!(pool[1].genres[0].name, "Shooter");
        assert!(pool.iter().all(|g| g.source == CandidateSource::Collection));
    }

    /// Catalog whose lookup for id 1 never answers
    struct StalledCatalog;

    #[async_trait::async_trait]
    impl CatalogProvider for StalledCatalog {
        async fn search(&self, _query: &str) -> AppResult<Vec<CatalogGame>> {
            Ok(vec![])
        }

        async fn get_game(&self, catalog_id: i64) -> AppResult<Option<CatalogGame>> {
            if catalog_id == 1 {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(Some(catalog_game(catalog_id, &["Shooter"])))
        }

        async fn get_details(&self, _catalog_id: i64) -> AppResult<Option<GameDetails>> {
            Ok(None)
        }

        async fn popular(&self) -> AppResult<PopularGames> {
            Ok(PopularGames {
                games: vec![],
                cached: false,
            })
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_stalled_lookup_does_not_hold_up_the_rest() {
        let games = vec![library_game(1, &["RPG"]), library_game(2, &["RPG"])];

        let started = std::time::Instant::now();
        let pool =
            enrich_library_within(Arc::new(StalledCatalog), &games, Duration::from_millis(50))
                .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].name, "Tracked 1");
        assert_eq!(pool[0].genres[0].name, "RPG");
        assert_eq!(pool[1].name, "Popular 2");
    }

    #[tokio::test]
    async fn test_pool_skips_tracked_popular_games_and_caps_popular() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_popular().returning(|| {
            Ok(PopularGames {
                games: (1..=150).map(|id| catalog_game(id, &[])).collect(),
                cached: false,
            })
        });

        let library = vec![ComparableGame::from(&library_game(5, &[]))];
        let pool = build_candidate_pool(&catalog, library).await;

        // first 100 popular entries minus the tracked one, plus the library entry
        assert_eq!(pool.len(), 100);
        assert_eq!(pool[0].source, CandidateSource::Collection);
        assert_eq!(
            pool.iter().filter(|g| g.catalog_id == Some(5)).count(),
            1
        );
        assert!(pool.iter().all(|g| g.catalog_id <= Some(100)));
    }

    #[tokio::test]
    async fn test_popular_failure_leaves_library_only() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_popular()
            .returning(|| Err(AppError::ExternalApi("down".to_string())));

        let library = vec![ComparableGame::from(&library_game(5, &[]))];
        let pool = build_candidate_pool(&catalog, library).await;
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_similar_games_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        let catalog = MockCatalogProvider::new();

        let result = similar_games(&store, Arc::new(catalog), "missing", 5).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_similar_games_ranks_library_and_popular() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);

        let mut a = NewGame::new(1, "A");
        a.genres = vec![NamedRef::new(5, "RPG"), NamedRef::new(4, "Action")];
        a.platforms = vec![NamedRef::new(4, "PC")];
        a.rating_external = Some(4.2);
        a.released = Some("2020-05-01".to_string());
        store.add(a).await.unwrap();

        let mut b = NewGame::new(2, "B");
        b.genres = vec![NamedRef::new(5, "RPG")];
        b.platforms = vec![NamedRef::new(4, "PC"), NamedRef::new(187, "PS5")];
        b.rating_external = Some(4.0);
        b.released = Some("2021-01-01".to_string());
        store.add(b).await.unwrap();

        let mut catalog = MockCatalogProvider::new();
        catalog.expect_get_game().returning(|_| Ok(None));
        catalog.expect_popular().returning(|| {
            Ok(PopularGames {
                games: vec![
                    catalog_game(2, &["RPG"]),
                    catalog_game(30, &["Action"]),
                    catalog_game(31, &["Puzzle"]),
                ],
                cached: true,
            })
        });

        let similar = similar_games(&store, Arc::new(catalog), "1", DEFAULT_SIMILAR_LIMIT)
            .await
            .unwrap();

        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].game.name, "B");
        assert_eq!(similar[0].match_score, 70);
        assert_eq!(similar[0].game.source, CandidateSource::Collection);
        assert_eq!(similar[1].game.catalog_id, Some(30));
        assert_eq!(similar[1].match_score, 25);
        assert_eq!(similar[1].game.source, CandidateSource::Popular);
    }
}
