/// Read-through caching for catalog responses.
///
/// Looks the key up in the optional cache. On a hit the cached value is
/// returned. On a miss (or when no cache is configured, or the cache cannot be
/// reached) the block is awaited and, if it succeeds, its value is queued for
/// a background cache write.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`.
/// * `$key`: the `CacheKey` for this value.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: future producing `AppResult<T>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let games: Vec<CatalogGame> = cached!(
///     self.cache.as_ref(),
///     CacheKey::CatalogSearch(query.to_string()),
///     SEARCH_CACHE_TTL,
///     async move { self.fetch_search(query).await }
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache: Option<&$crate::db::Cache> = $cache;
        let key = $key;
        let hit = match cache {
            Some(cache) => cache.get_or_miss(&key).await,
            None => None,
        };
        match hit {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    if let Some(cache) = cache {
                        cache.set_in_background(&key, &value, $ttl);
                    }
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
