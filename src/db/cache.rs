use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::error::AppResult;

/// A value served by `TtlCache`
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    /// True when the value did not come from the refresh just performed
    pub from_cache: bool,
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// Single-slot in-memory cache with a TTL and serve-stale-on-failure policy.
///
/// Within the TTL the stored value is returned without refreshing. After it,
/// the refresh runs; if the refresh fails and a previous value exists, that
/// stale value is served instead of the error. Values matching the empty check
/// never count as cached.
pub struct TtlCache<T> {
    ttl: Duration,
    is_empty: fn(&T) -> bool,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone + Send + Sync> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            is_empty: |_| false,
            entry: RwLock::new(None),
        }
    }

    /// Treats values matching `is_empty` as a miss, both fresh and stale
    pub fn with_empty_check(mut self, is_empty: fn(&T) -> bool) -> Self {
        self.is_empty = is_empty;
        self
    }

    fn usable<'a>(&self, entry: Option<&'a Entry<T>>) -> Option<&'a Entry<T>> {
        entry.filter(|e| !(self.is_empty)(&e.value))
    }

    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> AppResult<Cached<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(entry) = self.usable(self.entry.read().await.as_ref()) {
            if entry.stored_at.elapsed() < self.ttl {
                return Ok(Cached {
                    value: entry.value.clone(),
                    from_cache: true,
                });
            }
        }

        match refresh().await {
            Ok(value) => {
                *self.entry.write().await = Some(Entry {
                    value: value.clone(),
                    stored_at: Instant::now(),
                });
                Ok(Cached {
                    value,
                    from_cache: false,
                })
            }
            Err(e) => match self.usable(self.entry.read().await.as_ref()) {
                Some(entry) => {
                    tracing::warn!(
                        error = %e,
                        age_secs = entry.stored_at.elapsed().as_secs(),
                        "Refresh failed, serving stale cached value"
                    );
                    Ok(Cached {
                        value: entry.value.clone(),
                        from_cache: true,
                    })
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fresh_value_is_served_without_refresh() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let first = cache
            .get_or_refresh(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
        assert!(!first.from_cache);

        let second = cache
            .get_or_refresh(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9])
            })
            .await
            .unwrap();
        assert!(second.from_cache);
        assert_eq!(second.value, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_value_is_refreshed() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.get_or_refresh(|| async { Ok(1) }).await.unwrap();

        let refreshed = cache.get_or_refresh(|| async { Ok(2) }).await.unwrap();
        assert_eq!(refreshed.value, 2);
        assert!(!refreshed.from_cache);
    }

    #[tokio::test]
    async fn test_stale_value_served_when_refresh_fails() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.get_or_refresh(|| async { Ok("old") }).await.unwrap();

        let served = cache
            .get_or_refresh(|| async { Err(AppError::ExternalApi("down".to_string())) })
            .await
            .unwrap();
        assert_eq!(served.value, "old");
        assert!(served.from_cache);
    }

    #[tokio::test]
    async fn test_refresh_failure_without_value_is_an_error() {
        let cache: TtlCache<Vec<u8>> = TtlCache::new(Duration::from_secs(60));
        let result = cache
            .get_or_refresh(|| async { Err(AppError::ExternalApi("down".to_string())) })
            .await;
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }

    #[tokio::test]
    async fn test_empty_value_is_refreshed_within_ttl() {
        let cache: TtlCache<Vec<u8>> =
            TtlCache::new(Duration::from_secs(3600)).with_empty_check(Vec::is_empty);
        let first = cache.get_or_refresh(|| async { Ok(Vec::<u8>::new()) }).await.unwrap();
        assert!(first.value.is_empty());

        let second = cache.get_or_refresh(|| async { Ok(vec![1]) }).await.unwrap();
        assert_eq!(second.value, vec![1]);
        assert!(!second.from_cache);
    }

    #[tokio::test]
    async fn test_empty_value_is_not_served_as_stale() {
        let cache: TtlCache<Vec<u8>> = TtlCache::new(Duration::ZERO).with_empty_check(Vec::is_empty);
        cache.get_or_refresh(|| async { Ok(Vec::<u8>::new()) }).await.unwrap();

        let result = cache
            .get_or_refresh(|| async { Err(AppError::ExternalApi("down".to_string())) })
            .await;
        assert!(result.is_err());
    }
}
