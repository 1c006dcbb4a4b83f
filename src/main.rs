use std::sync::Arc;

use questlog_api::{
    api::{create_router, AppState},
    config::Config,
    db::{
        create_redis_client, Cache, CacheWriterHandle, FileBackend, LibraryStore, RedisBackend,
        StorageBackend,
    },
    services::{RawgProvider, YouTubeTrailers},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("questlog_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Redis is optional: without it the library lives in the local file only
    // and catalog responses are not cached across restarts.
    let redis_client = config.redis_url.as_deref().and_then(|url| {
        create_redis_client(url)
            .map_err(|e| tracing::warn!(error = %e, "Invalid REDIS_URL, continuing without Redis"))
            .ok()
    });

    let primary = redis_client.clone().map(|client| {
        Arc::new(RedisBackend::new(client, config.library_key.clone())) as Arc<dyn StorageBackend>
    });
    let fallback: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(&config.library_file));
    let store = Arc::new(LibraryStore::new(primary, fallback));

    let (cache, cache_writer): (Option<Cache>, Option<CacheWriterHandle>) = match redis_client {
        Some(client) => {
            let (cache, handle) = Cache::new(client);
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let catalog = Arc::new(RawgProvider::new(
        config.rawg_api_key.clone(),
        config.rawg_api_url.clone(),
        cache,
    ));
    let trailers = Arc::new(YouTubeTrailers::new(config.youtube_api_key.clone()));

    let app = create_router(AppState::new(store, catalog, trailers));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
