use std::sync::Arc;

use crate::db::LibraryStore;
use crate::services::{CatalogProvider, TrailerFinder};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LibraryStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub trailers: Arc<dyn TrailerFinder>,
}

impl AppState {
    pub fn new(
        store: Arc<LibraryStore>,
        catalog: Arc<dyn CatalogProvider>,
        trailers: Arc<dyn TrailerFinder>,
    ) -> Self {
        Self {
            store,
            catalog,
            trailers,
        }
    }
}
