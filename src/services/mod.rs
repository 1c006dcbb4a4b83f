pub mod analytics;
pub mod providers;
pub mod recommendations;
pub mod similarity;

pub use analytics::{library_analytics, summarize};
pub use providers::{CatalogProvider, RawgProvider, TrailerFinder, YouTubeTrailers};
pub use recommendations::{similar_games, DEFAULT_SIMILAR_LIMIT};
pub use similarity::find_similar;
