pub mod catalog;
pub mod game;
pub mod insights;

pub use catalog::{CatalogGame, GameDetails, Movie, PlatformRelease, PopularGames, StoreLink};
pub use game::{
    GameStatus, GameUpdate, LibrarySort, NamedRef, NewGame, TrackedGame, MAX_SCREENSHOTS,
};
pub use insights::{
    AnalyticsSummary, CandidateSource, ComparableGame, GenreStat, PlayedGame, RatedGame,
    SimilarGame, StatusCount, YearStat,
};
