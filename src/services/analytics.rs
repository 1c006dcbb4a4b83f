use std::collections::BTreeMap;

use crate::{
    db::LibraryStore,
    error::AppResult,
    models::{
        AnalyticsSummary, GameStatus, GenreStat, PlayedGame, RatedGame, StatusCount, TrackedGame,
        YearStat,
    },
    services::similarity::release_year,
};

const TOP_GENRES: usize = 10;
const TOP_GAMES: usize = 5;
const TOP_RATED_THRESHOLD: u8 = 4;

/// Loads the current library and summarizes it
pub async fn library_analytics(store: &LibraryStore) -> AppResult<AnalyticsSummary> {
    let games = store.list().await?;
    let summary = summarize(&games);

    tracing::debug!(
        total = summary.total_games,
        completion_rate = summary.completion_rate,
        "Library analytics computed"
    );

    Ok(summary)
}

/// Derives the analytics view from a library snapshot
pub fn summarize(games: &[TrackedGame]) -> AnalyticsSummary {
    let count_status = |status: GameStatus| games.iter().filter(|g| g.status == Some(status)).count();

    let total_games = games.len();
    let completed_games = count_status(GameStatus::Completed);

    // Unrated is None or 0
    let ratings: Vec<u8> = games.iter().filter_map(user_rating).collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        round1(ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64)
    };

    let status_distribution = GameStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.label().to_string(),
            count: count_status(*status),
        })
        .filter(|s| s.count > 0)
        .collect();

    let completion_rate = if total_games == 0 {
        0.0
    } else {
        round1(completed_games as f64 / total_games as f64 * 100.0)
    };

    AnalyticsSummary {
        total_games,
        completed_games,
        playing_games: count_status(GameStatus::Playing),
        backlog_games: count_status(GameStatus::Backlog),
        dropped_games: count_status(GameStatus::Dropped),
        wishlist_games: count_status(GameStatus::Wishlist),
        total_hours_played: games.iter().map(|g| g.hours_played).sum(),
        average_rating,
        favorite_count: games.iter().filter(|g| g.is_favorite).count(),
        genre_stats: genre_stats(games),
        status_distribution,
        yearly_stats: yearly_stats(games),
        top_rated_games: top_rated(games),
        most_played_games: most_played(games),
        completion_rate,
    }
}

fn user_rating(game: &TrackedGame) -> Option<u8> {
    game.user_rating.filter(|r| *r > 0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Top genres by occurrence; ties keep first-seen order
fn genre_stats(games: &[TrackedGame]) -> Vec<GenreStat> {
    struct Tally<'a> {
        name: &'a str,
        count: usize,
        rating_sum: f64,
        rated: usize,
    }

    let mut tallies: Vec<Tally> = Vec::new();
    for game in games {
        let rating = user_rating(game);
        for genre in &game.genres {
            let idx = match tallies.iter().position(|t| t.name == genre.name) {
                Some(idx) => idx,
                None => {
                    tallies.push(Tally {
                        name: &genre.name,
                        count: 0,
                        rating_sum: 0.0,
                        rated: 0,
                    });
                    tallies.len() - 1
                }
            };
            let tally = &mut tallies[idx];
            tally.count += 1;
            if let Some(rating) = rating {
                tally.rating_sum += rating as f64;
                tally.rated += 1;
            }
        }
    }

    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies
        .into_iter()
        .take(TOP_GENRES)
        .map(|t| GenreStat {
            name: t.name.to_string(),
            count: t.count,
            avg_rating: if t.rated > 0 {
                t.rating_sum / t.rated as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Completed games per release year, ascending
fn yearly_stats(games: &[TrackedGame]) -> Vec<YearStat> {
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for game in games.iter().filter(|g| g.status == Some(GameStatus::Completed)) {
        if let Some(year) = game.released.as_deref().and_then(release_year) {
            *years.entry(year).or_default() += 1;
        }
    }

    years
        .into_iter()
        .map(|(year, completed)| YearStat { year, completed })
        .collect()
}

fn top_rated(games: &[TrackedGame]) -> Vec<RatedGame> {
    let mut rated: Vec<RatedGame> = games
        .iter()
        .filter_map(|g| {
            user_rating(g)
                .filter(|r| *r >= TOP_RATED_THRESHOLD)
                .map(|rating| RatedGame {
                    name: g.name.clone(),
                    rating,
                })
        })
        .collect();
    rated.sort_by(|a, b| b.rating.cmp(&a.rating));
    rated.truncate(TOP_GAMES);
    rated
}

fn most_played(games: &[TrackedGame]) -> Vec<PlayedGame> {
    let mut played: Vec<PlayedGame> = games
        .iter()
        .filter(|g| g.hours_played > 0.0)
        .map(|g| PlayedGame {
            name: g.name.clone(),
            hours: g.hours_played,
        })
        .collect();
    played.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    played.truncate(TOP_GAMES);
    played
}
