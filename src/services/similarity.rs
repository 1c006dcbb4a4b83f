use chrono::{Datelike, NaiveDate};

use crate::models::{ComparableGame, NamedRef, SimilarGame};

/// Maximum contribution of each factor to the match score
pub const GENRE_WEIGHT: f64 = 50.0;
pub const PLATFORM_WEIGHT: f64 = 30.0;
pub const RATING_WEIGHT: f64 = 20.0;
pub const YEAR_WEIGHT: f64 = 10.0;

pub const MAX_SCORE: u8 = 100;
pub const RATING_TOLERANCE: f64 = 1.5;
pub const YEAR_TOLERANCE: i32 = 2;

/// Score and reasons for one candidate before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Scores candidates against a single reference game
pub struct SimilarityEngine<'a> {
    reference: &'a ComparableGame,
    reference_year: Option<i32>,
}

impl<'a> SimilarityEngine<'a> {
    pub fn new(reference: &'a ComparableGame) -> Self {
        Self {
            reference,
            reference_year: reference.released.as_deref().and_then(release_year),
        }
    }

    /// True when the candidate is the reference game itself.
    /// Catalog ids decide when both sides have one; store ids otherwise.
    pub fn is_reference(&self, candidate: &ComparableGame) -> bool {
        match (self.reference.catalog_id, candidate.catalog_id) {
            (Some(a), Some(b)) => a == b,
            _ => match (&self.reference.id, &candidate.id) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Computes the match for one candidate. `None` means the candidate is
    /// the reference or shares nothing with it.
    pub fn score(&self, candidate: &ComparableGame) -> Option<MatchResult> {
        if self.is_reference(candidate) {
            return None;
        }

        let mut score = 0.0;
        let mut reasons = Vec::new();

        if let Some(overlap) = overlap(&self.reference.genres, &candidate.genres) {
            score += overlap.ratio * GENRE_WEIGHT;
            let plural = if overlap.shared > 1 { "s" } else { "" };
            reasons.push(format!("{} shared genre{}", overlap.shared, plural));
        }

        if let Some(overlap) = overlap(&self.reference.platforms, &candidate.platforms) {
            score += overlap.ratio * PLATFORM_WEIGHT;
            reasons.push(format!("Available on {}", overlap.first));
        }

        // A zero rating means "unrated" upstream
        let ref_rating = self.reference.rating.filter(|r| *r > 0.0);
        let cand_rating = candidate.rating.filter(|r| *r > 0.0);
        if let (Some(a), Some(b)) = (ref_rating, cand_rating) {
            if (a - b).abs() <= RATING_TOLERANCE {
                score += RATING_WEIGHT;
                reasons.push(format!("Similar rating ({:.1})", b));
            }
        }

        let cand_year = candidate.released.as_deref().and_then(release_year);
        if let (Some(a), Some(b)) = (self.reference_year, cand_year) {
            if (a - b).abs() <= YEAR_TOLERANCE {
                score += YEAR_WEIGHT;
                reasons.push(format!("Released {}", b));
            }
        }

        if score <= 0.0 || reasons.is_empty() {
            return None;
        }

        Some(MatchResult {
            score: score.round().min(MAX_SCORE as f64) as u8,
            reasons,
        })
    }

    /// Scores every candidate and returns the best `limit`, highest first.
    /// Equal scores keep their input order.
    pub fn rank(&self, candidates: &[ComparableGame], limit: usize) -> Vec<SimilarGame> {
        let mut matches: Vec<SimilarGame> = candidates
            .iter()
            .filter_map(|candidate| {
                self.score(candidate).map(|m| SimilarGame {
                    game: candidate.clone(),
                    match_score: m.score,
                    match_reasons: m.reasons,
                })
            })
            .collect();

        // sort_by is stable
        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        matches.truncate(limit);
        matches
    }
}

/// Ranks `candidates` by similarity to `reference`
pub fn find_similar(
    reference: &ComparableGame,
    candidates: &[ComparableGame],
    limit: usize,
) -> Vec<SimilarGame> {
    SimilarityEngine::new(reference).rank(candidates, limit)
}

/// Release year from a catalog date string (`YYYY-MM-DD`, or a bare year)
pub fn release_year(released: &str) -> Option<i32> {
    let released = released.trim();
    NaiveDate::parse_from_str(released, "%Y-%m-%d")
        .map(|date| date.year())
        .ok()
        .or_else(|| released.get(..4)?.parse().ok())
}

struct Overlap<'a> {
    shared: usize,
    ratio: f64,
    first: &'a str,
}

/// Case-insensitive name overlap. The first shared name keeps the
/// reference's spelling.
fn overlap<'a>(reference: &'a [NamedRef], candidate: &[NamedRef]) -> Option<Overlap<'a>> {
    if reference.is_empty() || candidate.is_empty() {
        return None;
    }

    let candidate_names: Vec<String> = candidate.iter().map(|r| r.name.to_lowercase()).collect();
    let shared: Vec<&NamedRef> = reference
        .iter()
        .filter(|r| candidate_names.contains(&r.name.to_lowercase()))
        .collect();

    let first = shared.first()?;
    Some(Overlap {
        shared: shared.len(),
        ratio: shared.len() as f64 / reference.len().max(candidate.len()) as f64,
        first: first.name.as_str(),
    })
}
