use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{Condition, Filter, Range, SearchPoints, WithPayloadSelector};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{EngineError, EngineResult};
use crate::vector::similarity::cosine_similarity;
use crate::vector::storage::{get_player_vector, index_err};
use crate::vector::{client, PLAYER_COLLECTION, TARGET_VECTOR};

pub const MAX_RESULTS: i64 = 100;
pub const DEFAULT_RESULTS: i64 = 10;

/// Scouting constraints applied before ranking. Every populated field is a
/// hard predicate; candidates failing any of them never enter the ranked set.
#[derive(Debug, Clone)]
pub struct SimilarityFilter {
    pub position: Option<String>,
    pub nationality: Option<String>,
    pub exclude_clubs: Vec<String>,
    pub min_minutes: i64,
    pub max_age: Option<i64>,
    pub k: i64,
}

impl Default for SimilarityFilter {
    fn default() -> Self {
        Self {
            position: None,
            nationality: None,
            exclude_clubs: Vec::new(),
            min_minutes: 0,
            max_age: None,
            k: DEFAULT_RESULTS,
        }
    }
}

impl SimilarityFilter {
    pub fn validate(&self) -> EngineResult<()> {
        if self.k < 1 || self.k > MAX_RESULTS {
            return Err(EngineError::InvalidFilter(format!(
                "k must be between 1 and {}, got {}",
                MAX_RESULTS, self.k
            )));
        }
        if self.min_minutes < 0 {
            return Err(EngineError::InvalidFilter(format!(
                "min_minutes must be non-negative, got {}",
                self.min_minutes
            )));
        }
        if let Some(age) = self.max_age {
            if age < 0 {
                return Err(EngineError::InvalidFilter(format!(
                    "max_age must be non-negative, got {}",
                    age
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarPlayer {
    pub id: i64,
    pub full_name: String,
    pub club: String,
    pub score: f32,
}

/// One candidate for the in-memory ranking path.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: i64,
    pub full_name: String,
    pub club: String,
    pub position: String,
    pub nationality: String,
    pub minutes: i64,
    pub age: i64,
    pub vector: Vec<f32>,
}

/// Rank candidates against a reference player entirely in memory.
///
/// The reference itself and anyone at the reference's club are always
/// excluded; a scout searching for a replacement never wants the player
/// being replaced or a teammate. Ties break on ascending id so results are
/// stable across runs.
pub fn rank_candidates(
    reference_id: i64,
    reference_club: &str,
    reference_vector: &[f32],
    candidates: &[Candidate],
    filter: &SimilarityFilter,
) -> EngineResult<Vec<SimilarPlayer>> {
    filter.validate()?;

    let mut scored: Vec<SimilarPlayer> = Vec::new();
    for c in candidates {
        if c.id == reference_id || c.club == reference_club {
            continue;
        }
        if let Some(pos) = &filter.position {
            if &c.position != pos {
                continue;
            }
        }
        if let Some(nat) = &filter.nationality {
            if &c.nationality != nat {
                continue;
            }
        }
        if filter.exclude_clubs.iter().any(|club| club == &c.club) {
            continue;
        }
        if c.minutes < filter.min_minutes {
            continue;
        }
        if let Some(max_age) = filter.max_age {
            if c.age > max_age {
                continue;
            }
        }
        scored.push(SimilarPlayer {
            id: c.id,
            full_name: c.full_name.clone(),
            club: c.club.clone(),
            score: cosine_similarity(reference_vector, &c.vector)?,
        });
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    scored.truncate(filter.k as usize);
    Ok(scored)
}

/// Translate the scouting filter into index-side conditions so the ANN
/// search never surfaces a candidate the filter would discard.
pub fn build_query_filter(
    reference_id: i64,
    reference_club: &str,
    filter: &SimilarityFilter,
) -> Filter {
    let mut must: Vec<Condition> = Vec::new();
    if let Some(pos) = &filter.position {
        must.push(Condition::matches("position", pos.clone()));
    }
    if let Some(nat) = &filter.nationality {
        must.push(Condition::matches("nationality", nat.clone()));
    }
    if filter.min_minutes > 0 {
        must.push(Condition::range(
            "minutes",
            Range {
                gte: Some(filter.min_minutes as f64),
                ..Default::default()
            },
        ));
    }
    if let Some(max_age) = filter.max_age {
        must.push(Condition::range(
            "age",
            Range {
                lte: Some(max_age as f64),
                ..Default::default()
            },
        ));
    }

    let mut must_not: Vec<Condition> = vec![
        Condition::has_id([reference_id as u64]),
        Condition::matches("club", reference_club.to_string()),
    ];
    for club in &filter.exclude_clubs {
        must_not.push(Condition::matches("club", club.clone()));
    }

    Filter {
        must,
        must_not,
        ..Default::default()
    }
}

/// Find the players most similar to a reference player, constrained by the
/// given filter. Filtering happens inside the index, so ranked results are
/// drawn from the full qualifying population rather than trimmed afterwards.
pub async fn similar_players(
    db: &Database,
    reference_id: i64,
    filter: &SimilarityFilter,
) -> EngineResult<Vec<SimilarPlayer>> {
    filter.validate()?;

    let reference = db
        .get_player(reference_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("player {} not found", reference_id)))?;

    let client = client()?;
    let reference_vector = get_player_vector(&client, reference_id).await?;
    let query_filter = build_query_filter(reference_id, &reference.club, filter);

    debug!(
        target: TARGET_VECTOR,
        "Similarity query for player {} ({}), k={}",
        reference_id, reference.full_name, filter.k
    );

    let response = client
        .search_points(SearchPoints {
            collection_name: PLAYER_COLLECTION.to_string(),
            vector: reference_vector,
            filter: Some(query_filter),
            limit: filter.k as u64,
            with_payload: Some(WithPayloadSelector::from(true)),
            ..Default::default()
        })
        .await
        .map_err(index_err)?;

    let mut results: Vec<SimilarPlayer> = Vec::with_capacity(response.result.len());
    for point in response.result {
        let id = match point.id.as_ref().and_then(|p| p.point_id_options.as_ref()) {
            Some(PointIdOptions::Num(n)) => *n as i64,
            _ => {
                warn!(target: TARGET_VECTOR, "Skipping point with non-numeric id");
                continue;
            }
        };
        let full_name = point
            .payload
            .get("full_name")
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_default();
        let club = point
            .payload
            .get("club")
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_default();
        results.push(SimilarPlayer {
            id,
            full_name,
            club,
            score: point.score,
        });
    }

    info!(
        target: TARGET_VECTOR,
        "Similarity query for player {} returned {} results",
        reference_id,
        results.len()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate {
                id: 2,
                full_name: "Near Twin".to_string(),
                club: "Town FC".to_string(),
                position: "DF".to_string(),
                nationality: "Spain".to_string(),
                minutes: 2500,
                age: 24,
                vector: vec![1.0, 0.1, 0.0],
            },
            Candidate {
                id: 3,
                full_name: "Teammate".to_string(),
                club: "City FC".to_string(),
                position: "DF".to_string(),
                nationality: "Spain".to_string(),
                minutes: 3000,
                age: 27,
                vector: vec![1.0, 0.0, 0.0],
            },
            Candidate {
                id: 4,
                full_name: "Veteran".to_string(),
                club: "Rovers".to_string(),
                position: "DF".to_string(),
                nationality: "Brazil".to_string(),
                minutes: 1200,
                age: 33,
                vector: vec![0.5, 0.8, 0.0],
            },
            Candidate {
                id: 5,
                full_name: "Midfielder".to_string(),
                club: "Rovers".to_string(),
                position: "MF".to_string(),
                nationality: "Spain".to_string(),
                minutes: 2800,
                age: 22,
                vector: vec![0.0, 1.0, 0.0],
            },
        ]
    }

    fn reference() -> (i64, &'static str, Vec<f32>) {
        (1, "City FC", vec![1.0, 0.0, 0.0])
    }

    #[test]
    fn excludes_self_and_own_club() {
        let (id, club, vec) = reference();
        let results =
            rank_candidates(id, club, &vec, &candidates(), &SimilarityFilter::default()).unwrap();
        assert!(results.iter().all(|r| r.id != id));
        // Teammate at City FC is a perfect cosine match but must not appear.
        assert!(results.iter().all(|r| r.club != club));
    }

    #[test]
    fn scores_descend() {
        let (id, club, vec) = reference();
        let results =
            rank_candidates(id, club, &vec, &candidates(), &SimilarityFilter::default()).unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(results[0].id, 2);
    }

    #[test]
    fn filters_narrow_the_candidate_set() {
        let (id, club, vec) = reference();
        let unfiltered =
            rank_candidates(id, club, &vec, &candidates(), &SimilarityFilter::default()).unwrap();
        let filtered = rank_candidates(
            id,
            club,
            &vec,
            &candidates(),
            &SimilarityFilter {
                position: Some("DF".to_string()),
                max_age: Some(30),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(filtered.len() <= unfiltered.len());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);
    }

    #[test]
    fn min_minutes_is_a_hard_floor() {
        let (id, club, vec) = reference();
        let results = rank_candidates(
            id,
            club,
            &vec,
            &candidates(),
            &SimilarityFilter {
                min_minutes: 2000,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(results.iter().all(|r| r.id != 4));
    }

    #[test]
    fn exclude_clubs_removes_all_members() {
        let (id, club, vec) = reference();
        let results = rank_candidates(
            id,
            club,
            &vec,
            &candidates(),
            &SimilarityFilter {
                exclude_clubs: vec!["Rovers".to_string()],
                ..Default::default()
            },
        )
        .unwrap();
        assert!(results.iter().all(|r| r.club != "Rovers"));
    }

    #[test]
    fn eliminating_every_candidate_is_not_an_error() {
        let (id, club, vec) = reference();
        let results = rank_candidates(
            id,
            club,
            &vec,
            &candidates(),
            &SimilarityFilter {
                max_age: Some(18),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn k_caps_the_result_count() {
        let (id, club, vec) = reference();
        let results = rank_candidates(
            id,
            club,
            &vec,
            &candidates(),
            &SimilarityFilter {
                k: 1,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn k_larger_than_population_returns_everyone_eligible() {
        let (id, club, vec) = reference();
        let results = rank_candidates(
            id,
            club,
            &vec,
            &candidates(),
            &SimilarityFilter {
                k: 100,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn rejects_out_of_range_k() {
        assert!(matches!(
            SimilarityFilter {
                k: 0,
                ..Default::default()
            }
            .validate(),
            Err(EngineError::InvalidFilter(_))
        ));
        assert!(matches!(
            SimilarityFilter {
                k: 101,
                ..Default::default()
            }
            .validate(),
            Err(EngineError::InvalidFilter(_))
        ));
    }

    #[test]
    fn rejects_negative_bounds() {
        assert!(SimilarityFilter {
            min_minutes: -1,
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(SimilarityFilter {
            max_age: Some(-5),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn index_filter_carries_every_predicate() {
        let filter = SimilarityFilter {
            position: Some("FW".to_string()),
            nationality: Some("France".to_string()),
            exclude_clubs: vec!["Rovers".to_string()],
            min_minutes: 900,
            max_age: Some(26),
            k: 5,
        };
        let qf = build_query_filter(7, "City FC", &filter);
        assert_eq!(qf.must.len(), 4);
        // reference id, reference club, one excluded club
        assert_eq!(qf.must_not.len(), 3);
    }
}
