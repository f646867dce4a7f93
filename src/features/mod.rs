//! Feature schema for player similarity vectors.
//!
//! Every statistic that contributes a coordinate to the feature vector is
//! enumerated in [`FEATURE_COLUMNS`], in the order the coordinates appear.
//! That order is load-bearing: the stored index is only valid for vectors
//! extracted under the same column order. Reordering or adding columns is
//! a schema change and requires bumping [`SCHEMA_VERSION`] and rebuilding
//! the whole population with `rebuild-vectors`.

pub mod extract;
pub mod profile;

use serde::{Deserialize, Serialize};

pub const TARGET_FEATURES: &str = "features";

/// Schema version recorded with every normalization profile. A profile
/// fitted under a different version never standardizes current vectors.
pub const SCHEMA_VERSION: i64 = 1;

/// Fixed dimensionality of the player feature vector.
pub const PLAYER_DIM: usize = 43;

/// Column order of the feature vector. One coordinate per entry.
pub const FEATURE_COLUMNS: [&str; PLAYER_DIM] = [
    "minutes",
    "minutes_90s",
    "goals",
    "assists",
    "expected_goals",
    "expected_assists",
    "npxg_plus_xa",
    "progressive_carries",
    "progressive_passes",
    "progressive_passes_received",
    "goals_per90",
    "assists_per90",
    "goals_assists_per90",
    "expected_goals_per90",
    "expected_assists_per90",
    "expected_goals_assists_per90",
    "gk_goals_against",
    "gk_pens_allowed",
    "gk_free_kick_goals_against",
    "gk_corner_kick_goals_against",
    "gk_own_goals_against",
    "gk_psxg",
    "gk_psnpxg_per_sot_against",
    "passes_completed",
    "passes",
    "passes_pct",
    "passes_progressive_distance",
    "passes_completed_long",
    "passes_long",
    "passes_pct_long",
    "tackles",
    "tackles_won",
    "challenge_tackles",
    "challenges",
    "challenge_tackles_pct",
    "challenges_lost",
    "blocks",
    "blocked_shots",
    "blocked_passes",
    "interceptions",
    "tackles_interceptions",
    "clearances",
    "errors",
];

/// One season of scalar statistics for a single player, already coerced to
/// dense numeric form at the ingest boundary (missing values are 0.0, never
/// null, so a feature vector is computable for every row).
///
/// Field order matches [`FEATURE_COLUMNS`]; `extract::feature_vector` relies
/// on that correspondence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatRecord {
    pub minutes: f64,
    pub minutes_90s: f64,
    pub goals: f64,
    pub assists: f64,
    pub expected_goals: f64,
    pub expected_assists: f64,
    pub npxg_plus_xa: f64,
    pub progressive_carries: f64,
    pub progressive_passes: f64,
    pub progressive_passes_received: f64,
    pub goals_per90: f64,
    pub assists_per90: f64,
    pub goals_assists_per90: f64,
    pub expected_goals_per90: f64,
    pub expected_assists_per90: f64,
    pub expected_goals_assists_per90: f64,
    pub gk_goals_against: f64,
    pub gk_pens_allowed: f64,
    pub gk_free_kick_goals_against: f64,
    pub gk_corner_kick_goals_against: f64,
    pub gk_own_goals_against: f64,
    pub gk_psxg: f64,
    pub gk_psnpxg_per_sot_against: f64,
    pub passes_completed: f64,
    pub passes: f64,
    pub passes_pct: f64,
    pub passes_progressive_distance: f64,
    pub passes_completed_long: f64,
    pub passes_long: f64,
    pub passes_pct_long: f64,
    pub tackles: f64,
    pub tackles_won: f64,
    pub challenge_tackles: f64,
    pub challenges: f64,
    pub challenge_tackles_pct: f64,
    pub challenges_lost: f64,
    pub blocks: f64,
    pub blocked_shots: f64,
    pub blocked_passes: f64,
    pub interceptions: f64,
    pub tackles_interceptions: f64,
    pub clearances: f64,
    pub errors: f64,
}
