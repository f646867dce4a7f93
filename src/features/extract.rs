//! Mechanical extraction of the pre-normalization feature vector.
//!
//! Extraction never fails: downstream similarity must be computable for
//! every row in the population, so anything that did not survive numeric
//! coercion degrades to 0.0 rather than raising.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{StatRecord, FEATURE_COLUMNS, PLAYER_DIM};

// Strips thousands separators, percent signs and other junk that shows up
// in exported stat sheets before parsing.
static NUMERIC_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9\-.]+").unwrap());

/// Coerce a raw cell into a finite float. Missing, empty and non-numeric
/// values all become 0.0.
pub fn coerce(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    let cleaned = NUMERIC_JUNK.replace_all(raw.trim(), "");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Produce the raw (un-standardized) feature vector for one player, with
/// coordinates in [`FEATURE_COLUMNS`] order.
pub fn feature_vector(rec: &StatRecord) -> Vec<f32> {
    let values = [
        rec.minutes,
        rec.minutes_90s,
        rec.goals,
        rec.assists,
        rec.expected_goals,
        rec.expected_assists,
        rec.npxg_plus_xa,
        rec.progressive_carries,
        rec.progressive_passes,
        rec.progressive_passes_received,
        rec.goals_per90,
        rec.assists_per90,
        rec.goals_assists_per90,
        rec.expected_goals_per90,
        rec.expected_assists_per90,
        rec.expected_goals_assists_per90,
        rec.gk_goals_against,
        rec.gk_pens_allowed,
        rec.gk_free_kick_goals_against,
        rec.gk_corner_kick_goals_against,
        rec.gk_own_goals_against,
        rec.gk_psxg,
        rec.gk_psnpxg_per_sot_against,
        rec.passes_completed,
        rec.passes,
        rec.passes_pct,
        rec.passes_progressive_distance,
        rec.passes_completed_long,
        rec.passes_long,
        rec.passes_pct_long,
        rec.tackles,
        rec.tackles_won,
        rec.challenge_tackles,
        rec.challenges,
        rec.challenge_tackles_pct,
        rec.challenges_lost,
        rec.blocks,
        rec.blocked_shots,
        rec.blocked_passes,
        rec.interceptions,
        rec.tackles_interceptions,
        rec.clearances,
        rec.errors,
    ];
    debug_assert_eq!(values.len(), FEATURE_COLUMNS.len());

    values
        .iter()
        .map(|&v| if v.is_finite() { v as f32 } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_has_fixed_dimensionality() {
        let rec = StatRecord::default();
        assert_eq!(feature_vector(&rec).len(), PLAYER_DIM);

        let rec = StatRecord {
            goals: 17.0,
            minutes: 2890.0,
            ..Default::default()
        };
        assert_eq!(feature_vector(&rec).len(), PLAYER_DIM);
    }

    #[test]
    fn coerce_degrades_to_zero() {
        assert_eq!(coerce(None), 0.0);
        assert_eq!(coerce(Some("")), 0.0);
        assert_eq!(coerce(Some("n/a")), 0.0);
        assert_eq!(coerce(Some("12")), 12.0);
        assert_eq!(coerce(Some("1,234")), 1234.0);
        assert_eq!(coerce(Some("87.5%")), 87.5);
        assert_eq!(coerce(Some("-3")), -3.0);
    }

    #[test]
    fn non_finite_fields_degrade_to_zero() {
        let rec = StatRecord {
            goals_per90: f64::NAN,
            expected_goals: f64::INFINITY,
            ..Default::default()
        };
        let vec = feature_vector(&rec);
        assert!(vec.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn feature_order_is_stable() {
        let rec = StatRecord {
            minutes: 1.0,
            errors: 2.0,
            ..Default::default()
        };
        let vec = feature_vector(&rec);
        assert_eq!(vec[0], 1.0);
        assert_eq!(vec[PLAYER_DIM - 1], 2.0);
        assert_eq!(FEATURE_COLUMNS[0], "minutes");
        assert_eq!(FEATURE_COLUMNS[PLAYER_DIM - 1], "errors");
    }
}
