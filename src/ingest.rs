use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::db::Database;
use crate::error::{EngineError, EngineResult};
use crate::features::extract::coerce;
use crate::features::StatRecord;
use crate::TARGET_INGEST;

/// Identity columns every scouting export must carry.
const IDENTITY_HEADERS: [&str; 6] = ["player", "age", "nationality", "position", "Team", "League"];

/// CSV header for each feature column, in schema order. Export headers use
/// "xg" where the schema says "expected_goals", so this is an explicit map
/// rather than a string transform.
const FEATURE_HEADERS: [&str; 43] = [
    "minutes",
    "minutes_90s",
    "goals",
    "assists",
    "xg",
    "xg_assist",
    "npxg_xg_assist",
    "progressive_carries",
    "progressive_passes",
    "progressive_passes_received",
    "goals_per90",
    "assists_per90",
    "goals_assists_per90",
    "xg_per90",
    "xg_assist_per90",
    "xg_xg_assist_per90",
    "gk_goals_against",
    "gk_pens_allowed",
    "gk_free_kick_goals_against",
    "gk_corner_kick_goals_against",
    "gk_own_goals_against",
    "gk_psxg",
    "gk_psnpxg_per_shot_on_target_against",
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

/// Canonicalize a scraped player name: strip diacritics down to ASCII,
/// collapse runs of whitespace, and title-case each word so "KEVIN DE
/// BRUYNE" and "kevin de bruyne" land on the same row.
pub fn clean_name(raw: &str) -> String {
    let ascii: String = raw.nfkd().filter(|c| c.is_ascii()).collect();
    ascii
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_index(headers: &csv::StringRecord) -> EngineResult<HashMap<String, usize>> {
    let index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    let missing: Vec<&str> = IDENTITY_HEADERS
        .iter()
        .chain(FEATURE_HEADERS.iter())
        .filter(|h| !index.contains_key(**h))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::SchemaMismatch(format!(
            "CSV is missing required columns: {}",
            missing.join(", ")
        )));
    }
    Ok(index)
}

/// Import a stats CSV into the player table. With `replace` set the table
/// is truncated first, otherwise rows are appended. Returns the number of
/// players inserted.
pub async fn import_players(db: &Database, path: &Path, replace: bool) -> EngineResult<usize> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| EngineError::SchemaMismatch(format!("cannot read {}: {}", path.display(), e)))?;
    let index = header_index(reader.headers().map_err(|e| {
        EngineError::SchemaMismatch(format!("cannot read CSV header row: {}", e))
    })?)?;

    if replace {
        let existing = db.count_players().await?;
        db.truncate_players().await?;
        info!(target: TARGET_INGEST, "Cleared {} existing players before import", existing);
    }

    let mut inserted = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(target: TARGET_INGEST, "Skipping unreadable row {}: {}", row + 2, e);
                continue;
            }
        };

        let field = |name: &str| record.get(index[name]).map(str::trim);
        let c = |name: &str| coerce(field(name));

        let full_name = clean_name(field("player").unwrap_or(""));
        if full_name.is_empty() {
            warn!(target: TARGET_INGEST, "Skipping row {} with empty player name", row + 2);
            continue;
        }

        let stats = StatRecord {
            minutes: c("minutes"),
            minutes_90s: c("minutes_90s"),
            goals: c("goals"),
            assists: c("assists"),
            expected_goals: c("xg"),
            expected_assists: c("xg_assist"),
            npxg_plus_xa: c("npxg_xg_assist"),
            progressive_carries: c("progressive_carries"),
            progressive_passes: c("progressive_passes"),
            progressive_passes_received: c("progressive_passes_received"),
            goals_per90: c("goals_per90"),
            assists_per90: c("assists_per90"),
            goals_assists_per90: c("goals_assists_per90"),
            expected_goals_per90: c("xg_per90"),
            expected_assists_per90: c("xg_assist_per90"),
            expected_goals_assists_per90: c("xg_xg_assist_per90"),
            gk_goals_against: c("gk_goals_against"),
            gk_pens_allowed: c("gk_pens_allowed"),
            gk_free_kick_goals_against: c("gk_free_kick_goals_against"),
            gk_corner_kick_goals_against: c("gk_corner_kick_goals_against"),
            gk_own_goals_against: c("gk_own_goals_against"),
            gk_psxg: c("gk_psxg"),
            gk_psnpxg_per_sot_against: c("gk_psnpxg_per_shot_on_target_against"),
            passes_completed: c("passes_completed"),
            passes: c("passes"),
            passes_pct: c("passes_pct"),
            passes_progressive_distance: c("passes_progressive_distance"),
            passes_completed_long: c("passes_completed_long"),
            passes_long: c("passes_long"),
            passes_pct_long: c("passes_pct_long"),
            tackles: c("tackles"),
            tackles_won: c("tackles_won"),
            challenge_tackles: c("challenge_tackles"),
            challenges: c("challenges"),
            challenge_tackles_pct: c("challenge_tackles_pct"),
            challenges_lost: c("challenges_lost"),
            blocks: c("blocks"),
            blocked_shots: c("blocked_shots"),
            blocked_passes: c("blocked_passes"),
            interceptions: c("interceptions"),
            tackles_interceptions: c("tackles_interceptions"),
            clearances: c("clearances"),
            errors: c("errors"),
        };

        db.insert_player(
            &full_name,
            c("age") as i64,
            field("nationality").unwrap_or(""),
            field("position").unwrap_or(""),
            field("Team").unwrap_or(""),
            field("League").unwrap_or(""),
            &stats,
        )
        .await?;
        inserted += 1;
    }

    info!(target: TARGET_INGEST, "Imported {} players from {}", inserted, path.display());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_name_strips_diacritics() {
        assert_eq!(clean_name("Antonio Rüdiger"), "Antonio Rudiger");
        assert_eq!(clean_name("Saúl Ñíguez"), "Saul Niguez");
    }

    #[test]
    fn clean_name_collapses_whitespace_and_title_cases() {
        assert_eq!(clean_name("  KEVIN   DE  BRUYNE "), "Kevin De Bruyne");
        assert_eq!(clean_name("bernardo silva"), "Bernardo Silva");
    }

    #[test]
    fn clean_name_handles_empty() {
        assert_eq!(clean_name(""), "");
        assert_eq!(clean_name("   "), "");
    }

    #[test]
    fn missing_columns_are_reported() {
        let headers = csv::StringRecord::from(vec!["player", "age"]);
        let err = header_index(&headers).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nationality"));
        assert!(msg.contains("minutes"));
    }

    #[test]
    fn complete_header_row_is_accepted() {
        let mut all: Vec<&str> = IDENTITY_HEADERS.to_vec();
        all.extend_from_slice(&FEATURE_HEADERS);
        let headers = csv::StringRecord::from(all);
        let index = header_index(&headers).unwrap();
        assert_eq!(index["player"], 0);
        assert_eq!(index["errors"], IDENTITY_HEADERS.len() + 42);
    }
}
