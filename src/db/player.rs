use serde::Serialize;
use tracing::{debug, instrument};

use super::core::Database;
use crate::features::StatRecord;
use crate::linker::fold_ascii;
use crate::TARGET_DB;

/// A full player row: identity plus the dense statistics record the
/// feature extractor consumes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Player {
    pub id: i64,
    pub full_name: String,
    pub age: i64,
    pub nationality: String,
    pub position: String,
    pub club: String,
    pub league: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub stats: StatRecord,
}

/// Slim row returned by name lookups.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlayerSummary {
    pub id: i64,
    pub full_name: String,
    pub club: String,
    pub position: String,
}

impl Database {
    pub async fn get_player(&self, player_id: i64) -> Result<Option<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE id = ?")
            .bind(player_id)
            .fetch_optional(self.pool())
            .await
    }

    /// Case- and diacritic-insensitive substring lookup over player names.
    /// Names are ASCII-folded at ingest, so folding the query the same way
    /// makes "Rüdiger" find a stored "Rudiger".
    #[instrument(target = "db_query", level = "debug", skip(self))]
    pub async fn lookup_by_name(
        &self,
        query: &str,
        position: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PlayerSummary>, sqlx::Error> {
        let pattern = format!("%{}%", fold_ascii(query));
        debug!(target: TARGET_DB, "Name lookup with pattern: {}", pattern);

        match position {
            Some(pos) => {
                sqlx::query_as::<_, PlayerSummary>(
                    r#"
                    SELECT id, full_name, club, position FROM players
                    WHERE full_name LIKE ?1 COLLATE NOCASE AND position = ?2
                    ORDER BY full_name LIMIT ?3
                    "#,
                )
                .bind(&pattern)
                .bind(pos)
                .bind(limit)
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query_as::<_, PlayerSummary>(
                    r#"
                    SELECT id, full_name, club, position FROM players
                    WHERE full_name LIKE ?1 COLLATE NOCASE
                    ORDER BY full_name LIMIT ?2
                    "#,
                )
                .bind(&pattern)
                .bind(limit)
                .fetch_all(self.pool())
                .await
            }
        }
    }

    /// Full stat records for a batch of ids. Unknown ids are absent from
    /// the result.
    pub async fn batch_stats(&self, ids: &[i64]) -> Result<Vec<Player>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT * FROM players WHERE id IN ({}) ORDER BY id",
            placeholders
        );
        let mut query = sqlx::query_as::<_, Player>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        query.fetch_all(self.pool()).await
    }

    /// Every player, in stable row order. Feeds the population-wide
    /// normalization fit.
    pub async fn all_players(&self) -> Result<Vec<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM players ORDER BY id")
            .fetch_all(self.pool())
            .await
    }

    /// Players whose vectors have not been written to the index yet.
    pub async fn unvectorized_players(&self) -> Result<Vec<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>(
            "SELECT * FROM players WHERE vectorized_at IS NULL ORDER BY id",
        )
        .fetch_all(self.pool())
        .await
    }

    pub async fn mark_vectorized(&self, ids: &[i64], at: &str) -> Result<(), sqlx::Error> {
        if ids.is_empty() {
            return Ok(());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE players SET vectorized_at = ? WHERE id IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(at);
        for id in ids {
            query = query.bind(id);
        }
        query.execute(self.pool()).await?;
        Ok(())
    }

    pub async fn all_player_names(&self) -> Result<Vec<(i64, String)>, sqlx::Error> {
        sqlx::query_as::<_, (i64, String)>("SELECT id, full_name FROM players ORDER BY id")
            .fetch_all(self.pool())
            .await
    }

    pub async fn count_players(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM players")
            .fetch_one(self.pool())
            .await
    }

    /// Drop all players and their news links before a replace-import.
    pub async fn truncate_players(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM player_news")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM players").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'players'")
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    #[instrument(target = "db_query", level = "debug", skip_all, fields(player = %full_name))]
    pub async fn insert_player(
        &self,
        full_name: &str,
        age: i64,
        nationality: &str,
        position: &str,
        club: &str,
        league: &str,
        stats: &StatRecord,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO players (
                full_name, age, nationality, position, club, league,
                minutes, minutes_90s, goals, assists,
                expected_goals, expected_assists, npxg_plus_xa,
                progressive_carries, progressive_passes, progressive_passes_received,
                goals_per90, assists_per90, goals_assists_per90,
                expected_goals_per90, expected_assists_per90, expected_goals_assists_per90,
                gk_goals_against, gk_pens_allowed, gk_free_kick_goals_against,
                gk_corner_kick_goals_against, gk_own_goals_against,
                gk_psxg, gk_psnpxg_per_sot_against,
                passes_completed, passes, passes_pct,
                passes_progressive_distance, passes_completed_long, passes_long, passes_pct_long,
                tackles, tackles_won, challenge_tackles, challenges,
                challenge_tackles_pct, challenges_lost,
                blocks, blocked_shots, blocked_passes,
                interceptions, tackles_interceptions, clearances, errors
            ) VALUES (
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            )
            RETURNING id
            "#,
        )
        .bind(full_name)
        .bind(age)
        .bind(nationality)
        .bind(position)
        .bind(club)
        .bind(league)
        .bind(stats.minutes)
        .bind(stats.minutes_90s)
        .bind(stats.goals)
        .bind(stats.assists)
        .bind(stats.expected_goals)
        .bind(stats.expected_assists)
        .bind(stats.npxg_plus_xa)
        .bind(stats.progressive_carries)
        .bind(stats.progressive_passes)
        .bind(stats.progressive_passes_received)
        .bind(stats.goals_per90)
        .bind(stats.assists_per90)
        .bind(stats.goals_assists_per90)
        .bind(stats.expected_goals_per90)
        .bind(stats.expected_assists_per90)
        .bind(stats.expected_goals_assists_per90)
        .bind(stats.gk_goals_against)
        .bind(stats.gk_pens_allowed)
        .bind(stats.gk_free_kick_goals_against)
        .bind(stats.gk_corner_kick_goals_against)
        .bind(stats.gk_own_goals_against)
        .bind(stats.gk_psxg)
        .bind(stats.gk_psnpxg_per_sot_against)
        .bind(stats.passes_completed)
        .bind(stats.passes)
        .bind(stats.passes_pct)
        .bind(stats.passes_progressive_distance)
        .bind(stats.passes_completed_long)
        .bind(stats.passes_long)
        .bind(stats.passes_pct_long)
        .bind(stats.tackles)
        .bind(stats.tackles_won)
        .bind(stats.challenge_tackles)
        .bind(stats.challenges)
        .bind(stats.challenge_tackles_pct)
        .bind(stats.challenges_lost)
        .bind(stats.blocks)
        .bind(stats.blocked_shots)
        .bind(stats.blocked_passes)
        .bind(stats.interceptions)
        .bind(stats.tackles_interceptions)
        .bind(stats.clearances)
        .bind(stats.errors)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }
}
