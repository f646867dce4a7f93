use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                age INTEGER NOT NULL DEFAULT 0,
                nationality TEXT NOT NULL DEFAULT '',
                position TEXT NOT NULL DEFAULT '',
                club TEXT NOT NULL DEFAULT '',
                league TEXT NOT NULL DEFAULT '',
                vectorized_at TEXT, -- set when the player's vector was written to the index

                minutes REAL NOT NULL DEFAULT 0,
                minutes_90s REAL NOT NULL DEFAULT 0,
                goals REAL NOT NULL DEFAULT 0,
                assists REAL NOT NULL DEFAULT 0,
                expected_goals REAL NOT NULL DEFAULT 0,
                expected_assists REAL NOT NULL DEFAULT 0,
                npxg_plus_xa REAL NOT NULL DEFAULT 0,
                progressive_carries REAL NOT NULL DEFAULT 0,
                progressive_passes REAL NOT NULL DEFAULT 0,
                progressive_passes_received REAL NOT NULL DEFAULT 0,
                goals_per90 REAL NOT NULL DEFAULT 0,
                assists_per90 REAL NOT NULL DEFAULT 0,
                goals_assists_per90 REAL NOT NULL DEFAULT 0,
                expected_goals_per90 REAL NOT NULL DEFAULT 0,
                expected_assists_per90 REAL NOT NULL DEFAULT 0,
                expected_goals_assists_per90 REAL NOT NULL DEFAULT 0,
                gk_goals_against REAL NOT NULL DEFAULT 0,
                gk_pens_allowed REAL NOT NULL DEFAULT 0,
                gk_free_kick_goals_against REAL NOT NULL DEFAULT 0,
                gk_corner_kick_goals_against REAL NOT NULL DEFAULT 0,
                gk_own_goals_against REAL NOT NULL DEFAULT 0,
                gk_psxg REAL NOT NULL DEFAULT 0,
                gk_psnpxg_per_sot_against REAL NOT NULL DEFAULT 0,
                passes_completed REAL NOT NULL DEFAULT 0,
                passes REAL NOT NULL DEFAULT 0,
                passes_pct REAL NOT NULL DEFAULT 0,
                passes_progressive_distance REAL NOT NULL DEFAULT 0,
                passes_completed_long REAL NOT NULL DEFAULT 0,
                passes_long REAL NOT NULL DEFAULT 0,
                passes_pct_long REAL NOT NULL DEFAULT 0,
                tackles REAL NOT NULL DEFAULT 0,
                tackles_won REAL NOT NULL DEFAULT 0,
                challenge_tackles REAL NOT NULL DEFAULT 0,
                challenges REAL NOT NULL DEFAULT 0,
                challenge_tackles_pct REAL NOT NULL DEFAULT 0,
                challenges_lost REAL NOT NULL DEFAULT 0,
                blocks REAL NOT NULL DEFAULT 0,
                blocked_shots REAL NOT NULL DEFAULT 0,
                blocked_passes REAL NOT NULL DEFAULT 0,
                interceptions REAL NOT NULL DEFAULT 0,
                tackles_interceptions REAL NOT NULL DEFAULT 0,
                clearances REAL NOT NULL DEFAULT 0,
                errors REAL NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_players_full_name ON players (full_name);
            CREATE INDEX IF NOT EXISTS idx_players_position ON players (position);
            CREATE INDEX IF NOT EXISTS idx_players_vectorized_at ON players (vectorized_at);

            CREATE TABLE IF NOT EXISTS news_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                normalized_url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                source TEXT,
                published_at TEXT,
                article_text TEXT,
                summary TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_news_published_at ON news_articles (published_at);

            -- Player <-> news bridge, populated by the linker
            CREATE TABLE IF NOT EXISTS player_news (
                player_id INTEGER NOT NULL,
                news_id INTEGER NOT NULL,
                PRIMARY KEY (player_id, news_id),
                FOREIGN KEY (player_id) REFERENCES players (id) ON DELETE CASCADE,
                FOREIGN KEY (news_id) REFERENCES news_articles (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_player_news_player_id ON player_news (player_id);
            CREATE INDEX IF NOT EXISTS idx_player_news_news_id ON player_news (news_id);

            -- Versioned standardization fits; one row per rebuild
            CREATE TABLE IF NOT EXISTS normalization_profiles (
                version INTEGER PRIMARY KEY AUTOINCREMENT,
                schema_version INTEGER NOT NULL,
                dim INTEGER NOT NULL,
                means TEXT NOT NULL,
                scales TEXT NOT NULL,
                fitted_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
