use serde::Serialize;
use tracing::{debug, error};
use url::Url;
use urlnorm::UrlNormalizer;

use super::core::Database;
use crate::TARGET_DB;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NewsArticle {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
}

impl Database {
    /// True if an article with the same normalized URL is already stored.
    pub async fn has_seen_article(&self, url: &str) -> Result<bool, sqlx::Error> {
        let normalized = normalize_url(url)?;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM news_articles WHERE normalized_url = ?",
        )
        .bind(normalized)
        .fetch_one(self.pool())
        .await?;
        Ok(count > 0)
    }

    pub async fn add_article(
        &self,
        url: &str,
        title: &str,
        source: &str,
        published_at: &str,
        article_text: &str,
        summary: &str,
    ) -> Result<i64, sqlx::Error> {
        let normalized = normalize_url(url)?;
        debug!(target: TARGET_DB, "Adding article: {}", url);

        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO news_articles (url, normalized_url, title, source, published_at, article_text, summary)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(normalized_url) DO UPDATE SET
                title = excluded.title,
                published_at = excluded.published_at,
                article_text = excluded.article_text,
                summary = excluded.summary
            RETURNING id
            "#,
        )
        .bind(url)
        .bind(normalized)
        .bind(title)
        .bind(source)
        .bind(published_at)
        .bind(article_text)
        .bind(summary)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    /// Latest `k` articles linked to a player, newest first.
    pub async fn news_for_player(
        &self,
        player_id: i64,
        k: i64,
    ) -> Result<Vec<NewsArticle>, sqlx::Error> {
        sqlx::query_as::<_, NewsArticle>(
            r#"
            SELECT n.id, n.url, n.title, COALESCE(n.source, '') AS source,
                   COALESCE(n.published_at, '') AS published_at,
                   COALESCE(n.summary, '') AS summary
            FROM news_articles n
            JOIN player_news pn ON pn.news_id = n.id
            WHERE pn.player_id = ?1
            ORDER BY n.published_at DESC
            LIMIT ?2
            "#,
        )
        .bind(player_id)
        .bind(k)
        .fetch_all(self.pool())
        .await
    }

    /// Articles the linker has not processed: no bridge row yet.
    pub async fn unlinked_articles(&self) -> Result<Vec<(i64, String)>, sqlx::Error> {
        sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT id, COALESCE(article_text, '')
            FROM news_articles
            WHERE id NOT IN (SELECT DISTINCT news_id FROM player_news)
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
    }

    pub async fn link_player_news(
        &self,
        player_id: i64,
        news_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO player_news (player_id, news_id) VALUES (?1, ?2)")
                .bind(player_id)
                .bind(news_id)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Articles by id, in the id order given. Used to join vector search
    /// hits back to their rows.
    pub async fn articles_by_ids(&self, ids: &[i64]) -> Result<Vec<NewsArticle>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, url, title, COALESCE(source, '') AS source,
                   COALESCE(published_at, '') AS published_at,
                   COALESCE(summary, '') AS summary
            FROM news_articles WHERE id IN ({})
            "#,
            placeholders
        );
        let mut query = sqlx::query_as::<_, NewsArticle>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let mut rows = query.fetch_all(self.pool()).await?;
        rows.sort_by_key(|a| ids.iter().position(|&id| id == a.id).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

fn normalize_url(url: &str) -> Result<String, sqlx::Error> {
    let parsed = Url::parse(url).map_err(|e| {
        error!(target: TARGET_DB, "Attempted to store an invalid article URL ({}): {}", url, e);
        sqlx::Error::Protocol("Invalid URL provided".into())
    })?;
    Ok(UrlNormalizer::default().compute_normalization_string(&parsed))
}
