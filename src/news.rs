use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{SearchPoints, WithPayloadSelector};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{EngineError, EngineResult};
use crate::vector::embedding::get_query_vector;
use crate::vector::storage::index_err;
use crate::vector::{client, NEWS_COLLECTION, TARGET_VECTOR};

pub const MAX_NEWS_RESULTS: i64 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct NewsHit {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
    pub score: f32,
}

/// Semantic search over stored article embeddings. Scores come from the
/// index; titles and summaries come from the article table.
pub async fn search_news(db: &Database, query: &str, limit: i64) -> EngineResult<Vec<NewsHit>> {
    if query.trim().is_empty() {
        return Err(EngineError::InvalidFilter(
            "news query must not be empty".to_string(),
        ));
    }
    if limit < 1 || limit > MAX_NEWS_RESULTS {
        return Err(EngineError::InvalidFilter(format!(
            "limit must be between 1 and {}, got {}",
            MAX_NEWS_RESULTS, limit
        )));
    }

    let embedding = get_query_vector(query)
        .await
        .map_err(|e| EngineError::IndexUnavailable(format!("embedding failed: {}", e)))?
        .ok_or_else(|| {
            EngineError::IndexUnavailable("embedding model produced no vector".to_string())
        })?;

    let qdrant = client()?;
    let response = qdrant
        .search_points(SearchPoints {
            collection_name: NEWS_COLLECTION.to_string(),
            vector: embedding,
            limit: limit as u64,
            with_payload: Some(WithPayloadSelector::from(false)),
            ..Default::default()
        })
        .await
        .map_err(index_err)?;

    let mut scores: HashMap<i64, f32> = HashMap::new();
    let mut ordered_ids: Vec<i64> = Vec::with_capacity(response.result.len());
    for point in response.result {
        match point.id.as_ref().and_then(|p| p.point_id_options.as_ref()) {
            Some(PointIdOptions::Num(n)) => {
                let id = *n as i64;
                scores.insert(id, point.score);
                ordered_ids.push(id);
            }
            _ => warn!(target: TARGET_VECTOR, "Skipping news point with non-numeric id"),
        }
    }

    let articles = db.articles_by_ids(&ordered_ids).await?;
    let hits: Vec<NewsHit> = articles
        .into_iter()
        .map(|a| NewsHit {
            score: scores.get(&a.id).copied().unwrap_or(0.0),
            id: a.id,
            title: a.title,
            url: a.url,
            source: a.source,
            published_at: a.published_at,
            summary: a.summary,
        })
        .collect();

    info!(target: TARGET_VECTOR, "News search returned {} hits", hits.len());
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_query() {
        let db = Database::new(":memory:").await.unwrap();
        let err = search_news(&db, "  ", 10).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn rejects_out_of_range_limit() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(search_news(&db, "transfer rumor", 0).await.is_err());
        assert!(search_news(&db, "transfer rumor", 51).await.is_err());
    }
}
