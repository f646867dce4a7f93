use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::db::{Database, NewsArticle, Player, PlayerSummary};
use crate::error::EngineError;
use crate::news::{search_news, NewsHit};
use crate::vector::search::{similar_players, SimilarPlayer, SimilarityFilter, DEFAULT_RESULTS};
use crate::TARGET_WEB_REQUEST;

/// HTTP rendering of the engine error taxonomy. Internal failure detail
/// stays in the logs; clients get the category and a short message.
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self.0 {
            EngineError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            EngineError::InvalidFilter(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_filter", msg.clone())
            }
            EngineError::SchemaMismatch(msg) => {
                error!(target: TARGET_WEB_REQUEST, "Schema mismatch: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "schema_mismatch",
                    msg.clone(),
                )
            }
            EngineError::IndexUnavailable(msg) => {
                error!(target: TARGET_WEB_REQUEST, "Index unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "index_unavailable",
                    "vector index is unavailable".to_string(),
                )
            }
            EngineError::Database(e) => {
                error!(target: TARGET_WEB_REQUEST, "Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database",
                    "internal database error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    position: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SimilarParams {
    position: Option<String>,
    nationality: Option<String>,
    exclude_club: Option<String>,
    min_minutes: Option<i64>,
    max_age: Option<i64>,
    k: Option<i64>,
}

impl SimilarParams {
    fn into_filter(self) -> SimilarityFilter {
        SimilarityFilter {
            position: self.position,
            nationality: self.nationality,
            exclude_clubs: self
                .exclude_club
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            min_minutes: self.min_minutes.unwrap_or(0),
            max_age: self.max_age,
            k: self.k.unwrap_or(DEFAULT_RESULTS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    k: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct NewsSearchParams {
    query: String,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SimilarResponse {
    reference_id: i64,
    results: Vec<SimilarPlayer>,
}

async fn players_search(
    State(db): State<Database>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PlayerSummary>>, ApiError> {
    if params.query.trim().is_empty() {
        return Err(EngineError::InvalidFilter("query must not be empty".to_string()).into());
    }
    let limit = params.limit.unwrap_or(20);
    if limit < 1 || limit > 100 {
        return Err(
            EngineError::InvalidFilter(format!("limit must be between 1 and 100, got {}", limit))
                .into(),
        );
    }
    let players = db
        .lookup_by_name(&params.query, params.position.as_deref(), limit)
        .await
        .map_err(EngineError::from)?;
    info!(target: TARGET_WEB_REQUEST, "Name lookup for {:?} returned {} players", params.query, players.len());
    Ok(Json(players))
}

async fn players_similar(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, ApiError> {
    let filter = params.into_filter();
    let results = similar_players(&db, id, &filter).await?;
    Ok(Json(SimilarResponse {
        reference_id: id,
        results,
    }))
}

async fn players_batch(
    State(db): State<Database>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<Vec<Player>>, ApiError> {
    if request.ids.is_empty() {
        return Err(EngineError::InvalidFilter("ids must not be empty".to_string()).into());
    }
    if request.ids.len() > 100 {
        return Err(EngineError::InvalidFilter(format!(
            "at most 100 ids per batch, got {}",
            request.ids.len()
        ))
        .into());
    }
    let players = db.batch_stats(&request.ids).await.map_err(EngineError::from)?;
    if players.is_empty() {
        return Err(EngineError::NotFound("no players match the given ids".to_string()).into());
    }
    Ok(Json(players))
}

async fn player_news(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Query(params): Query<NewsParams>,
) -> Result<Json<Vec<NewsArticle>>, ApiError> {
    let k = params.k.unwrap_or(DEFAULT_RESULTS);
    if k < 1 || k > 20 {
        return Err(
            EngineError::InvalidFilter(format!("k must be between 1 and 20, got {}", k)).into(),
        );
    }
    if db.get_player(id).await.map_err(EngineError::from)?.is_none() {
        return Err(EngineError::NotFound(format!("player {} not found", id)).into());
    }
    let articles = db.news_for_player(id, k).await.map_err(EngineError::from)?;
    Ok(Json(articles))
}

async fn news_search(
    State(db): State<Database>,
    Query(params): Query<NewsSearchParams>,
) -> Result<Json<Vec<NewsHit>>, ApiError> {
    let hits = search_news(&db, &params.query, params.limit.unwrap_or(DEFAULT_RESULTS)).await?;
    Ok(Json(hits))
}

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/players/search", get(players_search))
        .route("/players/{id}/similar", get(players_similar))
        .route("/players/batch", post(players_batch))
        .route("/players/{id}/news", get(player_news))
        .route("/news/search", get(news_search))
        .with_state(db)
}

/// Bind and serve the API until the process is stopped.
pub async fn serve(db: Database, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(target: TARGET_WEB_REQUEST, "API listening on {}", addr);
    axum::serve(listener, router(db)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_club_param_splits_on_commas() {
        let params = SimilarParams {
            position: None,
            nationality: None,
            exclude_club: Some("Arsenal, Chelsea,,  Spurs".to_string()),
            min_minutes: None,
            max_age: None,
            k: None,
        };
        let filter = params.into_filter();
        assert_eq!(filter.exclude_clubs, vec!["Arsenal", "Chelsea", "Spurs"]);
        assert_eq!(filter.k, DEFAULT_RESULTS);
    }

    #[tokio::test]
    async fn error_taxonomy_maps_to_status_codes() {
        let cases = [
            (EngineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                EngineError::InvalidFilter("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EngineError::SchemaMismatch("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EngineError::IndexUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
