use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::vectors::VectorsOptions;
use qdrant_client::qdrant::{
    CreateCollection, Distance, GetPoints, HnswConfigDiff, PointId, PointStruct, UpsertPoints,
    VectorParams, Vectors, VectorsConfig, WithPayloadSelector, WithVectorsSelector, WriteOrdering,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::db::Player;
use crate::error::{EngineError, EngineResult};
use crate::features::PLAYER_DIM;
use crate::vector::{NEWS_COLLECTION, PLAYER_COLLECTION, TARGET_VECTOR};

const UPSERT_CHUNK: usize = 256;

/// ANN index parameters. The recall/latency balance shifts with population
/// size, so these are operator-tunable, not constants: a larger population
/// wants a denser graph (higher `m`) and a higher `full_scan_threshold`
/// keeps small populations on exact scans where recall is free.
#[derive(Debug, Clone, Copy)]
pub struct IndexTuning {
    pub m: u64,
    pub ef_construct: u64,
    pub full_scan_threshold: u64,
}

impl Default for IndexTuning {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construct: 100,
            full_scan_threshold: 10_000,
        }
    }
}

fn vectors_config(dim: usize, tuning: Option<&IndexTuning>) -> VectorsConfig {
    VectorsConfig {
        config: Some(qdrant_client::qdrant::vectors_config::Config::Params(
            VectorParams {
                size: dim as u64,
                distance: Distance::Cosine.into(),
                hnsw_config: tuning.map(|t| HnswConfigDiff {
                    m: Some(t.m),
                    ef_construct: Some(t.ef_construct),
                    full_scan_threshold: Some(t.full_scan_threshold),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )),
    }
}

/// Drop and recreate the player collection.
///
/// A rebuild rewrites the whole population under a new normalization
/// profile; recreating the collection first means a concurrent query sees
/// either the old complete index or the new one, never a mixed-scale blend.
pub async fn recreate_player_collection(client: &Qdrant, tuning: &IndexTuning) -> EngineResult<()> {
    if client
        .collection_exists(PLAYER_COLLECTION)
        .await
        .map_err(index_err)?
    {
        client
            .delete_collection(PLAYER_COLLECTION)
            .await
            .map_err(index_err)?;
    }

    client
        .create_collection(CreateCollection {
            collection_name: PLAYER_COLLECTION.to_string(),
            vectors_config: Some(vectors_config(PLAYER_DIM, Some(tuning))),
            ..Default::default()
        })
        .await
        .map_err(index_err)?;

    info!(
        target: TARGET_VECTOR,
        "Recreated collection {} (dim={}, m={}, ef_construct={}, full_scan_threshold={})",
        PLAYER_COLLECTION, PLAYER_DIM, tuning.m, tuning.ef_construct, tuning.full_scan_threshold
    );
    Ok(())
}

/// Create the news collection if it does not exist yet. News embeddings are
/// append-only, so there is no recreate path.
pub async fn ensure_news_collection(client: &Qdrant, dim: usize) -> EngineResult<()> {
    if client
        .collection_exists(NEWS_COLLECTION)
        .await
        .map_err(index_err)?
    {
        return Ok(());
    }
    client
        .create_collection(CreateCollection {
            collection_name: NEWS_COLLECTION.to_string(),
            vectors_config: Some(vectors_config(dim, None)),
            ..Default::default()
        })
        .await
        .map_err(index_err)?;
    info!(target: TARGET_VECTOR, "Created collection {} (dim={})", NEWS_COLLECTION, dim);
    Ok(())
}

/// Build the index point for one player: the standardized vector plus the
/// payload columns the query engine filters on.
pub fn player_point(player: &Player, vector: Vec<f32>, profile_version: i64) -> PointStruct {
    let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
    payload.insert("full_name".to_string(), player.full_name.clone().into());
    payload.insert("club".to_string(), player.club.clone().into());
    payload.insert("position".to_string(), player.position.clone().into());
    payload.insert("nationality".to_string(), player.nationality.clone().into());
    payload.insert("minutes".to_string(), (player.stats.minutes as i64).into());
    payload.insert("age".to_string(), player.age.into());
    payload.insert("profile_version".to_string(), profile_version.into());

    PointStruct {
        id: Some(PointId {
            point_id_options: Some(PointIdOptions::Num(player.id as u64)),
        }),
        vectors: Some(Vectors {
            vectors_options: Some(VectorsOptions::Vector(qdrant_client::qdrant::Vector {
                data: vector,
                indices: None,
                vector: None,
                vectors_count: None,
            })),
        }),
        payload,
        ..Default::default()
    }
}

/// Upsert player points in chunks, waiting for each write to land.
pub async fn upsert_player_points(
    client: &Qdrant,
    points: Vec<PointStruct>,
) -> EngineResult<usize> {
    let total = points.len();
    for chunk in points.chunks(UPSERT_CHUNK) {
        client
            .upsert_points(UpsertPoints {
                collection_name: PLAYER_COLLECTION.to_string(),
                points: chunk.to_vec(),
                wait: Some(true),
                ordering: Some(WriteOrdering::default()),
                shard_key_selector: None,
            })
            .await
            .map_err(|e| {
                error!(target: TARGET_VECTOR, "Failed to upsert player vectors: {:?}", e);
                index_err(e)
            })?;
    }
    info!(target: TARGET_VECTOR, "Upserted {} player vectors", total);
    Ok(total)
}

/// Store one article's text embedding.
pub async fn store_news_embedding(
    client: &Qdrant,
    article_id: i64,
    embedding: Vec<f32>,
    published_at: &str,
) -> EngineResult<()> {
    debug!(target: TARGET_VECTOR, "Storing embedding for article {} (dim={})", article_id, embedding.len());

    let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
    if !published_at.is_empty() {
        payload.insert("published_at".to_string(), published_at.to_string().into());
    }

    let point = PointStruct {
        id: Some(PointId {
            point_id_options: Some(PointIdOptions::Num(article_id as u64)),
        }),
        vectors: Some(Vectors {
            vectors_options: Some(VectorsOptions::Vector(qdrant_client::qdrant::Vector {
                data: embedding,
                indices: None,
                vector: None,
                vectors_count: None,
            })),
        }),
        payload,
        ..Default::default()
    };

    client
        .upsert_points(UpsertPoints {
            collection_name: NEWS_COLLECTION.to_string(),
            points: vec![point],
            wait: Some(true),
            ordering: Some(WriteOrdering::default()),
            shard_key_selector: None,
        })
        .await
        .map_err(index_err)?;
    Ok(())
}

/// Retrieve a player's stored (standardized) vector from the index.
pub async fn get_player_vector(client: &Qdrant, player_id: i64) -> EngineResult<Vec<f32>> {
    let response = client
        .get_points(GetPoints {
            collection_name: PLAYER_COLLECTION.to_string(),
            ids: vec![PointId {
                point_id_options: Some(PointIdOptions::Num(player_id as u64)),
            }],
            with_payload: Some(WithPayloadSelector::from(false)),
            with_vectors: Some(WithVectorsSelector::from(true)),
            ..Default::default()
        })
        .await
        .map_err(index_err)?;

    if let Some(point) = response.result.first() {
        if let Some(vectors) = &point.vectors {
            if let Some(qdrant_client::qdrant::vectors_output::VectorsOptions::Vector(v)) =
                &vectors.vectors_options
            {
                if v.data.len() != PLAYER_DIM {
                    return Err(EngineError::SchemaMismatch(format!(
                        "stored vector for player {} has {} coordinates, schema has {}",
                        player_id,
                        v.data.len(),
                        PLAYER_DIM
                    )));
                }
                return Ok(v.data.clone());
            }
        }
    }

    error!(target: TARGET_VECTOR, "No stored vector for player {}", player_id);
    Err(EngineError::IndexUnavailable(format!(
        "player {} has no stored vector; run rebuild-vectors or project-new",
        player_id
    )))
}

pub(crate) fn index_err(e: qdrant_client::QdrantError) -> EngineError {
    EngineError::IndexUnavailable(e.to_string())
}
