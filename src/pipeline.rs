use chrono::Utc;
use tracing::{info, warn};

use crate::db::{Database, Player};
use crate::error::{EngineError, EngineResult};
use crate::features::extract::feature_vector;
use crate::features::profile::NormalizationProfile;
use crate::features::{PLAYER_DIM, SCHEMA_VERSION};
use crate::vector::storage::{
    player_point, recreate_player_collection, upsert_player_points, IndexTuning,
};
use crate::vector::{client, TARGET_VECTOR};

fn standardized_points(
    players: &[Player],
    profile: &NormalizationProfile,
) -> EngineResult<Vec<qdrant_client::qdrant::PointStruct>> {
    players
        .iter()
        .map(|p| {
            let standardized = profile.apply(&feature_vector(&p.stats))?;
            Ok(player_point(p, standardized, profile.version))
        })
        .collect()
}

/// Refit the normalization profile over the whole population and rebuild
/// the player index from scratch.
///
/// Standardization couples every vector to the population it was fitted on,
/// so a partial rewrite would leave old and new scales mixed in one
/// collection. The collection is recreated and written in full under the
/// new profile version instead.
pub async fn rebuild_vectors(db: &Database, tuning: &IndexTuning) -> EngineResult<usize> {
    let players = db.all_players().await?;
    if players.is_empty() {
        return Err(EngineError::NotFound(
            "no players in database; run ingest first".to_string(),
        ));
    }
    info!(target: TARGET_VECTOR, "Rebuilding vectors for {} players", players.len());

    let matrix: Vec<Vec<f32>> = players.iter().map(|p| feature_vector(&p.stats)).collect();
    let profile = db.save_profile(&NormalizationProfile::fit(&matrix)?).await?;
    info!(
        target: TARGET_VECTOR,
        "Fitted normalization profile v{} (schema v{}, dim {})",
        profile.version, SCHEMA_VERSION, PLAYER_DIM
    );

    let points = standardized_points(&players, &profile)?;

    let client = client()?;
    recreate_player_collection(&client, tuning).await?;
    let written = upsert_player_points(&client, points).await?;

    let ids: Vec<i64> = players.iter().map(|p| p.id).collect();
    db.mark_vectorized(&ids, &Utc::now().to_rfc3339()).await?;
    Ok(written)
}

/// Project players added since the last rebuild into the existing index
/// using the active profile. Their vectors are standardized against the
/// population the profile was fitted on, which drifts as players are added;
/// a periodic full rebuild corrects that.
pub async fn project_new_players(db: &Database) -> EngineResult<usize> {
    let profile = db.load_active_profile().await?;
    let players = db.unvectorized_players().await?;
    if players.is_empty() {
        info!(target: TARGET_VECTOR, "No unprojected players found");
        return Ok(0);
    }
    warn!(
        target: TARGET_VECTOR,
        "Projecting {} players under profile v{} fitted before they existed",
        players.len(),
        profile.version
    );

    let points = standardized_points(&players, &profile)?;

    let client = client()?;
    let written = upsert_player_points(&client, points).await?;

    let ids: Vec<i64> = players.iter().map(|p| p.id).collect();
    db.mark_vectorized(&ids, &Utc::now().to_rfc3339()).await?;
    Ok(written)
}
