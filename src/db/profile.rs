use chrono::Utc;
use tracing::info;

use super::core::Database;
use crate::error::{EngineError, EngineResult};
use crate::features::profile::NormalizationProfile;
use crate::features::PLAYER_DIM;
use crate::TARGET_DB;

impl Database {
    /// Persist a freshly fitted profile as a new version and return it with
    /// its assigned version number.
    pub async fn save_profile(
        &self,
        profile: &NormalizationProfile,
    ) -> EngineResult<NormalizationProfile> {
        let means = serde_json::to_string(&profile.means)
            .map_err(|e| EngineError::SchemaMismatch(format!("unserializable profile: {}", e)))?;
        let scales = serde_json::to_string(&profile.scales)
            .map_err(|e| EngineError::SchemaMismatch(format!("unserializable profile: {}", e)))?;

        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO normalization_profiles (schema_version, dim, means, scales, fitted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING version
            "#,
        )
        .bind(profile.schema_version)
        .bind(profile.dim() as i64)
        .bind(means)
        .bind(scales)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(self.pool())
        .await?;

        info!(target: TARGET_DB, "Persisted normalization profile v{}", row.0);

        Ok(NormalizationProfile {
            version: row.0,
            ..profile.clone()
        })
    }

    /// Load the newest persisted profile. Verifies it still matches the
    /// compiled feature schema before handing it out.
    pub async fn load_active_profile(&self) -> EngineResult<NormalizationProfile> {
        let row = sqlx::query_as::<_, (i64, i64, i64, String, String)>(
            r#"
            SELECT version, schema_version, dim, means, scales
            FROM normalization_profiles
            ORDER BY version DESC LIMIT 1
            "#,
        )
        .fetch_optional(self.pool())
        .await?;

        let Some((version, schema_version, dim, means, scales)) = row else {
            return Err(EngineError::NotFound(
                "no normalization profile fitted yet; run rebuild-vectors first".to_string(),
            ));
        };

        if dim as usize != PLAYER_DIM {
            return Err(EngineError::SchemaMismatch(format!(
                "stored profile v{} has dimension {}, extractor schema has {}",
                version, dim, PLAYER_DIM
            )));
        }

        let means: Vec<f64> = serde_json::from_str(&means)
            .map_err(|e| EngineError::SchemaMismatch(format!("corrupt profile v{}: {}", version, e)))?;
        let scales: Vec<f64> = serde_json::from_str(&scales)
            .map_err(|e| EngineError::SchemaMismatch(format!("corrupt profile v{}: {}", version, e)))?;

        if means.len() != PLAYER_DIM || scales.len() != PLAYER_DIM {
            return Err(EngineError::SchemaMismatch(format!(
                "stored profile v{} arrays do not match dimension {}",
                version, PLAYER_DIM
            )));
        }

        Ok(NormalizationProfile {
            version,
            schema_version,
            means,
            scales,
        })
    }
}
