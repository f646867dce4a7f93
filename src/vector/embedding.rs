use anyhow::Result;
use candle_core::{DType, Tensor};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::vector::{
    config::{init_e5_model, init_e5_tokenizer, E5Config},
    TARGET_VECTOR,
};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

async fn ensure_initialized(config: &E5Config) -> Result<()> {
    if INITIALIZED.load(Ordering::Relaxed) {
        return Ok(());
    }
    let init_start = Instant::now();
    config.ensure_models_exist().await?;
    init_e5_model(config)?;
    init_e5_tokenizer(config)?;
    INITIALIZED.store(true, Ordering::Relaxed);
    info!(target: TARGET_VECTOR, "Embedding model ready in {:?}", init_start.elapsed());
    Ok(())
}

/// Run the model over a prefixed text and mean-pool into a unit vector.
async fn embed(prefixed_text: &str, config: &E5Config) -> Result<Vec<f32>> {
    let start_time = Instant::now();
    let model = crate::vector::model()?;
    let tokenizer = crate::vector::tokenizer()?;

    let encoding = tokenizer
        .encode(prefixed_text, true)
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    // Truncate to max_length - 1 to avoid index boundary issues
    let max_len = config.max_length - 1;
    let input_ids: Vec<i64> = encoding
        .get_ids()
        .iter()
        .take(max_len)
        .map(|&x| x as i64)
        .collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .take(max_len)
        .map(|&x| x as i64)
        .collect();

    let input_ids = Tensor::new(input_ids, &config.device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(attention_mask, &config.device)?.unsqueeze(0)?;

    let hidden_state = model.forward(&input_ids, &attention_mask, None)?;

    // Mean pooling: zero out padding positions, sum over the sequence, and
    // divide by the valid token count.
    let attention_mask_float = attention_mask.to_dtype(DType::F32)?;
    let attention_mask_expanded = attention_mask_float
        .unsqueeze(2)?
        .expand(hidden_state.shape())?;
    let masked_hidden = hidden_state.mul(&attention_mask_expanded)?;
    let summed_hidden = masked_hidden.sum(1)?;
    let valid_token_counts = attention_mask_float
        .sum(1)?
        .unsqueeze(1)?
        .clamp(1.0, f32::MAX)?;
    let valid_token_counts_expanded = valid_token_counts.expand(summed_hidden.shape())?;
    let mean_pooled = summed_hidden.div(&valid_token_counts_expanded)?;

    // L2 normalize
    let norm = mean_pooled.sqr()?.sum(1)?.sqrt()?.unsqueeze(1)?;
    let norm_expanded = norm.expand(mean_pooled.shape())?;
    let normalized = mean_pooled.div(&norm_expanded)?;

    let vector = normalized.squeeze(0)?.to_vec1::<f32>()?;

    debug!(target: TARGET_VECTOR,
        "Embedded {} tokens into {} dimensions in {:?}",
        input_ids.dims()[1],
        vector.len(),
        start_time.elapsed()
    );

    Ok(vector)
}

async fn embed_validated(prefixed_text: &str) -> Result<Option<Vec<f32>>> {
    let config = E5Config::default();
    ensure_initialized(&config).await?;

    match embed(prefixed_text, &config).await {
        Ok(embedding) => {
            if embedding.len() != config.dimensions {
                error!(target: TARGET_VECTOR,
                    "Unexpected embedding dimensions: got {}, expected {}",
                    embedding.len(), config.dimensions);
                return Ok(None);
            }
            Ok(Some(embedding))
        }
        Err(e) => {
            error!(target: TARGET_VECTOR, "Failed to generate embedding: {:?}", e);
            Ok(None)
        }
    }
}

/// Embed article text for storage. E5 expects the "passage:" prefix on
/// documents and "query:" on searches; mixing them degrades retrieval.
pub async fn get_article_vector(text: &str) -> Result<Option<Vec<f32>>> {
    embed_validated(&format!("passage: {}", text)).await
}

/// Embed a free-text search query.
pub async fn get_query_vector(text: &str) -> Result<Option<Vec<f32>>> {
    embed_validated(&format!("query: {}", text)).await
}
