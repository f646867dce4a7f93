// Vector index configuration and embedding model state
pub const TARGET_VECTOR: &str = "vector_index";
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";

/// Collection holding one standardized feature vector per player.
pub const PLAYER_COLLECTION: &str = "player-vectors";
/// Collection holding one text embedding per news article.
pub const NEWS_COLLECTION: &str = "news-embeddings";

pub const MODEL_URL: &str =
    "https://huggingface.co/intfloat/e5-large-v2/resolve/main/model.safetensors";
pub const TOKENIZER_URL: &str =
    "https://huggingface.co/intfloat/e5-large-v2/resolve/main/tokenizer.json";

use candle_transformers::models::bert::BertModel;
use qdrant_client::Qdrant;
use std::sync::{Arc, OnceLock};
use tokenizers::Tokenizer;

use crate::error::{EngineError, EngineResult};

// Static variables for model and tokenizer
pub static MODEL: OnceLock<Arc<BertModel>> = OnceLock::new();
pub static TOKENIZER: OnceLock<Arc<Tokenizer>> = OnceLock::new();

pub mod config;
pub mod embedding;
pub mod search;
pub mod similarity;
pub mod storage;

// Re-export main components
pub use search::*;
pub use similarity::*;
pub use storage::*;

/// Build a Qdrant client from the environment. A missing or unreachable
/// backing store is transient from the caller's perspective.
pub fn client() -> EngineResult<Qdrant> {
    let url = std::env::var(QDRANT_URL_ENV).map_err(|_| {
        EngineError::IndexUnavailable(format!("{} environment variable not set", QDRANT_URL_ENV))
    })?;
    Qdrant::from_url(&url)
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .map_err(|e| EngineError::IndexUnavailable(format!("cannot reach vector store: {}", e)))
}

/// Returns a reference to the model, if initialized
pub fn model() -> anyhow::Result<Arc<BertModel>> {
    MODEL
        .get()
        .ok_or_else(|| anyhow::anyhow!("Model not initialized"))
        .map(Arc::clone)
}

/// Returns a reference to the tokenizer, if initialized
pub fn tokenizer() -> anyhow::Result<Arc<Tokenizer>> {
    TOKENIZER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Tokenizer not initialized"))
        .map(Arc::clone)
}
