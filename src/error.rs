//! Error types for the retrieval engine boundary.

use thiserror::Error;

/// Errors surfaced by the player retrieval engine.
///
/// An empty result list is never an error: it is the valid outcome of a
/// query whose filters eliminated every candidate. These variants cover
/// genuine faults only.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Reference player or requested ids absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Out-of-range k, negative ages or minutes
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Feature column missing or vector dimensionality drift. Fatal: the
    /// stored index no longer matches the extractor schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Backing vector store unreachable or inconsistent; retryable by the caller.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
