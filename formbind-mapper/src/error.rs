//! Error types for the mapping layer.

use formbind_model::SchemaError;
use thiserror::Error;

/// Result type for mapping operations.
pub type MapResult<T> = Result<T, MapError>;

/// Result type for value and file sources.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that abort a mapping walk.
///
/// A walk that fails leaves the target partially populated.
#[derive(Debug, Error)]
pub enum MapError {
    /// Schema misuse detected while walking.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The value source failed to load its input.
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors raised by value and file sources.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The underlying input could not be loaded.
    #[error("failed to load input: {0}")]
    Load(String),

    /// The input was loaded but could not be decoded.
    #[error("failed to decode input: {0}")]
    Decode(String),
}
