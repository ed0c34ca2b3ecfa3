//! Tile store errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::provider::ProviderError;
use crate::renderer::RendererError;

/// Errors that abort building or reading a tile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected a write; the store is incomplete.
    #[error("Failed to write tile store {}: {source}", path.display())]
    StoreWriteFailure {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Failed to read tile store {}: {source}", path.display())]
    StoreReadFailure {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The box has no area, so there is no tile to pull.
    #[error("Cannot build a tile store for an empty extent")]
    EmptyExtent,

    #[error("Tile directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Tile set metadata: {0}")]
    Metadata(#[from] FetchError),

    #[error(transparent)]
    Renderer(#[from] RendererError),

    #[error("Rendering endpoint: {0}")]
    Endpoint(#[from] ProviderError),

    /// The blocking writer task panicked or was aborted.
    #[error("Tile store writer task failed: {0}")]
    WriterTask(String),
}

/// Result type for tile store operations.
pub type StoreResult<T> = Result<T, StoreError>;
