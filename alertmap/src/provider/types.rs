//! Provider types and traits

use std::fmt;
use std::future::Future;

use crate::coord::TileCoord;

/// Errors that can occur while retrieving a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Request could not be sent or the body could not be read
    HttpError(String),
    /// Server answered with a non-success status
    HttpStatus { status: u16, url: String },
    /// Response arrived but is unusable (e.g. empty body)
    InvalidResponse(String),
    /// URL template has no usable tile placeholders
    InvalidTemplate(String),
}

impl ProviderError {
    /// True when the server answered with 404 Not Found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::HttpStatus { status: 404, .. })
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::HttpStatus { status, url } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::InvalidTemplate(template) => write!(
                f,
                "Invalid tile URL template '{}': expected {{q}} or {{z}}, {{x}} and {{y}}",
                template
            ),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Source of encoded tile images.
///
/// Implementors retrieve the raw bytes of one tile addressed in the XYZ
/// scheme. The bytes are stored as-is; no decoding happens.
pub trait TileSource: Send + Sync {
    /// Retrieves one tile.
    fn fetch_tile(
        &self,
        tile: &TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Human-readable source name used in logs.
    fn name(&self) -> &str;
}
