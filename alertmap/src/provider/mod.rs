//! Tile source abstraction
//!
//! This module provides the HTTP client seam and the template-driven tile
//! source used both for imagery download and for pulling rendered tiles
//! from a live rendering endpoint.
//!
//! ```ignore
//! use alertmap::provider::{ReqwestClient, TemplateSource, TileUrlTemplate};
//!
//! let template = TileUrlTemplate::parse("https://tiles.example.com/{z}/{x}/{y}.jpg")?;
//! let source = TemplateSource::new(ReqwestClient::new()?, template, "imagery");
//! ```

mod http;
mod template;
mod types;

pub use http::{AsyncHttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use template::{TileAddressing, TileUrlTemplate};
pub use types::{ProviderError, TileSource};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

use crate::coord::TileCoord;

/// Tile source backed by an HTTP endpoint and a URL template.
pub struct TemplateSource<C: AsyncHttpClient> {
    http_client: C,
    template: TileUrlTemplate,
    name: String,
}

impl<C: AsyncHttpClient> TemplateSource<C> {
    pub fn new(http_client: C, template: TileUrlTemplate, name: impl Into<String>) -> Self {
        Self {
            http_client,
            template,
            name: name.into(),
        }
    }

    pub fn template(&self) -> &TileUrlTemplate {
        &self.template
    }

    pub fn http_client(&self) -> &C {
        &self.http_client
    }
}

impl<C: AsyncHttpClient> TileSource for TemplateSource<C> {
    async fn fetch_tile(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        let url = self.template.url_for(tile);
        let body = self.http_client.get(&url).await?;
        if body.is_empty() {
            return Err(ProviderError::InvalidResponse(format!("empty body from {}", url)));
        }
        Ok(body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
