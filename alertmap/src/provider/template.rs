//! Tile URL templates.
//!
//! Imagery sources are addressed either by quadkey (`{q}` or `{quadkey}`)
//! or by slippy-map indices (`{z}`, `{x}`, `{y}`). Sources serving TMS rows
//! use `{-y}` in place of `{y}`.

use std::fmt;

use super::ProviderError;
use crate::coord::{tile_to_quadkey, TileCoord};

/// How a template addresses tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileAddressing {
    Quadkey,
    Xyz,
    Tms,
}

/// Validated tile URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    template: String,
    addressing: TileAddressing,
}

impl TileUrlTemplate {
    /// Parses and validates a template.
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidTemplate`] unless the template carries a
    /// quadkey placeholder or all three of zoom, column and row.
    pub fn parse(template: &str) -> Result<Self, ProviderError> {
        let has = |placeholder: &str| template.contains(placeholder);

        let addressing = if has("{q}") || has("{quadkey}") {
            TileAddressing::Quadkey
        } else if has("{z}") && has("{x}") && has("{-y}") {
            TileAddressing::Tms
        } else if has("{z}") && has("{x}") && has("{y}") {
            TileAddressing::Xyz
        } else {
            return Err(ProviderError::InvalidTemplate(template.to_string()));
        };

        Ok(Self {
            template: template.to_string(),
            addressing,
        })
    }

    pub fn addressing(&self) -> TileAddressing {
        self.addressing
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Expands the template for one tile.
    pub fn url_for(&self, tile: &TileCoord) -> String {
        match self.addressing {
            TileAddressing::Quadkey => {
                let quadkey = tile_to_quadkey(tile);
                self.template
                    .replace("{quadkey}", &quadkey)
                    .replace("{q}", &quadkey)
            }
            TileAddressing::Xyz | TileAddressing::Tms => self
                .template
                .replace("{z}", &tile.zoom.to_string())
                .replace("{x}", &tile.x.to_string())
                .replace("{-y}", &tile.tms_y().to_string())
                .replace("{y}", &tile.y.to_string()),
        }
    }
}

impl fmt::Display for TileUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
