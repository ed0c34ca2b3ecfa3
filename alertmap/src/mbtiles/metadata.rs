//! MBTiles metadata rows.

use std::fmt;
use std::str::FromStr;

use crate::extent::BoundingBox;
use crate::fetch::TileSetMetadata;

/// Name of the composite raster store built from the rendering endpoint.
pub const COMPOSITE_NAME: &str = "Composite change detection raster map";

/// Fallback `name` when nothing else provides one.
pub const DEFAULT_NAME: &str = "alertmap";

/// MBTiles `type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Overlay,
    Baselayer,
}

impl LayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Overlay => "overlay",
            LayerType::Baselayer => "baselayer",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlay" => Ok(LayerType::Overlay),
            "baselayer" => Ok(LayerType::Baselayer),
            other => Err(format!("unknown layer type '{}'", other)),
        }
    }
}

/// Metadata written into a tile store.
///
/// Every field is optional so explicit values can be layered over values
/// read from a sidecar with [`TileStoreMetadata::or`]. Missing required
/// keys fall back to defaults when the rows are produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileStoreMetadata {
    pub name: Option<String>,
    pub layer_type: Option<LayerType>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    pub attribution: Option<String>,
    pub bounds: Option<BoundingBox>,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
}

impl TileStoreMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Metadata of the composite store pulled from the renderer.
    ///
    /// The imagery attribution doubles as the description.
    pub fn composite(attribution: Option<&str>) -> Self {
        Self {
            name: Some(COMPOSITE_NAME.to_string()),
            layer_type: Some(LayerType::Baselayer),
            version: Some("1.1".to_string()),
            description: attribution.map(str::to_string),
            format: Some("jpg".to_string()),
            attribution: attribution.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = Some(min_zoom);
        self.max_zoom = Some(max_zoom);
        self
    }

    /// Field-wise merge: values set on `self` win over `fallback`.
    pub fn or(self, fallback: TileStoreMetadata) -> Self {
        Self {
            name: self.name.or(fallback.name),
            layer_type: self.layer_type.or(fallback.layer_type),
            version: self.version.or(fallback.version),
            description: self.description.or(fallback.description),
            format: self.format.or(fallback.format),
            attribution: self.attribution.or(fallback.attribution),
            bounds: self.bounds.or(fallback.bounds),
            min_zoom: self.min_zoom.or(fallback.min_zoom),
            max_zoom: self.max_zoom.or(fallback.max_zoom),
        }
    }

    /// `(name, value)` rows for the `metadata` table.
    ///
    /// Always contains `name`, `type`, `version`, `description` and
    /// `format`; the remaining keys appear only when set.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("name", self.name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string())),
            ("type", self.layer_type.unwrap_or(LayerType::Overlay).to_string()),
            ("version", self.version.clone().unwrap_or_else(|| "1.0.0".to_string())),
            ("description", self.description.clone().unwrap_or_default()),
            ("format", self.format.clone().unwrap_or_else(|| "jpg".to_string())),
        ];

        if let Some(attribution) = &self.attribution {
            rows.push(("attribution", attribution.clone()));
        }
        if let Some(bounds) = &self.bounds {
            rows.push(("bounds", bounds.to_bounds_string()));
        }
        if let Some(min_zoom) = self.min_zoom {
            rows.push(("minzoom", min_zoom.to_string()));
        }
        if let Some(max_zoom) = self.max_zoom {
            rows.push(("maxzoom", max_zoom.to_string()));
        }

        rows
    }
}

impl From<TileSetMetadata> for TileStoreMetadata {
    fn from(sidecar: TileSetMetadata) -> Self {
        Self {
            name: Some(sidecar.name),
            layer_type: sidecar.layer_type.parse().ok(),
            version: Some(sidecar.version),
            description: Some(sidecar.description),
            format: Some(sidecar.format),
            attribution: sidecar.attribution,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(rows: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        rows.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_defaults_fill_required_keys() {
        let rows = TileStoreMetadata::default().rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(row(&rows, "name"), Some("alertmap"));
        assert_eq!(row(&rows, "type"), Some("overlay"));
        assert_eq!(row(&rows, "version"), Some("1.0.0"));
        assert_eq!(row(&rows, "description"), Some(""));
        assert_eq!(row(&rows, "format"), Some("jpg"));
    }

    #[test]
    fn test_composite_metadata() {
        let rows = TileStoreMetadata::composite(Some("Imagery © Provider")).rows();
        assert_eq!(row(&rows, "name"), Some(COMPOSITE_NAME));
        assert_eq!(row(&rows, "type"), Some("baselayer"));
        assert_eq!(row(&rows, "version"), Some("1.1"));
        assert_eq!(row(&rows, "description"), Some("Imagery © Provider"));
        assert_eq!(row(&rows, "format"), Some("jpg"));
    }

    #[test]
    fn test_optional_keys() {
        let rows = TileStoreMetadata::named("n")
            .with_bounds(BoundingBox::new(-123.5, 45.0, -122.5, 46.0))
            .with_zoom_range(1, 14)
            .rows();
        assert_eq!(row(&rows, "bounds"), Some("-123.5,45,-122.5,46"));
        assert_eq!(row(&rows, "minzoom"), Some("1"));
        assert_eq!(row(&rows, "maxzoom"), Some("14"));
        assert_eq!(row(&rows, "attribution"), None);
    }

    #[test]
    fn test_explicit_values_win_over_sidecar() {
        let sidecar = TileSetMetadata::imagery("from-sidecar", Some("Sidecar attribution"), "png");
        let merged = TileStoreMetadata::named("explicit").or(sidecar.into());

        assert_eq!(merged.name.as_deref(), Some("explicit"));
        assert_eq!(merged.format.as_deref(), Some("png"));
        assert_eq!(merged.attribution.as_deref(), Some("Sidecar attribution"));
        assert_eq!(merged.layer_type, Some(LayerType::Overlay));
    }

    #[test]
    fn test_layer_type_parse() {
        assert_eq!("BaseLayer".parse::<LayerType>(), Ok(LayerType::Baselayer));
        assert!("raster".parse::<LayerType>().is_err());
    }
}
