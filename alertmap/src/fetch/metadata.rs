//! `metadata.json` sidecar written next to a downloaded tile tree.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::FetchError;

/// File name of the sidecar inside the tile tree root.
pub const SIDECAR_FILE: &str = "metadata.json";

/// Description given to downloaded imagery pyramids.
pub const IMAGERY_DESCRIPTION: &str =
    "Satellite imagery intersecting with the bounding box of the change detection alert GeoJSON";

/// Tile set description stored as `metadata.json`.
///
/// Field names follow the MBTiles metadata keys so the sidecar can be fed
/// straight into a store when the tree is packaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSetMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub attribution: Option<String>,
    pub format: String,
    #[serde(rename = "type")]
    pub layer_type: String,
}

impl TileSetMetadata {
    /// Sidecar for a satellite imagery overlay.
    pub fn imagery(name: &str, attribution: Option<&str>, format: &str) -> Self {
        Self {
            name: name.to_string(),
            description: IMAGERY_DESCRIPTION.to_string(),
            version: "1.0.0".to_string(),
            attribution: attribution.map(str::to_string),
            format: format.to_string(),
            layer_type: "overlay".to_string(),
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(SIDECAR_FILE)
    }

    /// Writes the sidecar into `dir`, replacing any previous one.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, FetchError> {
        let path = Self::path_in(dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Reads the sidecar from `dir`.
    ///
    /// Returns `Ok(None)` when the directory has no sidecar.
    pub fn read_from(dir: &Path) -> Result<Option<Self>, FetchError> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_imagery_sidecar_fields() {
        let metadata = TileSetMetadata::imagery("alert-42", Some("© Imagery"), "jpg");
        let json: serde_json::Value = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["name"], "alert-42");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["format"], "jpg");
        assert_eq!(json["type"], "overlay");
        assert_eq!(json["attribution"], "© Imagery");
        assert_eq!(json["description"], IMAGERY_DESCRIPTION);
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let metadata = TileSetMetadata::imagery("alert", None, "png");

        let path = metadata.write_to(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("metadata.json"));
        assert_eq!(TileSetMetadata::read_from(temp.path()).unwrap(), Some(metadata));
    }

    #[test]
    fn test_missing_sidecar_reads_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(TileSetMetadata::read_from(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_malformed_sidecar_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(SIDECAR_FILE), "{ not json").unwrap();
        assert!(matches!(
            TileSetMetadata::read_from(temp.path()),
            Err(FetchError::Metadata(_))
        ));
    }

    #[test]
    fn test_null_attribution_is_accepted() {
        let json = r#"{"name":"n","description":"d","version":"1.0.0",
            "attribution":null,"format":"jpg","type":"overlay"}"#;
        let metadata: TileSetMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.attribution, None);
    }
}
