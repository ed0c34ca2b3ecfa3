//! Where a run puts its files.

use std::path::{Path, PathBuf};

/// Output paths of a single alert map, rooted at `<root>/<name>/`.
///
/// ```text
/// <root>/<name>/
/// ├── <name>.mbtiles              composite store (live mode)
/// └── mapgl-map/tiles/
///     ├── <name>.mbtiles          imagery store
///     └── xyz/<z>/<x>/<y>.<ext>   downloaded imagery
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    directory: PathBuf,
    name: String,
}

impl OutputLayout {
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            directory: root.join(name),
            name: name.to_string(),
        }
    }

    /// Layout named after the input file's stem, `alert.geojson` → `alert`.
    pub fn for_input(root: &Path, input: &Path) -> Option<Self> {
        let stem = input.file_stem()?.to_str()?;
        Some(Self::new(root, stem))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn tiles_dir(&self) -> PathBuf {
        self.directory.join("mapgl-map").join("tiles")
    }

    pub fn tile_dir(&self) -> PathBuf {
        self.tiles_dir().join("xyz")
    }

    pub fn imagery_store(&self) -> PathBuf {
        self.tiles_dir().join(format!("{}.mbtiles", self.name))
    }

    pub fn composite_store(&self) -> PathBuf {
        self.directory.join(format!("{}.mbtiles", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new(Path::new("outputs"), "alert");
        assert_eq!(layout.directory(), Path::new("outputs/alert"));
        assert_eq!(layout.tile_dir(), PathBuf::from("outputs/alert/mapgl-map/tiles/xyz"));
        assert_eq!(
            layout.imagery_store(),
            PathBuf::from("outputs/alert/mapgl-map/tiles/alert.mbtiles")
        );
        assert_eq!(layout.composite_store(), PathBuf::from("outputs/alert/alert.mbtiles"));
    }

    #[test]
    fn test_for_input_uses_stem() {
        let layout =
            OutputLayout::for_input(Path::new("outputs"), Path::new("data/fires.geojson")).unwrap();
        assert_eq!(layout.name(), "fires");
    }
}
