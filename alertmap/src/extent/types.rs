//! Bounding box value type and extent errors.

use std::fmt;
use std::path::PathBuf;

use geojson::{Feature, Geometry, JsonObject, Value};
use thiserror::Error;

/// Axis-aligned geographic bounding box in degrees.
///
/// A box built with [`BoundingBox::empty`] has `min > max` on both axes and
/// represents "no box"; every other box satisfies `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// The identity element for [`BoundingBox::expand`].
    pub fn empty() -> Self {
        Self {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    /// True when no coordinate has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    /// Grows the box to include a position.
    pub fn expand(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }

    /// True when `other` lies inside this box (edges may touch).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.min_lon
            && self.min_lat <= other.min_lat
            && self.max_lon >= other.max_lon
            && self.max_lat >= other.max_lat
    }

    /// True when `other` lies inside this box with no shared edge.
    pub fn strictly_contains(&self, other: &BoundingBox) -> bool {
        self.min_lon < other.min_lon
            && self.min_lat < other.min_lat
            && self.max_lon > other.max_lon
            && self.max_lat > other.max_lat
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Closed exterior ring, counter-clockwise from the south-west corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.min_lon, self.min_lat],
            [self.max_lon, self.min_lat],
            [self.max_lon, self.max_lat],
            [self.min_lon, self.max_lat],
            [self.min_lon, self.min_lat],
        ]
    }

    /// The box as a GeoJSON Polygon feature with empty properties.
    pub fn to_feature(&self) -> Feature {
        let ring = self.ring().iter().map(|c| c.to_vec()).collect();
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: Some(JsonObject::new()),
            foreign_members: None,
        }
    }

    /// `west,south,east,north` as written into MBTiles `bounds` metadata.
    pub fn to_bounds_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.6}, {:.6})",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Errors raised while computing a feature extent.
#[derive(Debug, Error)]
pub enum ExtentError {
    /// Geometry missing, empty, or holding a malformed position.
    #[error("Invalid geometry in feature {feature}: {reason}")]
    InvalidGeometry { feature: usize, reason: String },

    /// Input could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input is not valid GeoJSON.
    #[error("Failed to parse GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
}

/// Result type for extent operations.
pub type ExtentResult<T> = Result<T, ExtentError>;
