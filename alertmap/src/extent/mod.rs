//! Feature extent computation.
//!
//! Walks every geometry of a GeoJSON feature set and returns the minimal
//! axis-aligned box holding every position. Traversal dispatches on the
//! tagged geometry variant, so Point, LineString, Polygon, their Multi*
//! forms and GeometryCollections all go through the same code path.

mod types;

pub use types::{BoundingBox, ExtentError, ExtentResult};

use std::fs;
use std::path::Path;

use geojson::{Feature, GeoJson, Geometry, Position, Value};
use tracing::debug;

impl BoundingBox {
    /// Minimal box containing every coordinate of every feature.
    ///
    /// An empty feature list yields [`BoundingBox::empty`].
    ///
    /// # Errors
    ///
    /// [`ExtentError::InvalidGeometry`] when a feature has no geometry, an
    /// empty coordinate sequence, or a position with fewer than two values.
    pub fn from_features(features: &[Feature]) -> ExtentResult<BoundingBox> {
        let mut bbox = BoundingBox::empty();

        for (index, feature) in features.iter().enumerate() {
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or_else(|| invalid(index, "feature has no geometry"))?;
            accumulate_geometry(&mut bbox, geometry, index)?;
        }

        Ok(bbox)
    }
}

/// Extent of any GeoJSON document.
///
/// A bare geometry counts as a single feature.
pub fn bounding_box_of(geojson: &GeoJson) -> ExtentResult<BoundingBox> {
    match geojson {
        GeoJson::FeatureCollection(collection) => BoundingBox::from_features(&collection.features),
        GeoJson::Feature(feature) => BoundingBox::from_features(std::slice::from_ref(feature)),
        GeoJson::Geometry(geometry) => {
            let mut bbox = BoundingBox::empty();
            accumulate_geometry(&mut bbox, geometry, 0)?;
            Ok(bbox)
        }
    }
}

/// Parses a GeoJSON payload into its list of features.
pub fn parse_features(payload: &str) -> ExtentResult<Vec<Feature>> {
    let geojson: GeoJson = payload.parse()?;
    Ok(match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    })
}

/// Reads a GeoJSON file into its list of features.
pub fn read_features(path: &Path) -> ExtentResult<Vec<Feature>> {
    let payload = fs::read_to_string(path).map_err(|source| ExtentError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let features = parse_features(&payload)?;
    debug!(path = %path.display(), features = features.len(), "Loaded GeoJSON");
    Ok(features)
}

fn accumulate_geometry(
    bbox: &mut BoundingBox,
    geometry: &Geometry,
    feature: usize,
) -> ExtentResult<()> {
    match &geometry.value {
        Value::Point(position) => accumulate_position(bbox, position, feature),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            accumulate_positions(bbox, positions, feature)
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            non_empty(lines, feature)?;
            lines
                .iter()
                .try_for_each(|line| accumulate_positions(bbox, line, feature))
        }
        Value::MultiPolygon(polygons) => {
            non_empty(polygons, feature)?;
            for polygon in polygons {
                non_empty(polygon, feature)?;
                for ring in polygon {
                    accumulate_positions(bbox, ring, feature)?;
                }
            }
            Ok(())
        }
        Value::GeometryCollection(geometries) => {
            non_empty(geometries, feature)?;
            geometries
                .iter()
                .try_for_each(|inner| accumulate_geometry(bbox, inner, feature))
        }
    }
}

fn accumulate_positions(
    bbox: &mut BoundingBox,
    positions: &[Position],
    feature: usize,
) -> ExtentResult<()> {
    non_empty(positions, feature)?;
    positions
        .iter()
        .try_for_each(|position| accumulate_position(bbox, position, feature))
}

fn accumulate_position(
    bbox: &mut BoundingBox,
    position: &Position,
    feature: usize,
) -> ExtentResult<()> {
    // A third value is elevation and does not affect the planar extent
    match position.as_slice() {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => {
            bbox.expand(*lon, *lat);
            Ok(())
        }
        [_, _, ..] => Err(invalid(feature, "position holds a non-finite value")),
        _ => Err(invalid(
            feature,
            &format!("position has {} values, expected 2", position.len()),
        )),
    }
}

fn non_empty<T>(items: &[T], feature: usize) -> ExtentResult<()> {
    if items.is_empty() {
        return Err(invalid(feature, "empty coordinate sequence"));
    }
    Ok(())
}

fn invalid(feature: usize, reason: &str) -> ExtentError {
    ExtentError::InvalidGeometry {
        feature,
        reason: reason.to_string(),
    }
}
