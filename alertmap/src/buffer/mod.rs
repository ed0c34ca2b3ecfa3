//! Geodetic buffering of bounding boxes.
//!
//! A box is widened by a distance in kilometers by projecting its corners
//! into the UTM zone of its western edge, buffering the resulting polygon in
//! meters, projecting every vertex of the buffered outline back to WGS84 and
//! taking the bounds.

mod utm;

pub use utm::{UtmTransformer, UtmZone};

use geo::{Area, Buffer, Coord, CoordsIter, LineString, MultiPoint, Point, Polygon};
use thiserror::Error;
use tracing::debug;

use crate::extent::BoundingBox;

/// Errors raised while buffering.
#[derive(Debug, Error)]
pub enum BufferError {
    /// UTM zone out of range or a coordinate transform failed.
    #[error("Projection failure: {0}")]
    ProjectionFailure(String),
}

/// Parses a buffer distance in kilometers.
///
/// Returns `None` for anything that is not a finite number, which callers
/// treat the same as "no buffer".
pub fn parse_buffer_distance(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|distance| distance.is_finite())
}

/// Widens bounding boxes by a ground distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodeticBufferer;

impl GeodeticBufferer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the box widened by `distance_km` on every side.
    ///
    /// An absent, zero, negative or non-numeric distance returns the box
    /// unchanged, as does an empty box.
    ///
    /// # Errors
    ///
    /// [`BufferError::ProjectionFailure`] when the box has no UTM zone or a
    /// transform fails.
    pub fn buffer(
        &self,
        bbox: &BoundingBox,
        distance_km: Option<f64>,
    ) -> Result<BoundingBox, BufferError> {
        let distance_km = match distance_km {
            Some(d) if d > 0.0 && d.is_finite() => d,
            _ => return Ok(*bbox),
        };
        if bbox.is_empty() {
            return Ok(*bbox);
        }

        let zone = UtmZone::for_box(bbox)?;
        let transformer = UtmTransformer::new(zone)?;

        let exterior = bbox
            .ring()
            .iter()
            .map(|[lon, lat]| {
                transformer
                    .forward(*lon, *lat)
                    .map(|(x, y)| Coord { x, y })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let distance_m = distance_km * 1000.0;
        let projected = Polygon::new(LineString::from(exterior.clone()), vec![]);

        // Zero-area boxes (a single point or a straight line) have no interior
        // to offset; the disks around their corners give the same bounds.
        let buffered = if projected.unsigned_area() > 0.0 {
            projected.buffer(distance_m)
        } else {
            let corners: Vec<Point> = exterior.into_iter().map(Point::from).collect();
            MultiPoint::new(corners).buffer(distance_m)
        };

        let mut result = BoundingBox::empty();
        for coord in buffered.exterior_coords_iter() {
            let (lon, lat) = transformer.inverse(coord.x, coord.y)?;
            result.expand(lon, lat);
        }

        if result.is_empty() {
            return Err(BufferError::ProjectionFailure(
                "buffered outline has no vertices".to_string(),
            ));
        }

        debug!(
            zone = zone.epsg(),
            distance_km,
            input = %bbox,
            output = %result,
            "Buffered bounding box"
        );

        Ok(result)
    }
}
