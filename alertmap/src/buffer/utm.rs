//! UTM zone selection and WGS84 ↔ UTM transforms.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::BufferError;
use crate::extent::BoundingBox;

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// A UTM zone: number 1..=60 plus hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub south: bool,
}

impl UtmZone {
    /// Zone of the box's western edge; southern when the mean latitude is
    /// below the equator.
    ///
    /// Boxes spanning several zones are projected in the western one.
    pub fn for_box(bbox: &BoundingBox) -> Result<Self, BufferError> {
        let number = ((bbox.min_lon + 180.0) / 6.0).floor() + 1.0;
        if !(1.0..=60.0).contains(&number) {
            return Err(BufferError::ProjectionFailure(format!(
                "no UTM zone for longitude {}",
                bbox.min_lon
            )));
        }

        let mean_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
        Ok(Self {
            number: number as u8,
            south: mean_lat < 0.0,
        })
    }

    /// EPSG code of the WGS84 UTM zone (326xx north, 327xx south).
    pub fn epsg(&self) -> u32 {
        let base = if self.south { 32700 } else { 32600 };
        base + self.number as u32
    }

    pub fn proj_string(&self) -> String {
        let hemisphere = if self.south { " +south" } else { "" };
        format!(
            "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
            self.number, hemisphere
        )
    }
}

/// Forward and inverse transforms between WGS84 degrees and one UTM zone.
pub struct UtmTransformer {
    geographic: Proj,
    projected: Proj,
}

impl UtmTransformer {
    pub fn new(zone: UtmZone) -> Result<Self, BufferError> {
        let geographic = Proj::from_proj_string(WGS84)
            .map_err(|e| BufferError::ProjectionFailure(format!("WGS84: {:?}", e)))?;
        let projected = Proj::from_proj_string(&zone.proj_string())
            .map_err(|e| BufferError::ProjectionFailure(format!("EPSG:{}: {:?}", zone.epsg(), e)))?;

        Ok(Self {
            geographic,
            projected,
        })
    }

    /// Degrees to meters.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), BufferError> {
        // Geographic coordinates go in as radians
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&self.geographic, &self.projected, &mut point)
            .map_err(|e| BufferError::ProjectionFailure(format!("forward transform: {:?}", e)))?;
        Ok((point.0, point.1))
    }

    /// Meters to degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64), BufferError> {
        let mut point = (easting, northing, 0.0);
        transform(&self.projected, &self.geographic, &mut point)
            .map_err(|e| BufferError::ProjectionFailure(format!("inverse transform: {:?}", e)))?;
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_from_western_edge() {
        let bbox = BoundingBox::new(-123.23, 45.22, -122.68, 45.62);
        let zone = UtmZone::for_box(&bbox).unwrap();
        assert_eq!(zone.number, 10);
        assert!(!zone.south);
        assert_eq!(zone.epsg(), 32610);
    }

    #[test]
    fn test_southern_hemisphere() {
        // Nairobi area, mean latitude below zero
        let bbox = BoundingBox::new(36.7, -1.4, 37.0, -1.2);
        let zone = UtmZone::for_box(&bbox).unwrap();
        assert_eq!(zone.number, 37);
        assert!(zone.south);
        assert_eq!(zone.epsg(), 32737);
        assert!(zone.proj_string().contains("+south"));
    }

    #[test]
    fn test_zone_edges() {
        assert_eq!(
            UtmZone::for_box(&BoundingBox::new(-180.0, 0.0, -179.0, 1.0))
                .unwrap()
                .number,
            1
        );
        assert_eq!(
            UtmZone::for_box(&BoundingBox::new(179.5, 0.0, 179.9, 1.0))
                .unwrap()
                .number,
            60
        );
    }

    #[test]
    fn test_zone_out_of_range() {
        let bbox = BoundingBox::new(180.0, 0.0, 180.0, 1.0);
        assert!(matches!(
            UtmZone::for_box(&bbox),
            Err(BufferError::ProjectionFailure(_))
        ));
        let bbox = BoundingBox::new(-200.0, 0.0, -190.0, 1.0);
        assert!(UtmZone::for_box(&bbox).is_err());
    }

    #[test]
    fn test_central_meridian_projects_to_false_easting() {
        let zone = UtmZone {
            number: 10,
            south: false,
        };
        let transformer = UtmTransformer::new(zone).unwrap();
        let (easting, northing) = transformer.forward(-123.0, 45.0).unwrap();
        assert!((easting - 500_000.0).abs() < 0.01, "easting {}", easting);
        // 45°N sits just under 5,000 km north of the equator
        assert!((northing - 4_982_950.0).abs() < 100.0, "northing {}", northing);
    }

    #[test]
    fn test_forward_inverse_roundtrip() {
        let zone = UtmZone {
            number: 10,
            south: false,
        };
        let transformer = UtmTransformer::new(zone).unwrap();
        let (e, n) = transformer.forward(-122.68, 45.58).unwrap();
        let (lon, lat) = transformer.inverse(e, n).unwrap();
        assert!((lon - (-122.68)).abs() < 1e-7);
        assert!((lat - 45.58).abs() < 1e-7);
    }
}
