//! Coordinate conversion module
//!
//! Slippy map tile mathematics under spherical (Web) Mercator:
//! geographic coordinates to XYZ tiles, quadkey encoding for quadkey-addressed
//! imagery providers, and the XYZ ↔ TMS row flip used by MBTiles stores.

mod types;

pub use types::{
    CoordError, TileCoord, TileRange, TileRangeIter, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
};

use std::f64::consts::PI;

use crate::extent::BoundingBox;

/// Converts geographic coordinates to the XYZ tile containing them.
///
/// Latitude is clamped to the Web Mercator range and the resulting indices
/// are clamped to `[0, 2^zoom - 1]`, so points on the east edge or at the
/// poles still map to a real tile.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to [`MAX_ZOOM`])
#[inline]
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> TileCoord {
    // Calculate number of tiles at this zoom level
    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor();

    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    TileCoord {
        zoom,
        x: x.clamp(0.0, max_index) as u32,
        y: y.clamp(0.0, max_index) as u32,
    }
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Encodes a tile as a quadkey string.
///
/// One digit per zoom level, most significant level first. Each digit
/// interleaves one bit of `x` (weight 1) and one bit of `y` (weight 2).
/// Zoom 0 encodes to the empty string. `tile.zoom` must not exceed
/// [`MAX_ZOOM`].
pub fn tile_to_quadkey(tile: &TileCoord) -> String {
    debug_assert!(tile.zoom <= MAX_ZOOM, "zoom {} above MAX_ZOOM", tile.zoom);
    let mut quadkey = String::with_capacity(tile.zoom as usize);

    for i in (1..=tile.zoom).rev() {
        let mask = 1u32 << (i - 1);
        let mut digit = b'0';
        if tile.x & mask != 0 {
            digit += 1;
        }
        if tile.y & mask != 0 {
            digit += 2;
        }
        quadkey.push(digit as char);
    }

    quadkey
}

/// Decodes a quadkey back into tile coordinates.
pub fn quadkey_to_tile(quadkey: &str) -> Result<TileCoord, CoordError> {
    if quadkey.len() > MAX_ZOOM as usize {
        return Err(CoordError::InvalidQuadkey(quadkey.to_string()));
    }

    let zoom = quadkey.len() as u8;
    let mut x = 0u32;
    let mut y = 0u32;

    for (index, digit) in quadkey.chars().enumerate() {
        let mask = 1u32 << (zoom as usize - index - 1);
        match digit {
            '0' => {}
            '1' => x |= mask,
            '2' => y |= mask,
            '3' => {
                x |= mask;
                y |= mask;
            }
            _ => return Err(CoordError::InvalidQuadkey(quadkey.to_string())),
        }
    }

    Ok(TileCoord { zoom, x, y })
}

/// Flips a row index between the XYZ and TMS conventions.
///
/// `flip_y(flip_y(y, z), z) == y` for every valid row and every zoom up to
/// [`MAX_ZOOM`].
#[inline]
pub fn flip_y(y: u32, zoom: u8) -> u32 {
    debug_assert!(zoom <= MAX_ZOOM, "zoom {} above MAX_ZOOM", zoom);
    let max_index = (1u64 << zoom) - 1;
    (max_index - y as u64) as u32
}

impl TileRange {
    /// Tile rectangle covering a bounding box at the given zoom.
    ///
    /// Columns come from the west and east edges. Rows grow southward, so the
    /// north edge (`max_lat`) gives the smallest row and the south edge
    /// (`min_lat`) the largest.
    pub fn covering(bbox: &BoundingBox, zoom: u8) -> TileRange {
        let north_west = lat_lon_to_tile(bbox.max_lat, bbox.min_lon, zoom);
        let south_east = lat_lon_to_tile(bbox.min_lat, bbox.max_lon, zoom);

        TileRange {
            zoom,
            min_x: north_west.x,
            max_x: south_east.x,
            min_y: north_west.y,
            max_y: south_east.y,
        }
    }
}

/// Tile ranges covering a bounding box for every zoom in `min_zoom..=max_zoom`.
pub fn pyramid(bbox: &BoundingBox, min_zoom: u8, max_zoom: u8) -> Vec<TileRange> {
    (min_zoom..=max_zoom)
        .map(|zoom| TileRange::covering(bbox, zoom))
        .collect()
}
