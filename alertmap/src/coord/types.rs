//! Coordinate type definitions

use std::fmt;

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Deepest zoom level whose tile indices fit the quadkey and TMS arithmetic.
pub const MAX_ZOOM: u8 = 30;

/// Tile coordinates in the XYZ (Google/OSM) slippy map scheme.
///
/// Row 0 is the northernmost row. Use [`TileCoord::tms_y`] for the
/// bottom-left origin convention used inside MBTiles stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level
    pub zoom: u8,
    /// Column, 0 at the antimeridian going east
    pub x: u32,
    /// Row, 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u64 {
        1u64 << self.zoom
    }

    /// Row index in the TMS convention (row 0 at the south edge).
    #[inline]
    pub fn tms_y(&self) -> u32 {
        super::flip_y(self.y, self.zoom)
    }

    /// The tile one zoom level up that contains this tile.
    ///
    /// Returns `None` at zoom 0.
    pub fn parent(&self) -> Option<TileCoord> {
        if self.zoom == 0 {
            return None;
        }
        Some(TileCoord {
            zoom: self.zoom - 1,
            x: self.x >> 1,
            y: self.y >> 1,
        })
    }

    /// The four tiles one zoom level down, in quadkey digit order.
    pub fn children(&self) -> [TileCoord; 4] {
        let zoom = self.zoom + 1;
        let (x, y) = (self.x << 1, self.y << 1);
        [
            TileCoord { zoom, x, y },
            TileCoord { zoom, x: x + 1, y },
            TileCoord { zoom, x, y: y + 1 },
            TileCoord {
                zoom,
                x: x + 1,
                y: y + 1,
            },
        ]
    }

    /// Relative path of this tile inside an XYZ directory tree.
    pub fn relative_path(&self, extension: &str) -> String {
        format!("{}/{}/{}.{}", self.zoom, self.x, self.y, extension)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Rectangle of tiles at a single zoom level, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Number of columns in the range.
    pub fn width(&self) -> u64 {
        (self.max_x - self.min_x) as u64 + 1
    }

    /// Number of rows in the range.
    pub fn height(&self) -> u64 {
        (self.max_y - self.min_y) as u64 + 1
    }

    /// Total number of tiles in the rectangle.
    pub fn tile_count(&self) -> u64 {
        self.width() * self.height()
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Iterates every tile in the rectangle, column by column.
    pub fn tiles(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next_x: self.min_x as u64,
            next_y: self.min_y as u64,
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles()
    }
}

/// Iterator over a [`TileRange`].
///
/// Yields tiles column-major (all rows of `min_x`, then `min_x + 1`, ...),
/// matching the on-disk `<zoom>/<x>/<y>` grouping.
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    next_x: u64,
    next_y: u64,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_x > self.range.max_x as u64 {
            return None;
        }

        let tile = TileCoord {
            zoom: self.range.zoom,
            x: self.next_x as u32,
            y: self.next_y as u32,
        };

        self.next_y += 1;
        if self.next_y > self.range.max_y as u64 {
            self.next_y = self.range.min_y as u64;
            self.next_x += 1;
        }

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.next_x > self.range.max_x as u64 {
            return (0, Some(0));
        }
        let full_columns = self.range.max_x as u64 - self.next_x;
        let remaining =
            full_columns * self.range.height() + (self.range.max_y as u64 - self.next_y + 1);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileRangeIter {}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Quadkey contains invalid characters or is too long
    #[error(
        "Invalid quadkey: '{0}' (must contain only digits 0-3 and length <= {max})",
        max = MAX_ZOOM
    )]
    InvalidQuadkey(String),
}
