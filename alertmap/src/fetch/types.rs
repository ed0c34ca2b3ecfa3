//! Fetch requests, outcomes and errors.

use std::path::PathBuf;

use thiserror::Error;

use super::TileSetMetadata;
use crate::coord::TileCoord;
use crate::extent::BoundingBox;

/// Default number of tile requests in flight.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default first zoom level of an imagery pyramid.
pub const DEFAULT_MIN_ZOOM: u8 = 1;

/// What to download and where to put it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Area to cover, usually already buffered
    pub bbox: BoundingBox,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Root of the `<zoom>/<x>/<y>.<ext>` tree
    pub output_dir: PathBuf,
    /// File extension without the dot
    pub extension: String,
    /// Sidecar written once every zoom level is done
    pub metadata: TileSetMetadata,
}

/// Result of handling a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    Downloaded { bytes: u64 },
    /// File already on disk, no request made
    Skipped,
    Failed,
}

/// Progress events emitted while a pyramid is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchProgress {
    Started { total: u64 },
    Tile { tile: TileCoord, outcome: TileOutcome },
}

/// Counters for a finished (or cancelled) fetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Bytes written by this run
    pub bytes: u64,
    /// Set when cancellation stopped the run before every tile was handled
    pub cancelled: bool,
}

impl FetchReport {
    pub fn record(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            TileOutcome::Skipped => self.skipped += 1,
            TileOutcome::Failed => self.failed += 1,
        }
    }

    /// Tiles handled so far, whatever their outcome.
    pub fn processed(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }

    /// True when every tile is on disk.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed == 0
    }
}

/// Errors that abort a fetch run.
///
/// Individual tile download failures are not errors; they are counted in
/// [`FetchReport::failed`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid zoom range {min}..={max}")]
    InvalidZoomRange { min: u8, max: u8 },

    /// The box has no area, so no tile covers it.
    #[error("Cannot fetch tiles for an empty extent")]
    EmptyExtent,

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid tile set metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}
