//! Tile pyramid download.
//!
//! Fetches every tile of a zoom range that intersects a bounding box into a
//! `<zoom>/<x>/<y>.<ext>` tree. Tiles already on disk are skipped, so an
//! interrupted run resumes where it stopped. Requests run concurrently up
//! to a fixed cap; a failed tile is logged and counted but never stops its
//! siblings.

mod metadata;
mod types;

pub use metadata::{TileSetMetadata, IMAGERY_DESCRIPTION, SIDECAR_FILE};
pub use types::{
    FetchError, FetchProgress, FetchReport, FetchRequest, TileOutcome, DEFAULT_MAX_CONCURRENT,
    DEFAULT_MIN_ZOOM,
};

use std::path::Path;
use std::pin::pin;

use futures::stream::{self, StreamExt};
use tokio::fs;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::coord::{pyramid, TileCoord, MAX_ZOOM};
use crate::provider::TileSource;

/// Downloads tile pyramids from a [`TileSource`].
pub struct TilePyramidFetcher<S: TileSource> {
    source: S,
    max_concurrent: usize,
    cancellation: CancellationToken,
    progress: Option<mpsc::UnboundedSender<FetchProgress>>,
}

impl<S: TileSource> TilePyramidFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            cancellation: CancellationToken::new(),
            progress: None,
        }
    }

    /// Caps the number of requests in flight (at least one).
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Stops scheduling new tiles once `token` is cancelled.
    ///
    /// Requests already in flight are allowed to finish.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<FetchProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Downloads every tile of the request.
    ///
    /// Writes `metadata.json` into the output root once all zoom levels are
    /// handled. A cancelled run returns its partial report with
    /// `cancelled` set and leaves the sidecar untouched.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty box, an invalid zoom range or when a
    /// tile cannot be written to disk. Download failures are counted, not
    /// returned.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchReport, FetchError> {
        if request.bbox.is_empty() {
            return Err(FetchError::EmptyExtent);
        }
        if request.min_zoom > request.max_zoom || request.max_zoom > MAX_ZOOM {
            return Err(FetchError::InvalidZoomRange {
                min: request.min_zoom,
                max: request.max_zoom,
            });
        }

        fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|source| FetchError::Io {
                path: request.output_dir.clone(),
                source,
            })?;

        let ranges = pyramid(&request.bbox, request.min_zoom, request.max_zoom);
        let total: u64 = ranges.iter().map(|range| range.tile_count()).sum();

        info!(
            source = self.source.name(),
            total,
            min_zoom = request.min_zoom,
            max_zoom = request.max_zoom,
            output = %request.output_dir.display(),
            "Fetching tile pyramid"
        );
        self.emit(FetchProgress::Started { total });

        let tiles = ranges.into_iter().flat_map(|range| range.tiles());
        let mut outcomes = pin!(stream::iter(tiles)
            .take_until(self.cancellation.cancelled())
            .map(|tile| async move { (tile, self.fetch_tile(tile, request).await) })
            .buffer_unordered(self.max_concurrent));

        let mut report = FetchReport::default();
        while let Some((tile, result)) = outcomes.next().await {
            let outcome = result?;
            report.record(outcome);
            self.emit(FetchProgress::Tile { tile, outcome });
        }

        report.cancelled = (report.processed() as u64) < total;
        if report.cancelled {
            info!(
                processed = report.processed(),
                total, "Tile pyramid fetch cancelled"
            );
            return Ok(report);
        }

        let sidecar = request.metadata.write_to(&request.output_dir)?;
        debug!(path = %sidecar.display(), "Wrote tile set metadata");

        info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            bytes = report.bytes,
            "Tile pyramid fetch complete"
        );

        Ok(report)
    }

    async fn fetch_tile(
        &self,
        tile: TileCoord,
        request: &FetchRequest,
    ) -> Result<TileOutcome, FetchError> {
        let path = request
            .output_dir
            .join(tile.relative_path(&request.extension));

        if fs::try_exists(&path).await.unwrap_or(false) {
            trace!(tile = %tile, "Tile already on disk");
            return Ok(TileOutcome::Skipped);
        }

        let bytes = match self.source.fetch_tile(&tile).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                debug!(tile = %tile, error = %e, "Source has no tile here");
                return Ok(TileOutcome::Failed);
            }
            Err(e) => {
                warn!(tile = %tile, error = %e, "Failed to download tile");
                return Ok(TileOutcome::Failed);
            }
        };

        write_tile(&path, &bytes).await?;
        trace!(tile = %tile, bytes = bytes.len(), "Tile saved");

        Ok(TileOutcome::Downloaded {
            bytes: bytes.len() as u64,
        })
    }

    fn emit(&self, event: FetchProgress) {
        if let Some(sender) = &self.progress {
            // Receiver gone means nobody is watching; keep going
            let _ = sender.send(event);
        }
    }
}

/// Writes through a `.part` file so an interrupted write never leaves a
/// truncated tile that a later run would skip.
async fn write_tile(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| FetchError::Io { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(io_error(parent))?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = Path::new(&partial);

    fs::write(partial, bytes).await.map_err(io_error(partial))?;
    fs::rename(partial, path).await.map_err(io_error(path))?;
    Ok(())
}
