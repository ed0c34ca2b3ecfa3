//! Live mode: fill a store straight from a rendering endpoint.
//!
//! Tile requests run concurrently and hand their bytes over a bounded
//! channel to a single blocking writer that owns the SQLite connection.

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::{StoreError, StoreResult};
use super::metadata::TileStoreMetadata;
use super::store::TileStore;
use super::StoreReport;
use crate::coord::{pyramid, TileCoord, MAX_ZOOM};
use crate::extent::BoundingBox;
use crate::fetch::DEFAULT_MAX_CONCURRENT;
use crate::provider::{AsyncHttpClient, TemplateSource, TileSource};
use crate::renderer::{RendererEndpoint, RendererError, DEFAULT_HEALTH_INTERVAL};

/// Tiles buffered between the fetchers and the writer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Tiles per insert transaction on the writer side.
const WRITER_BATCH: usize = 128;

type RenderedTile = (TileCoord, Vec<u8>);

/// Builds a tile store from a running renderer.
pub struct LiveTileStoreWriter<C: AsyncHttpClient + Clone + 'static> {
    client: C,
    endpoint: RendererEndpoint,
    metadata: TileStoreMetadata,
    max_concurrent: usize,
    channel_capacity: usize,
    health_interval: Duration,
    health_timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl<C: AsyncHttpClient + Clone + 'static> LiveTileStoreWriter<C> {
    pub fn new(client: C, endpoint: RendererEndpoint) -> Self {
        Self {
            client,
            endpoint,
            metadata: TileStoreMetadata::composite(None),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            health_interval: DEFAULT_HEALTH_INTERVAL,
            health_timeout: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: TileStoreMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_health_check(mut self, interval: Duration, timeout: Option<Duration>) -> Self {
        self.health_interval = interval;
        self.health_timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Waits for the renderer, then writes every covering tile of
    /// `min_zoom..=max_zoom` into a fresh store at `output`.
    ///
    /// Tiles the renderer fails to produce are logged and counted. Cancelling
    /// while the endpoint is still starting returns a cancelled report and
    /// leaves `output` untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyExtent`] for an empty `bbox`,
    /// [`StoreError::Renderer`] when the endpoint never becomes ready, or a
    /// store error when the writer fails.
    pub async fn write(
        &self,
        bbox: &BoundingBox,
        min_zoom: u8,
        max_zoom: u8,
        output: &Path,
    ) -> StoreResult<StoreReport> {
        if bbox.is_empty() {
            return Err(StoreError::EmptyExtent);
        }
        let max_zoom = max_zoom.min(MAX_ZOOM);
        let min_zoom = min_zoom.min(max_zoom);

        let ready = self
            .endpoint
            .wait_until_ready(
                &self.client,
                self.health_interval,
                self.health_timeout,
                &self.cancellation,
            )
            .await;
        match ready {
            Ok(()) => {}
            Err(RendererError::Cancelled { url, waited }) => {
                warn!(url = %url, waited = ?waited, "Cancelled while waiting for the rendering endpoint");
                return Ok(StoreReport {
                    cancelled: true,
                    ..StoreReport::default()
                });
            }
            Err(e) => return Err(e.into()),
        }

        let source = TemplateSource::new(
            self.client.clone(),
            self.endpoint.tile_template()?,
            "renderer",
        );

        let metadata = self
            .metadata
            .clone()
            .with_bounds(*bbox)
            .with_zoom_range(min_zoom, max_zoom);
        let (sender, receiver) = mpsc::channel::<RenderedTile>(self.channel_capacity);
        let writer = spawn_writer(output.to_path_buf(), metadata, receiver);

        let ranges = pyramid(bbox, min_zoom, max_zoom);
        let total: u64 = ranges.iter().map(|range| range.tile_count()).sum();
        info!(
            endpoint = self.endpoint.base_url(),
            total,
            min_zoom,
            max_zoom,
            output = %output.display(),
            "Pulling rendered tiles"
        );

        let tiles = ranges.into_iter().flat_map(|range| range.tiles());
        let mut results = pin!(stream::iter(tiles)
            .take_until(self.cancellation.cancelled())
            .map(|tile| {
                let source = &source;
                async move { (tile, source.fetch_tile(&tile).await) }
            })
            .buffer_unordered(self.max_concurrent));

        let mut report = StoreReport::default();
        let mut processed = 0u64;
        while let Some((tile, result)) = results.next().await {
            processed += 1;
            match result {
                Ok(data) => {
                    report.bytes += data.len() as u64;
                    if sender.send((tile, data)).await.is_err() {
                        // Writer stopped early; its error is reported below
                        break;
                    }
                }
                Err(e) => {
                    warn!(tile = %tile, error = %e, "Failed to render tile");
                    report.tiles_failed += 1;
                }
            }
        }
        drop(sender);

        report.tiles_written = writer
            .await
            .map_err(|e| StoreError::WriterTask(e.to_string()))??;
        report.cancelled = processed < total;

        info!(
            output = %output.display(),
            written = report.tiles_written,
            failed = report.tiles_failed,
            cancelled = report.cancelled,
            "Composite tile store written"
        );

        Ok(report)
    }
}

fn spawn_writer(
    output: PathBuf,
    metadata: TileStoreMetadata,
    mut receiver: mpsc::Receiver<RenderedTile>,
) -> task::JoinHandle<StoreResult<usize>> {
    task::spawn_blocking(move || {
        let mut store = TileStore::create(&output)?;
        store.write_metadata(&metadata)?;

        let mut written = 0;
        let mut batch = Vec::with_capacity(WRITER_BATCH);
        while let Some(first) = receiver.blocking_recv() {
            batch.push(first);
            while batch.len() < WRITER_BATCH {
                match receiver.try_recv() {
                    Ok(tile) => batch.push(tile),
                    Err(_) => break,
                }
            }
            store.insert_batch(&batch)?;
            written += batch.len();
            batch.clear();
        }

        Ok(written)
    })
}
