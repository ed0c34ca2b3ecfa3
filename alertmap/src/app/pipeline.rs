//! The alert map pipeline: extent → buffer → fetch → package → render.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::{PipelineError, Stage, StageError};
use super::layout::OutputLayout;
use crate::buffer::GeodeticBufferer;
use crate::config::{PipelineConfig, DEFAULT_OUTPUT_NAME};
use crate::extent::{read_features, BoundingBox};
use crate::fetch::{FetchProgress, FetchReport, FetchRequest, TilePyramidFetcher, TileSetMetadata};
use crate::mbtiles::{
    pack_directory, remove_source_directory, LiveTileStoreWriter, StoreReport, TileStoreMetadata,
};
use crate::provider::{AsyncHttpClient, TemplateSource};
use crate::renderer::RendererLifecycle;

/// First zoom level of the composite store.
const COMPOSITE_MIN_ZOOM: u8 = 0;

/// What a pipeline run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Buffered extent every stage worked on
    pub bbox: BoundingBox,
    pub fetch: Option<FetchReport>,
    /// Imagery store and its counters
    pub imagery_store: Option<(PathBuf, StoreReport)>,
    /// Composite store and its counters
    pub composite_store: Option<(PathBuf, StoreReport)>,
}

impl PipelineReport {
    fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            fetch: None,
            imagery_store: None,
            composite_store: None,
        }
    }

    /// True when a stage stopped early because of cancellation.
    pub fn cancelled(&self) -> bool {
        self.fetch.is_some_and(|r| r.cancelled)
            || self
                .composite_store
                .as_ref()
                .is_some_and(|(_, r)| r.cancelled)
    }
}

/// Runs every stage for one input file.
///
/// Imagery is fetched and packaged only when an imagery URL is configured,
/// and the composite store is rendered only when a renderer style is.
pub struct Pipeline<C, R>
where
    C: AsyncHttpClient + Clone + 'static,
    R: RendererLifecycle,
{
    config: PipelineConfig,
    client: C,
    renderer: R,
    keep_source: bool,
    cancellation: CancellationToken,
    progress: Option<mpsc::UnboundedSender<FetchProgress>>,
}

impl<C, R> Pipeline<C, R>
where
    C: AsyncHttpClient + Clone + 'static,
    R: RendererLifecycle,
{
    pub fn new(config: PipelineConfig, client: C, renderer: R) -> Self {
        Self {
            config,
            client,
            renderer,
            keep_source: false,
            cancellation: CancellationToken::new(),
            progress: None,
        }
    }

    /// Keep the downloaded tile tree after packaging it.
    pub fn with_keep_source(mut self, keep: bool) -> Self {
        self.keep_source = keep;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<FetchProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Output layout for `input`: the configured name, else the file stem.
    pub fn layout_for(&self, input: &Path) -> OutputLayout {
        match &self.config.name {
            Some(name) => OutputLayout::new(&self.config.output_dir, name),
            None => OutputLayout::for_input(&self.config.output_dir, input)
                .unwrap_or_else(|| OutputLayout::new(&self.config.output_dir, DEFAULT_OUTPUT_NAME)),
        }
    }

    /// Buffered extent of the features in `input`.
    ///
    /// # Errors
    ///
    /// Fails in the extent stage for unreadable or featureless input, and in
    /// the buffer stage when the box cannot be projected.
    pub fn extent(&self, input: &Path) -> Result<BoundingBox, PipelineError> {
        let features = read_features(input).map_err(|e| PipelineError::new(Stage::Extent, e))?;
        let bbox = BoundingBox::from_features(&features)
            .map_err(|e| PipelineError::new(Stage::Extent, e))?;
        if bbox.is_empty() {
            return Err(PipelineError::new(Stage::Extent, StageError::EmptyExtent));
        }
        info!(features = features.len(), bbox = %bbox, "Computed feature extent");

        let buffered = GeodeticBufferer::new()
            .buffer(&bbox, self.config.buffer_km)
            .map_err(|e| PipelineError::new(Stage::Buffer, e))?;
        if buffered != bbox {
            info!(
                buffer_km = self.config.buffer_km,
                bbox = %buffered,
                "Buffered extent"
            );
        }

        Ok(buffered)
    }

    /// Runs every configured stage for `input`.
    ///
    /// A cancelled fetch ends the run before packaging; the report says so.
    pub async fn run(&self, input: &Path) -> Result<PipelineReport, PipelineError> {
        let layout = self.layout_for(input);
        let bbox = self.extent(input)?;
        let mut report = PipelineReport::new(bbox);

        if self.config.imagery_url.is_some() {
            let fetched = self
                .fetch_imagery(&bbox, &layout.tile_dir(), layout.name())
                .await?;
            report.fetch = Some(fetched);
            if fetched.cancelled {
                warn!("Run cancelled during imagery download, skipping packaging");
                return Ok(report);
            }
            if fetched.failed > 0 {
                warn!(failed = fetched.failed, "Some imagery tiles could not be downloaded");
            }

            let output = layout.imagery_store();
            let packed = self.package(&layout.tile_dir(), &output)?;
            report.imagery_store = Some((output, packed));
        } else {
            info!("No imagery URL configured, skipping imagery download");
        }

        if self.config.renderer.is_some() {
            let output = layout.composite_store();
            let rendered = self.render_composite(&bbox, &output).await?;
            report.composite_store = Some((output, rendered));
        }

        Ok(report)
    }

    /// Downloads the imagery pyramid covering `bbox` into `tile_dir`.
    ///
    /// `name` ends up in the tile set's `metadata.json`.
    pub async fn fetch_imagery(
        &self,
        bbox: &BoundingBox,
        tile_dir: &Path,
        name: &str,
    ) -> Result<FetchReport, PipelineError> {
        let template = self.config.imagery_url.clone().ok_or_else(|| {
            PipelineError::new(Stage::Fetch, StageError::NotConfigured("imagery URL"))
        })?;
        let source = TemplateSource::new(self.client.clone(), template, "imagery");
        let mut fetcher = TilePyramidFetcher::new(source)
            .with_max_concurrent(self.config.max_concurrent)
            .with_cancellation(self.cancellation.clone());
        if let Some(sender) = &self.progress {
            fetcher = fetcher.with_progress(sender.clone());
        }

        let request = FetchRequest {
            bbox: *bbox,
            min_zoom: self.config.min_zoom,
            max_zoom: self.config.max_zoom,
            output_dir: tile_dir.to_path_buf(),
            extension: self.config.tile_format.clone(),
            metadata: TileSetMetadata::imagery(
                name,
                self.config.attribution.as_deref(),
                &self.config.tile_format,
            ),
        };

        fetcher
            .fetch(&request)
            .await
            .map_err(|e| PipelineError::new(Stage::Fetch, e))
    }

    fn package(&self, tile_dir: &Path, output: &Path) -> Result<StoreReport, PipelineError> {
        let packed = pack_directory(tile_dir, output, &TileStoreMetadata::default())
            .map_err(|e| PipelineError::new(Stage::Package, e))?;

        if !self.keep_source {
            remove_source_directory(tile_dir).map_err(|e| PipelineError::new(Stage::Package, e))?;
        }

        Ok(packed)
    }

    /// Builds the composite store at `output` from the rendering endpoint.
    ///
    /// The renderer is stopped before and after the run.
    pub async fn render_composite(
        &self,
        bbox: &BoundingBox,
        output: &Path,
    ) -> Result<StoreReport, PipelineError> {
        let stage_error = |e: StageError| PipelineError { stage: Stage::Render, cause: e };
        let renderer = self
            .config
            .renderer
            .as_ref()
            .ok_or_else(|| stage_error(StageError::NotConfigured("renderer style")))?;

        self.renderer
            .ensure_stopped()
            .map_err(|e| stage_error(e.into()))?;
        let endpoint = self
            .renderer
            .ensure_running(renderer)
            .map_err(|e| stage_error(e.into()))?;

        let metadata = TileStoreMetadata::composite(self.config.attribution.as_deref())
            .with_format(renderer.format.clone());
        let writer = LiveTileStoreWriter::new(self.client.clone(), endpoint)
            .with_metadata(metadata)
            .with_max_concurrent(self.config.max_concurrent)
            .with_health_check(renderer.health_interval, renderer.health_timeout)
            .with_cancellation(self.cancellation.clone());

        let result = writer
            .write(bbox, COMPOSITE_MIN_ZOOM, self.config.max_zoom, output)
            .await;

        // Stop regardless of the outcome; a write error takes precedence
        let stopped = self.renderer.ensure_stopped();
        let rendered = result.map_err(|e| stage_error(e.into()))?;
        stopped.map_err(|e| stage_error(e.into()))?;

        Ok(rendered)
    }
}
