//! Common arguments and helpers shared across CLI commands.

use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use alertmap::config::ConfigFile;
use alertmap::fetch::{FetchProgress, FetchReport, TileOutcome};
use alertmap::mbtiles::{StoreReport, TileStore};

/// Imagery flags; each one overrides config.ini and the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ImageryArgs {
    /// Tile URL template with {q} (quadkey) or {z}/{x}/{y} placeholders
    #[arg(long)]
    pub url: Option<String>,

    /// Attribution text stored with the tiles
    #[arg(long)]
    pub attribution: Option<String>,

    /// First zoom level to download
    #[arg(long)]
    pub min_zoom: Option<u8>,

    /// Last zoom level to download (and render)
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Widen the alert extent by this many kilometers
    #[arg(long, allow_negative_numbers = true)]
    pub buffer_km: Option<f64>,

    /// Tile requests in flight at once
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ImageryArgs {
    pub fn apply(&self, config: &mut ConfigFile) {
        let imagery = &mut config.imagery;
        if let Some(url) = &self.url {
            imagery.url = Some(url.clone());
        }
        if let Some(attribution) = &self.attribution {
            imagery.attribution = Some(attribution.clone());
        }
        if let Some(zoom) = self.min_zoom {
            imagery.min_zoom = zoom;
        }
        if let Some(zoom) = self.max_zoom {
            imagery.max_zoom = zoom;
        }
        if let Some(distance) = self.buffer_km {
            imagery.buffer_km = Some(distance);
        }
        if let Some(max_concurrent) = self.max_concurrent {
            imagery.max_concurrent = max_concurrent;
        }
        if let Some(timeout) = self.timeout {
            imagery.timeout = timeout;
        }
    }
}

/// Rendering endpoint flags.
#[derive(Debug, Clone, Default, Args)]
pub struct RendererArgs {
    /// Style served by the tile server; enables the composite store
    #[arg(long)]
    pub style: Option<String>,

    /// Tile server host
    #[arg(long)]
    pub host: Option<String>,

    /// Tile server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Give up when the tile server is not healthy after this many seconds
    #[arg(long)]
    pub health_timeout: Option<u64>,
}

impl RendererArgs {
    pub fn apply(&self, config: &mut ConfigFile) {
        let renderer = &mut config.renderer;
        if let Some(style) = &self.style {
            renderer.style = Some(style.clone());
        }
        if let Some(host) = &self.host {
            renderer.host = host.clone();
        }
        if let Some(port) = self.port {
            renderer.port = port;
        }
        if let Some(timeout) = self.health_timeout {
            renderer.health_timeout = Some(timeout);
        }
    }
}

/// Draws fetch progress on stderr.
///
/// Returns the bar so the caller can clear it once the run is over.
pub fn spawn_fetch_progress(
    runtime: &Runtime,
    mut receiver: mpsc::UnboundedReceiver<FetchProgress>,
) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(10));
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(200));

    let drawn = bar.clone();
    runtime.spawn(async move {
        let mut failed = 0usize;
        while let Some(event) = receiver.recv().await {
            match event {
                FetchProgress::Started { total } => drawn.set_length(total),
                FetchProgress::Tile { outcome, .. } => {
                    drawn.inc(1);
                    if outcome == TileOutcome::Failed {
                        failed += 1;
                        drawn.set_message(format!("{} failed", failed));
                    }
                }
            }
        }
    });

    bar
}

/// Print a store summary, counting tiles from the file itself.
pub fn print_store_summary(label: &str, path: &std::path::Path, report: &StoreReport) {
    let stored = TileStore::open(path)
        .and_then(|store| store.tile_count())
        .map(|count| count.to_string())
        .unwrap_or_else(|_| "?".to_string());

    println!("{}: {}", label, path.display());
    println!("  Tiles:   {} written, {} in store", report.tiles_written, stored);
    if report.tiles_failed > 0 {
        println!("  Failed:  {}", report.tiles_failed);
    }
    println!("  Size:    {:.2} MB", report.bytes as f64 / 1_048_576.0);
    if report.cancelled {
        println!("  Cancelled before completion");
    }
}

/// Print the counters of an imagery download.
pub fn print_fetch_summary(report: &FetchReport) {
    println!("Imagery download");
    println!("  Downloaded: {}", report.downloaded);
    println!("  Skipped:    {} (already on disk)", report.skipped);
    println!("  Failed:     {}", report.failed);
    println!("  Size:       {:.2} MB", report.bytes as f64 / 1_048_576.0);
    if report.cancelled {
        println!("  Cancelled before completion; run again to resume");
    } else if report.failed > 0 {
        println!("  Run again to retry the failed tiles");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_values() {
        let mut config = ConfigFile::default();
        config.imagery.url = Some("http://file.test/{q}".to_string());
        config.imagery.max_zoom = 12;

        let imagery = ImageryArgs {
            url: Some("http://flag.test/{z}/{x}/{y}".to_string()),
            buffer_km: Some(2.5),
            ..Default::default()
        };
        imagery.apply(&mut config);

        assert_eq!(config.imagery.url.as_deref(), Some("http://flag.test/{z}/{x}/{y}"));
        assert_eq!(config.imagery.max_zoom, 12);
        assert_eq!(config.imagery.buffer_km, Some(2.5));
    }

    #[test]
    fn test_renderer_flags_enable_rendering() {
        let mut config = ConfigFile::default();
        assert!(config.renderer.style.is_none());

        let renderer = RendererArgs {
            style: Some("satellite".to_string()),
            port: Some(9090),
            ..Default::default()
        };
        renderer.apply(&mut config);

        let validated = config.validate().unwrap();
        let renderer = validated.renderer.unwrap();
        assert_eq!(renderer.style, "satellite");
        assert_eq!(renderer.port, 9090);
    }
}
