//! Fetch command - download the imagery pyramid over an alert's extent.

use std::path::PathBuf;

use clap::Args;
use tokio::sync::mpsc;
use tracing::info;

use alertmap::app::Pipeline;
use alertmap::config::PipelineConfig;
use alertmap::renderer::ExternalRenderer;

use super::common::{print_fetch_summary, spawn_fetch_progress, ImageryArgs};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// GeoJSON file whose extent is downloaded
    #[arg(long)]
    pub input: PathBuf,

    /// XYZ directory to fill (default: the run layout's tile directory)
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub imagery: ImageryArgs,
}

pub fn run(options: &GlobalOptions, args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("fetch");

    let mut file = runner.config().clone();
    args.imagery.apply(&mut file);
    let config = require_imagery_url(file.validate()?)?;

    let client = runner.http_client(&config)?;
    let cancellation = runner.cancel_on_ctrlc()?;
    let runtime = runner.runtime()?;

    let (sender, receiver) = mpsc::unbounded_channel();
    let progress = spawn_fetch_progress(&runtime, receiver);

    let pipeline = Pipeline::new(config, client, ExternalRenderer)
        .with_cancellation(cancellation)
        .with_progress(sender);
    let layout = pipeline.layout_for(&args.input);
    let output = args.output.clone().unwrap_or_else(|| layout.tile_dir());

    let result = runtime.block_on(async {
        let bbox = pipeline.extent(&args.input)?;
        pipeline.fetch_imagery(&bbox, &output, layout.name()).await
    });
    progress.finish_and_clear();

    let report = result?;
    info!(
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed,
        output = %output.display(),
        "Imagery download finished"
    );

    println!("Tiles: {}", output.display());
    print_fetch_summary(&report);
    Ok(())
}

/// Downloading needs a URL, which has no default.
pub(crate) fn require_imagery_url(config: PipelineConfig) -> Result<PipelineConfig, CliError> {
    if config.imagery_url.is_none() {
        return Err(CliError::MissingSetting(
            "No imagery URL configured: pass --url or set RASTER_IMAGERY_URL".to_string(),
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertmap::config::ConfigFile;

    #[test]
    fn test_missing_url_is_reported() {
        let config = ConfigFile::default().validate().unwrap();
        let err = require_imagery_url(config).unwrap_err();
        assert!(matches!(err, CliError::MissingSetting(_)));
        assert!(err.to_string().contains("RASTER_IMAGERY_URL"));
    }
}
