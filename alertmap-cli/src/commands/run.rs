//! Run command - the whole pipeline for one alert file.
//!
//! Imagery is downloaded and packaged when a URL is configured, the composite
//! store is rendered when a renderer style is. At least one is required.

use std::path::PathBuf;

use clap::Args;
use tokio::sync::mpsc;
use tracing::info;

use alertmap::app::{Pipeline, PipelineReport};
use alertmap::renderer::ExternalRenderer;

use super::common::{
    print_fetch_summary, print_store_summary, spawn_fetch_progress, ImageryArgs, RendererArgs,
};
use super::fetch::require_imagery_url;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// GeoJSON alert file
    #[arg(long)]
    pub input: PathBuf,

    /// Root of the output tree (default: outputs)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output name (default: the input file name without extension)
    #[arg(long)]
    pub name: Option<String>,

    /// Keep the downloaded XYZ tiles after packaging
    #[arg(long)]
    pub keep_source: bool,

    #[command(flatten)]
    pub imagery: ImageryArgs,

    #[command(flatten)]
    pub renderer: RendererArgs,
}

pub fn run(options: &GlobalOptions, args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("run");

    let mut file = runner.config().clone();
    args.imagery.apply(&mut file);
    args.renderer.apply(&mut file);
    if let Some(dir) = &args.output_dir {
        file.output.directory = dir.clone();
    }
    if let Some(name) = &args.name {
        file.output.name = Some(name.clone());
    }
    let mut config = file.validate()?;
    if config.renderer.is_none() {
        config = require_imagery_url(config)?;
    }

    let client = runner.http_client(&config)?;
    let cancellation = runner.cancel_on_ctrlc()?;
    let runtime = runner.runtime()?;

    let (sender, receiver) = mpsc::unbounded_channel();
    let progress = spawn_fetch_progress(&runtime, receiver);

    let pipeline = Pipeline::new(config, client, ExternalRenderer)
        .with_keep_source(args.keep_source)
        .with_cancellation(cancellation)
        .with_progress(sender);
    let result = runtime.block_on(pipeline.run(&args.input));
    progress.finish_and_clear();

    let report = result?;
    info!(bbox = %report.bbox, cancelled = report.cancelled(), "Pipeline finished");
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    println!("Extent: {}", report.bbox);
    if let Some(fetch) = &report.fetch {
        print_fetch_summary(fetch);
    }
    if let Some((path, store)) = &report.imagery_store {
        print_store_summary("Imagery store", path, store);
    }
    if let Some((path, store)) = &report.composite_store {
        print_store_summary("Composite store", path, store);
    }
}
