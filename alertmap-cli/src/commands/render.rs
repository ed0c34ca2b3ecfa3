//! Render command - fill an MBTiles store from the rendering endpoint.

use std::path::PathBuf;

use clap::Args;

use alertmap::app::Pipeline;
use alertmap::renderer::ExternalRenderer;

use super::common::{print_store_summary, RendererArgs};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// GeoJSON file whose extent is rendered
    #[arg(long)]
    pub input: PathBuf,

    /// MBTiles file to create (replaced if it exists)
    #[arg(long)]
    pub output: PathBuf,

    /// Last zoom level to render
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Widen the alert extent by this many kilometers
    #[arg(long, allow_negative_numbers = true)]
    pub buffer_km: Option<f64>,

    /// Attribution text, also used as the store description
    #[arg(long)]
    pub attribution: Option<String>,

    #[command(flatten)]
    pub renderer: RendererArgs,
}

pub fn run(options: &GlobalOptions, args: RenderArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("render");

    let mut file = runner.config().clone();
    args.renderer.apply(&mut file);
    if let Some(zoom) = args.max_zoom {
        file.imagery.max_zoom = zoom;
    }
    if let Some(distance) = args.buffer_km {
        file.imagery.buffer_km = Some(distance);
    }
    if let Some(attribution) = &args.attribution {
        file.imagery.attribution = Some(attribution.clone());
    }
    let config = file.validate()?;
    if config.renderer.is_none() {
        return Err(CliError::MissingSetting(
            "No renderer style configured: pass --style or set [renderer] style".to_string(),
        ));
    }

    let client = runner.http_client(&config)?;
    let cancellation = runner.cancel_on_ctrlc()?;
    let runtime = runner.runtime()?;

    let pipeline =
        Pipeline::new(config, client, ExternalRenderer).with_cancellation(cancellation);
    let report = runtime.block_on(async {
        let bbox = pipeline.extent(&args.input)?;
        pipeline.render_composite(&bbox, &args.output).await
    })?;

    print_store_summary("Composite store", &args.output, &report);
    Ok(())
}
