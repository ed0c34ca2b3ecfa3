//! Pipeline orchestration.
//!
//! [`Pipeline`] strings the components together for one GeoJSON input:
//!
//! ```text
//! alert.geojson ──► extent ──► buffer ──┬──► fetch ──► package ──► <name>.mbtiles (imagery)
//!                                       └──► render (live) ──────► <name>.mbtiles (composite)
//! ```
//!
//! Every failure is reported as a [`PipelineError`] naming the stage.
//!
//! # Example
//!
//! ```ignore
//! use alertmap::app::Pipeline;
//! use alertmap::provider::ReqwestClient;
//! use alertmap::renderer::ExternalRenderer;
//!
//! let pipeline = Pipeline::new(config, ReqwestClient::new()?, ExternalRenderer);
//! let report = pipeline.run(Path::new("alert.geojson")).await?;
//! ```

mod error;
mod layout;
mod pipeline;

pub use error::{PipelineError, Stage, StageError};
pub use layout::OutputLayout;
pub use pipeline::{Pipeline, PipelineReport};
