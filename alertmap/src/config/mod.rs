//! Configuration for the alert map pipeline.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. `~/.alertmap/config.ini` (or a path given on the command line)
//! 2. Environment variables such as `RASTER_IMAGERY_URL` and `PORT`
//! 3. Command line flags, applied by the CLI before validation
//!
//! [`ConfigFile::validate`] turns the merged settings into a
//! [`PipelineConfig`] once, at startup.
//!
//! ```ignore
//! use alertmap::config::ConfigFile;
//!
//! let mut config = ConfigFile::load()?;
//! config.apply_environment()?;
//! let pipeline = config.validate()?;
//! ```

mod defaults;
mod file;
mod parser;
mod pipeline;
mod settings;

pub use defaults::*;
pub use file::{
    config_directory, config_file_path, ConfigFileError, ENV_BUFFER_SIZE, ENV_ENVIRONMENT,
    ENV_IMAGERY_ATTRIBUTION, ENV_IMAGERY_URL, ENV_MAX_ZOOM, ENV_PORT,
};
pub use pipeline::PipelineConfig;
pub use settings::{ConfigFile, ImagerySettings, OutputSettings, RendererSettings};
