//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use alertmap::app::{PipelineError, Stage, StageError};
use alertmap::config::{config_file_path, ConfigFileError};
use alertmap::mbtiles::StoreError;
use alertmap::provider::ProviderError;
use alertmap::renderer::RendererError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or environment error
    Config(ConfigFileError),
    /// A required setting is missing
    MissingSetting(String),
    /// Failed to set up the async runtime or signal handling
    Runtime(String),
    /// Failed to create the HTTP client
    Http(ProviderError),
    /// A pipeline stage failed
    Pipeline(PipelineError),
    /// Packaging a tile directory failed
    Store(StoreError),
    /// Failed to print command output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check {} and the RASTER_* environment variables.", config_file_path().display());
            }
            CliError::MissingSetting(_) => {
                eprintln!();
                eprintln!("Settings can come from command line flags, environment variables");
                eprintln!("or {}.", config_file_path().display());
            }
            CliError::Pipeline(PipelineError {
                stage: Stage::Render,
                cause: StageError::Renderer(RendererError::EndpointUnavailable { .. }),
            })
            | CliError::Pipeline(PipelineError {
                stage: Stage::Render,
                cause: StageError::Store(StoreError::Renderer(_)),
            }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The tile server is not running or still loading its style");
                eprintln!("  2. Wrong host: set ENVIRONMENT=docker inside docker compose");
                eprintln!("  3. Wrong port: set PORT or use --port");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::MissingSetting(msg) => write!(f, "{}", msg),
            CliError::Runtime(msg) => write!(f, "{}", msg),
            CliError::Http(e) => write!(f, "{}", e),
            CliError::Pipeline(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "package failed: {}", e),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Http(e) => Some(e),
            CliError::Pipeline(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}
