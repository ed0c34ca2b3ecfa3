//! Configuration file handling for ~/.alertmap/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`] and parsing in [`super::parser`]. Environment
//! variables are applied on top of the file with
//! [`ConfigFile::apply_environment`].

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::parser::parse_number;
use super::settings::ConfigFile;
use crate::buffer::parse_buffer_distance;
use crate::renderer::RendererConfig;

/// Imagery URL template.
pub const ENV_IMAGERY_URL: &str = "RASTER_IMAGERY_URL";
/// Imagery attribution text.
pub const ENV_IMAGERY_ATTRIBUTION: &str = "RASTER_IMAGERY_ATTRIBUTION";
/// Deepest zoom level downloaded and rendered.
pub const ENV_MAX_ZOOM: &str = "RASTER_MBTILES_MAX_ZOOM";
/// Buffer distance in kilometers.
pub const ENV_BUFFER_SIZE: &str = "RASTER_BUFFER_SIZE";
/// Renderer port.
pub const ENV_PORT: &str = "PORT";
/// `docker` points the renderer at its compose service name.
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.alertmap/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Apply overrides from the process environment.
    pub fn apply_environment(&mut self) -> Result<(), ConfigFileError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are ignored. An unparseable `RASTER_BUFFER_SIZE` means
    /// no buffer rather than an error.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_IMAGERY_URL) {
            self.imagery.url = Some(url);
        }
        if let Some(attribution) = get(ENV_IMAGERY_ATTRIBUTION) {
            self.imagery.attribution = Some(attribution);
        }
        if let Some(zoom) = get(ENV_MAX_ZOOM) {
            self.imagery.max_zoom = parse_number("env", ENV_MAX_ZOOM, &zoom)?;
        }
        if let Some(distance) = get(ENV_BUFFER_SIZE) {
            self.imagery.buffer_km = parse_buffer_distance(&distance);
            if self.imagery.buffer_km.is_none() {
                debug!(value = %distance, "Ignoring unparseable buffer size");
            }
        }
        if let Some(port) = get(ENV_PORT) {
            self.renderer.port = parse_number("env", ENV_PORT, &port)?;
        }
        if let Some(environment) = get(ENV_ENVIRONMENT) {
            self.renderer.host =
                RendererConfig::host_for_environment(Some(environment.as_str())).to_string();
        }

        Ok(())
    }

    /// Reject settings that parse but cannot be used.
    ///
    /// Returns the checked, typed configuration the pipeline runs with.
    pub fn validate(&self) -> Result<super::PipelineConfig, ConfigFileError> {
        super::pipeline::validate(self)
    }
}

/// Get the path to the config directory (~/.alertmap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".alertmap")
}

/// Get the path to the config file (~/.alertmap/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
