//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::fetch::{DEFAULT_MAX_CONCURRENT, DEFAULT_MIN_ZOOM};
use crate::provider::DEFAULT_TIMEOUT_SECS;
use crate::renderer::{DEFAULT_PORT, LOCAL_HOST};

/// Deepest imagery zoom level when none is configured.
pub const DEFAULT_MAX_ZOOM: u8 = 14;

/// Tile file extension for imagery and rendered tiles.
pub const DEFAULT_TILE_FORMAT: &str = "jpg";

/// Seconds between renderer health probes.
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 2;

/// Base name of generated files when the input has no usable stem.
pub const DEFAULT_OUTPUT_NAME: &str = "alert";

/// Root of all generated assets.
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Upper bound on concurrent tile requests.
pub const MAX_CONCURRENT_LIMIT: usize = 256;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            imagery: ImagerySettings {
                url: None,
                attribution: None,
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: DEFAULT_MAX_ZOOM,
                buffer_km: None,
                max_concurrent: DEFAULT_MAX_CONCURRENT,
                timeout: DEFAULT_TIMEOUT_SECS,
                format: DEFAULT_TILE_FORMAT.to_string(),
            },
            renderer: RendererSettings {
                host: LOCAL_HOST.to_string(),
                port: DEFAULT_PORT,
                style: None,
                format: DEFAULT_TILE_FORMAT.to_string(),
                health_interval: DEFAULT_HEALTH_INTERVAL_SECS,
                health_timeout: None,
            },
            output: OutputSettings {
                directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
                name: None,
            },
        }
    }
}
