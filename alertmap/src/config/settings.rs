//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Imagery download settings
    pub imagery: ImagerySettings,
    /// Rendering endpoint settings
    pub renderer: RendererSettings,
    /// Output settings
    pub output: OutputSettings,
}

/// Imagery source and pyramid configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagerySettings {
    /// Tile URL template with `{q}` or `{z}`/`{x}`/`{y}` placeholders
    pub url: Option<String>,
    /// Attribution text stored with the tiles
    pub attribution: Option<String>,
    /// First zoom level downloaded
    pub min_zoom: u8,
    /// Last zoom level downloaded
    pub max_zoom: u8,
    /// Buffer around the alert extent in kilometers
    pub buffer_km: Option<f64>,
    /// Requests in flight at once
    pub max_concurrent: usize,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Tile file extension
    pub format: String,
}

/// Rendering endpoint configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    pub host: String,
    pub port: u16,
    /// Style to pull; the composite store is only built when set
    pub style: Option<String>,
    pub format: String,
    /// Seconds between health probes
    pub health_interval: u64,
    /// Seconds before giving up on the endpoint, `None` waits forever
    pub health_timeout: Option<u64>,
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// Directory receiving tile trees and stores
    pub directory: PathBuf,
    /// Base name of generated files, the input file stem when unset
    pub name: Option<String>,
}
