//! Checked configuration handed to the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::MAX_CONCURRENT_LIMIT;
use super::file::ConfigFileError;
use super::parser::invalid_value;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;
use crate::provider::TileUrlTemplate;
use crate::renderer::RendererConfig;

/// Settings after validation. Every field is usable as is.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// `None` when no imagery source is configured
    pub imagery_url: Option<TileUrlTemplate>,
    pub attribution: Option<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub buffer_km: Option<f64>,
    pub max_concurrent: usize,
    pub request_timeout_secs: u64,
    pub tile_format: String,
    /// `None` when no style is configured; the composite store is skipped
    pub renderer: Option<RendererConfig>,
    pub output_dir: PathBuf,
    /// Overrides the name derived from the input file
    pub name: Option<String>,
}

pub(super) fn validate(config: &ConfigFile) -> Result<PipelineConfig, ConfigFileError> {
    let imagery = &config.imagery;

    if imagery.max_zoom > MAX_ZOOM {
        return Err(invalid(
            "imagery",
            "max_zoom",
            imagery.max_zoom,
            &format!("must be at most {}", MAX_ZOOM),
        ));
    }
    if imagery.min_zoom > imagery.max_zoom {
        return Err(invalid(
            "imagery",
            "min_zoom",
            imagery.min_zoom,
            &format!("must not exceed max_zoom ({})", imagery.max_zoom),
        ));
    }
    if imagery.max_concurrent == 0 || imagery.max_concurrent > MAX_CONCURRENT_LIMIT {
        return Err(invalid(
            "imagery",
            "max_concurrent",
            imagery.max_concurrent,
            &format!("must be between 1 and {}", MAX_CONCURRENT_LIMIT),
        ));
    }
    if imagery.timeout == 0 {
        return Err(invalid("imagery", "timeout", imagery.timeout, "must be positive"));
    }
    if imagery.format.is_empty() {
        return Err(invalid("imagery", "format", "", "must not be empty"));
    }

    let imagery_url = imagery
        .url
        .as_deref()
        .map(|url| {
            TileUrlTemplate::parse(url).map_err(|_| {
                invalid_value(
                    "imagery",
                    "url",
                    url,
                    "needs a {q} placeholder or all of {z}, {x} and {y}",
                )
            })
        })
        .transpose()?;

    let renderer = match &config.renderer.style {
        Some(style) => Some(renderer_config(config, style)?),
        None => None,
    };

    if let Some(name) = &config.output.name {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(invalid("output", "name", name, "must be a plain file name"));
        }
    }

    Ok(PipelineConfig {
        imagery_url,
        attribution: imagery.attribution.clone(),
        min_zoom: imagery.min_zoom,
        max_zoom: imagery.max_zoom,
        buffer_km: imagery.buffer_km,
        max_concurrent: imagery.max_concurrent,
        request_timeout_secs: imagery.timeout,
        tile_format: imagery.format.clone(),
        renderer,
        output_dir: config.output.directory.clone(),
        name: config.output.name.clone(),
    })
}

fn renderer_config(config: &ConfigFile, style: &str) -> Result<RendererConfig, ConfigFileError> {
    let settings = &config.renderer;

    if settings.host.is_empty() {
        return Err(invalid("renderer", "host", "", "must not be empty"));
    }
    if settings.port == 0 {
        return Err(invalid("renderer", "port", 0, "must be positive"));
    }
    if settings.health_interval == 0 {
        return Err(invalid("renderer", "health_interval", 0, "must be positive"));
    }

    let mut renderer = RendererConfig::new(style)
        .with_host(settings.host.clone())
        .with_port(settings.port)
        .with_health_timeout(settings.health_timeout.map(Duration::from_secs));
    renderer.format = settings.format.clone();
    renderer.health_interval = Duration::from_secs(settings.health_interval);
    Ok(renderer)
}

fn invalid(section: &str, key: &str, value: impl ToString, reason: &str) -> ConfigFileError {
    invalid_value(section, key, &value.to_string(), reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TileAddressing;

    fn key_of(err: ConfigFileError) -> String {
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => format!("{section}.{key}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_validate() {
        let pipeline = ConfigFile::default().validate().unwrap();
        assert!(pipeline.imagery_url.is_none());
        assert!(pipeline.renderer.is_none());
        assert_eq!(pipeline.min_zoom, 1);
        assert_eq!(pipeline.tile_format, "jpg");
    }

    #[test]
    fn test_url_and_style_become_typed() {
        let mut config = ConfigFile::default();
        config.imagery.url = Some("https://img.example/{q}.jpeg".to_string());
        config.renderer.style = Some("alert".to_string());
        config.renderer.health_timeout = Some(30);

        let pipeline = config.validate().unwrap();
        assert_eq!(
            pipeline.imagery_url.unwrap().addressing(),
            TileAddressing::Quadkey
        );
        let renderer = pipeline.renderer.unwrap();
        assert_eq!(renderer.style, "alert");
        assert_eq!(renderer.health_timeout, Some(Duration::from_secs(30)));
        assert_eq!(renderer.health_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_template_without_placeholders() {
        let mut config = ConfigFile::default();
        config.imagery.url = Some("https://img.example/tile.jpeg".to_string());
        assert_eq!(key_of(config.validate().unwrap_err()), "imagery.url");
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let mut config = ConfigFile::default();
        config.imagery.min_zoom = 9;
        config.imagery.max_zoom = 4;
        assert_eq!(key_of(config.validate().unwrap_err()), "imagery.min_zoom");
    }

    #[test]
    fn test_rejects_zoom_beyond_limit() {
        let mut config = ConfigFile::default();
        config.imagery.max_zoom = MAX_ZOOM + 1;
        assert_eq!(key_of(config.validate().unwrap_err()), "imagery.max_zoom");
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut config = ConfigFile::default();
        config.imagery.max_concurrent = 0;
        assert_eq!(key_of(config.validate().unwrap_err()), "imagery.max_concurrent");
    }

    #[test]
    fn test_renderer_checked_only_with_style() {
        let mut config = ConfigFile::default();
        config.renderer.port = 0;
        assert!(config.validate().is_ok());

        config.renderer.style = Some("alert".to_string());
        assert_eq!(key_of(config.validate().unwrap_err()), "renderer.port");
    }

    #[test]
    fn test_rejects_path_as_name() {
        let mut config = ConfigFile::default();
        config.output.name = Some("../escape".to_string());
        assert_eq!(key_of(config.validate().unwrap_err()), "output.name");
    }
}
