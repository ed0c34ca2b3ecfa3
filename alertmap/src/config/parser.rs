//! INI parsing for config.ini.
//!
//! Starts from [`ConfigFile::default`] and overwrites whatever the file sets.
//! Empty values are treated as unset.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::buffer::parse_buffer_distance;

/// Parse a loaded INI document into a [`ConfigFile`].
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("imagery")) {
        if let Some(v) = non_empty(section.get("url")) {
            config.imagery.url = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("attribution")) {
            config.imagery.attribution = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("min_zoom")) {
            config.imagery.min_zoom = parse_number("imagery", "min_zoom", v)?;
        }
        if let Some(v) = non_empty(section.get("max_zoom")) {
            config.imagery.max_zoom = parse_number("imagery", "max_zoom", v)?;
        }
        if let Some(v) = non_empty(section.get("buffer_km")) {
            let distance = parse_buffer_distance(v).ok_or_else(|| {
                invalid_value("imagery", "buffer_km", v, "must be a number of kilometers")
            })?;
            config.imagery.buffer_km = Some(distance);
        }
        if let Some(v) = non_empty(section.get("max_concurrent")) {
            config.imagery.max_concurrent = parse_number("imagery", "max_concurrent", v)?;
        }
        if let Some(v) = non_empty(section.get("timeout")) {
            config.imagery.timeout = parse_number("imagery", "timeout", v)?;
        }
        if let Some(v) = non_empty(section.get("format")) {
            config.imagery.format = v.trim_start_matches('.').to_string();
        }
    }

    if let Some(section) = ini.section(Some("renderer")) {
        if let Some(v) = non_empty(section.get("host")) {
            config.renderer.host = v.to_string();
        }
        if let Some(v) = non_empty(section.get("port")) {
            config.renderer.port = parse_number("renderer", "port", v)?;
        }
        if let Some(v) = non_empty(section.get("style")) {
            config.renderer.style = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("format")) {
            config.renderer.format = v.trim_start_matches('.').to_string();
        }
        if let Some(v) = non_empty(section.get("health_interval")) {
            config.renderer.health_interval = parse_number("renderer", "health_interval", v)?;
        }
        if let Some(v) = non_empty(section.get("health_timeout")) {
            config.renderer.health_timeout = Some(parse_number("renderer", "health_timeout", v)?);
        }
    }

    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = non_empty(section.get("directory")) {
            config.output.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("name")) {
            config.output.name = Some(v.to_string());
        }
    }

    Ok(config)
}

pub(super) fn invalid_value(
    section: &str,
    key: &str,
    value: &str,
    reason: impl Into<String>,
) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub(super) fn parse_number<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid_value(section, key, value, e.to_string()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Expand a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_parses_all_sections() {
        let config = parse(
            r#"
[imagery]
url = https://tiles.example.com/a/{q}.jpeg
attribution = Imagery (c) Example
min_zoom = 2
max_zoom = 16
buffer_km = 2.5
max_concurrent = 4
timeout = 10

[renderer]
host = render.internal
port = 9090
style = alert
format = png
health_interval = 1
health_timeout = 60

[output]
directory = /srv/maps
name = deforestation
"#,
        )
        .unwrap();

        assert_eq!(
            config.imagery.url.as_deref(),
            Some("https://tiles.example.com/a/{q}.jpeg")
        );
        assert_eq!(config.imagery.attribution.as_deref(), Some("Imagery (c) Example"));
        assert_eq!(config.imagery.min_zoom, 2);
        assert_eq!(config.imagery.max_zoom, 16);
        assert_eq!(config.imagery.buffer_km, Some(2.5));
        assert_eq!(config.imagery.max_concurrent, 4);
        assert_eq!(config.imagery.timeout, 10);
        assert_eq!(config.renderer.host, "render.internal");
        assert_eq!(config.renderer.port, 9090);
        assert_eq!(config.renderer.style.as_deref(), Some("alert"));
        assert_eq!(config.renderer.format, "png");
        assert_eq!(config.renderer.health_interval, 1);
        assert_eq!(config.renderer.health_timeout, Some(60));
        assert_eq!(config.output.directory, PathBuf::from("/srv/maps"));
        assert_eq!(config.output.name.as_deref(), Some("deforestation"));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[imagery]\nurl =\nmax_zoom =\n").unwrap();
        assert_eq!(config.imagery.url, None);
        assert_eq!(config.imagery.max_zoom, ConfigFile::default().imagery.max_zoom);
    }

    #[test]
    fn test_invalid_number_names_the_key() {
        let err = parse("[imagery]\nmax_zoom = deep\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "imagery");
                assert_eq!(key, "max_zoom");
                assert_eq!(value, "deep");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_buffer_distance() {
        let err = parse("[imagery]\nbuffer_km = wide\n").unwrap_err();
        assert!(err.to_string().contains("imagery.buffer_km"));
    }

    #[test]
    fn test_port_out_of_range() {
        assert!(parse("[renderer]\nport = 70000\n").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/maps"), home.join("maps"));
            assert_eq!(expand_tilde("~"), home);
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("rel/~path"), PathBuf::from("rel/~path"));
    }
}
