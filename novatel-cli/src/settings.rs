//! Resolve the effective client config from file and command-line overrides.

use std::path::Path;

use novatel_core::config::parse_config;
use novatel_core::types::NovatelError;
use novatel_core::ClientConfig;

/// Values given on the command line; `None` keeps the file/default value.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_skew: Option<f64>,
    pub window: Option<f64>,
}

/// Load `path` if given (defaults otherwise), then apply overrides.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<ClientConfig, NovatelError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                NovatelError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            parse_config(&text)?
        }
        None => ClientConfig::default(),
    };

    if let Some(host) = &overrides.host {
        config.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(skew) = overrides.max_skew {
        config.max_heading_skew = skew;
    }
    if let Some(window) = overrides.window {
        config.heading_window = window;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_defaults() {
        let config = resolve(None, &Overrides::default()).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_resolve_file_then_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "receiver:\n  host: \"10.1.1.1\"\n  port: 3000\n\nalignment:\n  max_heading_skew: 0.2"
        )
        .unwrap();

        let overrides = Overrides {
            port: Some(4000),
            ..Overrides::default()
        };
        let config = resolve(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.host, "10.1.1.1");
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_heading_skew, 0.2);
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(resolve(Some(&missing), &Overrides::default()).is_err());
    }

    #[test]
    fn test_resolve_invalid_override() {
        let overrides = Overrides {
            max_skew: Some(-1.0),
            ..Overrides::default()
        };
        assert!(resolve(None, &overrides).is_err());
    }
}
