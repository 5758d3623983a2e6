//! Reading a config file into [`CanstreamConfig`].

use std::io::ErrorKind;
use std::path::Path;

use canstream_common::ConfigError;
use tracing::{debug, info};

use super::paths::{create_default_config, default_config_path};
use crate::schema::CanstreamConfig;

/// Parse the TOML file at `path`. Missing keys take their defaults;
/// validation is left to the caller.
pub fn load_from_path(path: &Path) -> Result<CanstreamConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("cannot read {}: {e}", path.display())),
    })?;

    let config = parse_toml(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), "Config loaded");
    Ok(config)
}

/// Parse config text. Exposed for callers that embed their config.
pub fn parse_toml(content: &str) -> Result<CanstreamConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load from [`default_config_path`]. A missing file is created from the
/// documented template and the defaults are returned.
pub fn load_default() -> Result<CanstreamConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            debug!(path = %path.display(), "No config file yet");
            create_default_config(&path)?;
            Ok(CanstreamConfig::default())
        }
        other => other,
    }
}
