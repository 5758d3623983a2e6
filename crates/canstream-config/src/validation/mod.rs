//! Full configuration validation.
//!
//! Each section has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod signals;
mod stream;
mod target;


use crate::schema::CanstreamConfig;
use canstream_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CanstreamConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    stream::validate_stream(&mut errors, config);
    stream::validate_reconnect(&mut errors, config);
    target::validate_target(&mut errors, config);
    target::validate_store(&mut errors, config);
    target::validate_logging(&mut errors, config);
    signals::validate_signals(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
