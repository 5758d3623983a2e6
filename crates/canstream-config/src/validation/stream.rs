//! Validation for the connection sections: stream and reconnect.

use crate::schema::CanstreamConfig;

use super::helpers::{validate_not_empty, validate_range, validate_range_f64};

pub(crate) fn validate_stream(errors: &mut Vec<String>, config: &CanstreamConfig) {
    let url = config.stream.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!(
            "stream.url = {url:?} must be an http:// or https:// URL"
        ));
    }
    validate_not_empty(errors, "stream.event_name", &config.stream.event_name);
    validate_range(
        errors,
        "stream.connect_timeout_secs",
        config.stream.connect_timeout_secs,
        1,
        300,
    );
}

pub(crate) fn validate_reconnect(errors: &mut Vec<String>, config: &CanstreamConfig) {
    let reconnect = &config.reconnect;
    validate_range(
        errors,
        "reconnect.initial_delay_ms",
        reconnect.initial_delay_ms,
        10,
        600_000,
    );
    if reconnect.max_delay_ms < reconnect.initial_delay_ms {
        errors.push(format!(
            "reconnect.max_delay_ms = {} is below reconnect.initial_delay_ms = {}",
            reconnect.max_delay_ms, reconnect.initial_delay_ms
        ));
    }
    validate_range_f64(errors, "reconnect.multiplier", reconnect.multiplier, 1.0, 10.0);
    validate_range_f64(errors, "reconnect.jitter", reconnect.jitter, 0.0, 1.0);
}
