//! Validation for the UI-facing sections: target, store, logging.

use crate::schema::{CanstreamConfig, DeliveryMode, MissingPolicyKind};

use super::helpers::{validate_not_empty, validate_range};

pub(crate) fn validate_target(errors: &mut Vec<String>, config: &CanstreamConfig) {
    let target = &config.target;
    validate_not_empty(errors, "target.element_id", &target.element_id);
    if target.element_id.chars().any(char::is_whitespace) {
        errors.push(format!(
            "target.element_id = {:?} must not contain whitespace",
            target.element_id
        ));
    }
    if target.delivery == DeliveryMode::Script {
        validate_not_empty(errors, "target.root_selector", &target.root_selector);
    }
    if target.missing_policy == MissingPolicyKind::Buffer {
        validate_range(
            errors,
            "target.buffer_capacity",
            u64::from(target.buffer_capacity),
            1,
            100_000,
        );
    }
}

pub(crate) fn validate_store(errors: &mut Vec<String>, config: &CanstreamConfig) {
    validate_range(
        errors,
        "store.max_entries",
        u64::from(config.store.max_entries),
        1,
        1_000_000,
    );
}

pub(crate) fn validate_logging(errors: &mut Vec<String>, config: &CanstreamConfig) {
    validate_not_empty(errors, "logging.level", &config.logging.level);
}
