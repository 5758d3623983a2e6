//! Validation for the `[[signals]]` database.

use std::collections::HashSet;

use canstream_common::parse_can_id;

use crate::schema::CanstreamConfig;

pub(crate) fn validate_signals(errors: &mut Vec<String>, config: &CanstreamConfig) {
    let mut seen = HashSet::new();
    for (i, signal) in config.signals.iter().enumerate() {
        match parse_can_id(&signal.id) {
            Some(id) => {
                if !seen.insert(id) {
                    errors.push(format!("signals[{i}].id = {} is defined twice", signal.id));
                }
            }
            None => errors.push(format!(
                "signals[{i}].id = {:?} is not a CAN id",
                signal.id
            )),
        }
        if !signal.scale.is_finite() {
            errors.push(format!("signals[{i}].scale must be a finite number"));
        }
    }
}
