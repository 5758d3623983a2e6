//! Default TOML config template with inline documentation comments.

use crate::schema::CONFIG_SCHEMA_VERSION;

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    format!("# canstream configuration\n# Schema version {CONFIG_SCHEMA_VERSION}\n{TEMPLATE_BODY}")
}

const TEMPLATE_BODY: &str = r##"# Only override what you want to change -- missing fields use defaults.

[stream]
# url = "http://127.0.0.1:8050/stream"
# event_name = "message"        # SSE event type forwarded to the target
# connect_timeout_secs = 15     # 1-300

[reconnect]
# enabled = true
# initial_delay_ms = 1000       # 10-600000
# max_delay_ms = 30000          # >= initial_delay_ms
# multiplier = 2.0              # 1.0-10.0
# jitter = 0.0                  # 0.0-1.0
# max_attempts = 0              # 0 = retry forever

[target]
# element_id = "can-store"
# root_selector = "[data-dash-react-root]"
# delivery = "registry"         # registry | script (JS snippets on stdout)
# missing_policy = "drop"       # drop | buffer | error
# buffer_capacity = 256         # 1-100000, used by "buffer"

[store]
# max_entries = 1000            # 1-1000000

[logging]
# level = "canstream=info"

# Signal database. Defining any [[signals]] entry replaces the built-in table.
# [[signals]]
# id = "0x100"
# name = "Engine Module"
# signal = "RPM"
# format = "u16be"              # u16be | i16be | u8 | i8
# scale = 0.125
# unit = "RPM"
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_schema_version() {
        let template = default_config_toml();
        let second_line = template.lines().nth(1).unwrap();
        assert_eq!(second_line, format!("# Schema version {CONFIG_SCHEMA_VERSION}"));
    }

    #[test]
    fn template_parses_to_defaults() {
        let config: crate::schema::CanstreamConfig = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(config.target.element_id, "can-store");
        assert_eq!(config.target.delivery, crate::schema::DeliveryMode::Registry);
    }
}
