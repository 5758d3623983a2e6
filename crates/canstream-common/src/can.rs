//! CAN identifier helpers shared by config and the frame store.

/// Parse a CAN arbitration id written as `0x1A0`, `0X1a0` or plain decimal.
pub fn parse_can_id(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Canonical lowercase hex form (`0x1a0`), the shape the dashboard keys on.
pub fn format_can_id(id: u32) -> String {
    format!("{id:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_any_case() {
        assert_eq!(parse_can_id("0x1A0"), Some(0x1a0));
        assert_eq!(parse_can_id("0X1a0"), Some(0x1a0));
        assert_eq!(parse_can_id(" 0x100 "), Some(0x100));
    }

    #[test]
    fn parses_decimal() {
        assert_eq!(parse_can_id("256"), Some(256));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_can_id("0xZZ"), None);
        assert_eq!(parse_can_id("engine"), None);
        assert_eq!(parse_can_id(""), None);
    }

    #[test]
    fn formats_lowercase_hex() {
        assert_eq!(format_can_id(0x1A0), "0x1a0");
        assert_eq!(format_can_id(0), "0x0");
    }
}
