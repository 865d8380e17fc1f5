//! Numeric helpers shared by the mapping transforms.

use crate::settings::parse_or;

/// First comma-separated token of a list value.
pub fn first_value(raw: &str) -> &str {
    raw.split(',').next().unwrap_or(raw)
}

/// Parse `"50%"` as `0.5` and `"50"` as `50.0`; malformed text is `0.0`.
pub fn percent_or_number(raw: &str) -> f64 {
    if raw.contains('%') {
        parse_or(&raw.replace('%', ""), 0.0) / 100.0
    } else {
        parse_or(raw, 0.0)
    }
}

/// Format a computed value the way engine configs expect: at most 15
/// significant digits, no trailing `.0`, no negative zero.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded: f64 = format!("{:.14e}", value).parse().unwrap_or(value);
    if rounded == 0.0 {
        return "0".to_string();
    }
    rounded.to_string()
}
