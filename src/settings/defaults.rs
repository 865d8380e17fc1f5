//! Built-in setting defaults, the last stop of every cascade lookup.

use std::sync::OnceLock;

use super::types::SettingsLayer;

/// Defaults embedded in the binary at compile time.
/// These are loaded from `config/default_settings.toml`.
const DEFAULT_SETTINGS: &str = include_str!("../../config/default_settings.toml");

/// The process-wide built-in defaults layer.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn builtin_defaults() -> &'static SettingsLayer {
    static DEFAULTS: OnceLock<SettingsLayer> = OnceLock::new();
    DEFAULTS.get_or_init(|| {
        let mut layer: SettingsLayer = toml::from_str(DEFAULT_SETTINGS)
            .expect("embedded default_settings.toml must be valid TOML");
        layer.set_name("Defaults");
        layer
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let defaults = builtin_defaults();
        assert!(defaults.len() > 20, "Should have a full set of defaults");
        assert_eq!(defaults.name(), Some("Defaults"));
    }

    #[test]
    fn test_defaults_cover_start_gcode_inputs() {
        let defaults = builtin_defaults();
        for key in [
            "extruder_count",
            "heat_extruder_before_homing",
            "bed_temperature",
            "temperature",
            "start_gcode",
            "end_gcode",
        ] {
            assert!(defaults.contains_key(key), "Missing default for {}", key);
        }
    }

    #[test]
    fn test_gcode_defaults_keep_escaped_newlines() {
        let start = builtin_defaults().get("start_gcode").unwrap();
        assert!(start.contains("\\n"), "start_gcode should be stored escaped");
        assert!(!start.contains('\n'));
    }
}
