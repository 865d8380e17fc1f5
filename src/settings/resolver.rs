//! First-match-wins setting lookup over an ordered cascade of layers.

use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use super::defaults::builtin_defaults;
use super::types::SettingsLayer;

/// An ordered view over settings layers, most specific first, backed by a
/// defaults layer consulted when no layer defines a key.
///
/// A cascade only borrows its layers; building one is cheap and it never
/// mutates what it reads.
#[derive(Debug, Clone)]
pub struct Cascade<'a> {
    layers: Vec<&'a SettingsLayer>,
    defaults: &'a SettingsLayer,
}

impl<'a> Cascade<'a> {
    /// Cascade over `layers` backed by the built-in defaults.
    pub fn new(layers: Vec<&'a SettingsLayer>) -> Self {
        Self {
            layers,
            defaults: builtin_defaults(),
        }
    }

    /// Cascade over a single layer (e.g. an already merged profile).
    pub fn single(layer: &'a SettingsLayer) -> Self {
        Self::new(vec![layer])
    }

    /// Cascade with an explicit defaults layer instead of the built-in one.
    pub fn with_defaults(layers: Vec<&'a SettingsLayer>, defaults: &'a SettingsLayer) -> Self {
        Self { layers, defaults }
    }

    pub fn layers(&self) -> &[&'a SettingsLayer] {
        &self.layers
    }

    /// The value from the first layer defining `key`, else the default for
    /// `key`, else the empty string.
    pub fn resolve(&self, key: &str) -> String {
        self.find(key).unwrap_or_default().to_string()
    }

    /// Like [`resolve`](Self::resolve) but distinguishes "defined nowhere".
    pub fn find(&self, key: &str) -> Option<&'a str> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(key))
            .or_else(|| self.defaults.get(key))
    }

    /// Resolve `key` and parse it as `T`, returning `fallback` (and logging)
    /// when the text does not parse.
    pub fn resolve_as<T>(&self, key: &str, fallback: T) -> T
    where
        T: FromStr + Display,
    {
        let raw = self.resolve(key);
        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "Setting {:?} has non-numeric value {:?}; using {}",
                    key, raw, fallback
                );
                fallback
            }
        }
    }

    /// Material temperature for a 0-based extruder index.
    ///
    /// Extruder 0 reads `temperature`; extruder `n` reads `temperature{n}`
    /// and falls back to `temperature` when that is empty.
    pub fn extruder_temperature(&self, extruder_index: usize) -> String {
        if extruder_index > 0 {
            let value = self.resolve(&format!("temperature{}", extruder_index));
            if !value.trim().is_empty() {
                return value;
            }
        }
        self.resolve("temperature")
    }
}

/// Resolve `key` against `layers` (most specific first) and the built-in
/// defaults.
pub fn resolve(key: &str, layers: &[&SettingsLayer]) -> String {
    Cascade::new(layers.to_vec()).resolve(key)
}

/// Parse `text` as `T`, logging and returning `fallback` on failure.
///
/// A single malformed user value must never abort a slicing run, so every
/// numeric conversion in the mapping pipeline goes through here.
pub fn parse_or<T>(text: &str, fallback: T) -> T
where
    T: FromStr + Display,
{
    match text.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Slicing value {:?} is not a number; using {}", text, fallback);
            fallback
        }
    }
}
