//! Type definitions for the slicer settings mapping table.
//!
//! These types deserialize from the TOML table document; each rule pairs a
//! canonical setting key with the name it is exported under and the
//! transformation producing the engine value.

use serde::Deserialize;

/// How a rule turns the resolved setting into the exported value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// The resolved value unchanged.
    #[default]
    Direct,
    /// First comma-separated token (e.g. per-extruder lists).
    FirstValue,
    /// Literal `\n` sequences become real newlines.
    UnescapeNewlines,
    /// `"True"` when the value is `"1"`, `"False"` otherwise.
    BoolString,
    /// First token, percent aware, multiplied by `scale`.
    ScaledNumber {
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// A percentage of the `reference` setting, or a direct number; zero
    /// falls back to the reference. The result is multiplied by `scale`.
    PercentOfReferenceOrDirect {
        reference: String,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// A distance (`"1.2mm"`) becomes a count of `denominator` units;
    /// anything else passes through.
    CountOrDistance { denominator: String },
    /// Start G-code with injected heat-up and mode commands.
    StartGcode {
        #[serde(default)]
        escape_newlines: bool,
    },
    /// Shown in the editor but never handed to the engine.
    VisibleNotMapped,
}

fn unit_scale() -> f64 {
    1.0
}

/// A single entry of the mapping table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MappedSetting {
    /// Application setting key the value is read from.
    pub canonical: String,
    /// Placeholder name used in templates and engine configs. Empty for
    /// settings that are not exported.
    #[serde(default)]
    pub exported: String,
    #[serde(default)]
    pub transform: Transform,
}

impl MappedSetting {
    pub fn new(canonical: &str, exported: &str, transform: Transform) -> Self {
        Self {
            canonical: canonical.to_string(),
            exported: exported.to_string(),
            transform,
        }
    }

    /// Identifier substituted for `{name}` / `[name]`.
    ///
    /// Rules without an exported name still clear their canonical
    /// placeholder.
    pub fn placeholder_name(&self) -> &str {
        if self.exported.is_empty() {
            &self.canonical
        } else {
            &self.exported
        }
    }

    /// Whether this rule contributes to the engine's exported settings.
    pub fn is_exported(&self) -> bool {
        !matches!(self.transform, Transform::VisibleNotMapped)
    }
}

/// Root document of a mapping table file.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    #[serde(rename = "mapping", default)]
    pub mappings: Vec<MappedSetting>,
}
