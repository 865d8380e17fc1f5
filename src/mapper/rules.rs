//! Mapping table construction.
//!
//! The process-wide table is declared in `config/slicer_mappings.toml` and
//! compiled into the binary; it is parsed once on first use and never
//! changes afterwards.

use std::collections::HashSet;
use std::sync::OnceLock;

use tracing::{debug, warn};

use super::types::{MappedSetting, MappingConfig};
use crate::error::SliceMapError;

/// Default mappings embedded in the binary at compile time.
const DEFAULT_MAPPINGS: &str = include_str!("../../config/slicer_mappings.toml");

/// An ordered, read-only list of mapping rules.
///
/// Order matters: macro substitution applies rules first to last, so a
/// value produced by an early rule may still contain placeholders that a
/// later rule fills in.
#[derive(Debug, Clone)]
pub struct MappingTable {
    rules: Vec<MappedSetting>,
}

impl MappingTable {
    /// Build a table from rules in application order.
    ///
    /// Duplicate placeholder names are reported but kept; the last one
    /// applied wins during substitution.
    pub fn new(rules: Vec<MappedSetting>) -> Self {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.placeholder_name()) {
                warn!(
                    "Mapping table exports {:?} more than once; the last rule wins",
                    rule.placeholder_name()
                );
            }
        }
        debug!("Built mapping table with {} rules", rules.len());
        Self { rules }
    }

    /// Parse a table from a TOML document of `[[mapping]]` entries.
    pub fn from_toml(content: &str) -> Result<Self, SliceMapError> {
        let config: MappingConfig =
            toml::from_str(content).map_err(|e| SliceMapError::MappingTable(e.to_string()))?;
        Ok(Self::new(config.mappings))
    }

    pub fn rules(&self) -> &[MappedSetting] {
        &self.rules
    }

    /// The rule substituted last for `placeholder`, if any.
    pub fn get(&self, placeholder: &str) -> Option<&MappedSetting> {
        self.rules
            .iter()
            .rev()
            .find(|r| r.placeholder_name() == placeholder)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The process-wide mapping table.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_table() -> &'static MappingTable {
    static TABLE: OnceLock<MappingTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        MappingTable::from_toml(DEFAULT_MAPPINGS)
            .expect("embedded slicer_mappings.toml must be a valid mapping table")
    })
}
