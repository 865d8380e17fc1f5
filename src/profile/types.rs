use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::SliceMapError;
use crate::settings::{Cascade, SettingsLayer};

/// A printer profile document (`.printer`).
///
/// Owns every layer of one printer: the OEM layer shipped by the
/// manufacturer, the printer base layer, the user's edits and the quality
/// and material presets, along with which presets are selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrinterSettings {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub document_version: u32,
    #[serde(default)]
    pub oem_layer: SettingsLayer,
    #[serde(default)]
    pub base_layer: SettingsLayer,
    #[serde(default)]
    pub user_layer: SettingsLayer,
    #[serde(default)]
    pub quality_layers: Vec<SettingsLayer>,
    #[serde(default)]
    pub material_layers: Vec<SettingsLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_quality_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_material_key: Option<String>,
}

/// Which preset list an imported layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Quality,
    Material,
}

impl PresetKind {
    pub fn label(self) -> &'static str {
        match self {
            PresetKind::Quality => "Quality",
            PresetKind::Material => "Material",
        }
    }
}

impl PrinterSettings {
    /// Parse a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON with 2-space indentation and a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"  ");
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        let mut s = String::from_utf8(buf)?;
        if !s.ends_with('\n') {
            s.push('\n');
        }
        Ok(s)
    }

    /// Display name of the printer (from the OEM or base layer).
    pub fn name(&self) -> Option<&str> {
        self.user_layer
            .get("printer_name")
            .or_else(|| self.base_layer.get("printer_name"))
            .or_else(|| self.oem_layer.get("printer_name"))
    }

    // --- Presets ---

    pub fn active_quality(&self) -> Option<&SettingsLayer> {
        find_preset(&self.quality_layers, self.active_quality_key.as_deref())
    }

    pub fn active_material(&self) -> Option<&SettingsLayer> {
        find_preset(&self.material_layers, self.active_material_key.as_deref())
    }

    pub fn presets(&self, kind: PresetKind) -> &[SettingsLayer] {
        match kind {
            PresetKind::Quality => &self.quality_layers,
            PresetKind::Material => &self.material_layers,
        }
    }

    pub fn presets_mut(&mut self, kind: PresetKind) -> &mut Vec<SettingsLayer> {
        match kind {
            PresetKind::Quality => &mut self.quality_layers,
            PresetKind::Material => &mut self.material_layers,
        }
    }

    /// Add a preset, giving it an id if it has none, and return that id.
    pub fn add_preset(&mut self, kind: PresetKind, mut layer: SettingsLayer) -> String {
        let id = match layer.id() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = self.next_preset_id(kind);
                layer.set_id(id.clone());
                id
            }
        };
        self.presets_mut(kind).push(layer);
        id
    }

    /// Select a preset by id, or clear the selection with `None`.
    pub fn select_preset(&mut self, kind: PresetKind, id: Option<&str>) -> Result<(), SliceMapError> {
        if let Some(id) = id {
            if find_preset(self.presets(kind), Some(id)).is_none() {
                return Err(SliceMapError::Profile(format!(
                    "No {} preset with id {:?}",
                    kind.label().to_lowercase(),
                    id
                )));
            }
        }
        let key = id.map(str::to_string);
        match kind {
            PresetKind::Quality => self.active_quality_key = key,
            PresetKind::Material => self.active_material_key = key,
        }
        Ok(())
    }

    fn next_preset_id(&self, kind: PresetKind) -> String {
        let prefix = kind.label().to_lowercase();
        (1..)
            .map(|n| format!("{}-{}", prefix, n))
            .find(|candidate| find_preset(self.presets(kind), Some(candidate)).is_none())
            .unwrap_or(prefix)
    }

    // --- Cascade ---

    /// The active lookup order: user, selected material, selected quality,
    /// base, OEM. Built-in defaults back every lookup.
    pub fn cascade(&self) -> Cascade<'_> {
        let mut layers = vec![&self.user_layer];
        layers.extend(self.active_material());
        layers.extend(self.active_quality());
        layers.push(&self.base_layer);
        layers.push(&self.oem_layer);
        Cascade::new(layers)
    }

    /// Only the printer's own layers, ignoring user edits and presets.
    pub fn base_and_oem_cascade(&self) -> Cascade<'_> {
        Cascade::new(vec![&self.base_layer, &self.oem_layer])
    }

    /// Effective value of `key` through the active cascade.
    pub fn value(&self, key: &str) -> String {
        self.cascade().resolve(key)
    }

    // --- User edits ---

    pub fn set_user_value(&mut self, key: &str, value: &str) {
        self.user_layer.set(key, value);
    }

    pub fn clear_user_value(&mut self, key: &str) -> Option<String> {
        self.user_layer.remove(key)
    }
}

fn find_preset<'a>(layers: &'a [SettingsLayer], id: Option<&str>) -> Option<&'a SettingsLayer> {
    let id = id?;
    layers.iter().find(|layer| layer.id() == Some(id))
}
