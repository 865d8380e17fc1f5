//! Importing settings from other profiles and settings files.
//!
//! Imports either merge into an existing layer of the current profile (the
//! user layer, or a freshly created preset) or turn a flat settings file
//! into a new quality/material preset. Only values that differ from what
//! the profile already resolves are written, so an import never pins
//! settings that were merely inherited.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use super::reader::{read_ini_layer, read_printer_settings};
use super::types::{PresetKind, PrinterSettings};
use crate::error::SliceMapError;
use crate::settings::{Cascade, SettingsLayer, LAYER_ID_KEY, LAYER_NAME_KEY};

/// Keys that identify a preset and are never merged into another layer.
const SKIP_MERGE_KEYS: &[&str] = &[LAYER_NAME_KEY, LAYER_ID_KEY];

/// Recognized settings file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Full printer profile (JSON).
    Printer,
    /// Flat `key = value` settings (Slic3r style).
    Ini,
    /// Legacy preset file, same layout as `.ini`.
    Slice,
}

impl ImportFormat {
    /// Classify a file by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, SliceMapError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("printer") => Ok(Self::Printer),
            Some("ini") => Ok(Self::Ini),
            Some("slice") => Ok(Self::Slice),
            _ => Err(SliceMapError::UnrecognizedFormat(display_name(path))),
        }
    }
}

/// Which preset of an incoming profile to merge. With neither selected the
/// incoming base layer is merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSelection {
    pub quality: Option<usize>,
    pub material: Option<usize>,
}

/// The layer of the current profile receiving merged values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDestination {
    User,
    Preset { kind: PresetKind, index: usize },
}

/// Merge part of `incoming` into `destination` of `current`.
///
/// A selected material preset takes priority over a selected quality
/// preset; the two are never combined. Preset keys are copied verbatim
/// (except the preset's name and id; the name is kept when the destination
/// is itself a preset). Base layer keys are copied only where they differ
/// from what `[destination, base, OEM]` resolves.
///
/// Returns the number of values written.
pub fn merge_printer_settings(
    current: &mut PrinterSettings,
    destination: MergeDestination,
    incoming: &PrinterSettings,
    selection: MergeSelection,
) -> Result<usize, SliceMapError> {
    let into_user_layer = destination == MergeDestination::User;

    let updates = if let Some(index) = selection.material {
        preset_updates(incoming, PresetKind::Material, index, into_user_layer)?
    } else if let Some(index) = selection.quality {
        preset_updates(incoming, PresetKind::Quality, index, into_user_layer)?
    } else {
        let target = destination_layer(current, destination)?;
        let cascade = Cascade::new(vec![target, &current.base_layer, &current.oem_layer]);
        changed_values(&incoming.base_layer, &cascade)
    };

    let target = destination_layer_mut(current, destination)?;
    for (key, value) in &updates {
        target.set(key.as_str(), value.as_str());
    }

    info!("Merged {} settings into {:?}", updates.len(), destination);
    Ok(updates.len())
}

/// Merge a Slic3r-style flat settings layer into the user layer.
///
/// Only keys whose value differs from the active cascade are written.
pub fn merge_ini_into_user(
    current: &mut PrinterSettings,
    ini: &SettingsLayer,
    source_name: &str,
) -> Result<usize, SliceMapError> {
    if !ini.contains_key("layer_height") {
        return Err(SliceMapError::UnsupportedIni(source_name.to_string()));
    }

    let updates = changed_values(ini, &current.cascade());
    for (key, value) in &updates {
        current.user_layer.set(key.as_str(), value.as_str());
    }

    info!("Merged {} settings from {} into the user layer", updates.len(), source_name);
    Ok(updates.len())
}

/// Build a named preset from a flat settings layer, keeping only the values
/// that differ from the printer's base and OEM layers.
///
/// Legacy `.slice` files are always accepted; `.ini` files must look like
/// Slic3r output (contain `layer_height`).
pub fn preset_from_ini(
    current: &PrinterSettings,
    ini: &SettingsLayer,
    name: &str,
    format: ImportFormat,
) -> Result<SettingsLayer, SliceMapError> {
    let is_slic3r = format == ImportFormat::Slice || ini.contains_key("layer_height");
    if !is_slic3r {
        return Err(SliceMapError::UnsupportedIni(name.to_string()));
    }

    let mut preset = SettingsLayer::named(name);
    for (key, value) in changed_values(ini, &current.base_and_oem_cascade()) {
        preset.set(key, value);
    }

    debug!("Built preset {:?} with {} settings", name, preset.len());
    Ok(preset)
}

/// Merge a settings file into the user layer of `current`.
pub fn merge_file_into_user(
    current: &mut PrinterSettings,
    path: &Path,
    selection: MergeSelection,
) -> Result<usize> {
    let written = match ImportFormat::from_path(path)? {
        ImportFormat::Printer => {
            let incoming = read_printer_settings(path)?;
            merge_printer_settings(current, MergeDestination::User, &incoming, selection)?
        }
        ImportFormat::Ini | ImportFormat::Slice => {
            let ini = read_ini_layer(path)?;
            merge_ini_into_user(current, &ini, &display_name(path))?
        }
    };
    Ok(written)
}

/// Import a settings file as a new quality or material preset and return
/// the new preset's id.
///
/// For `.printer` files the preset starts empty and receives the part of
/// the file chosen by `selection`.
pub fn import_preset_file(
    current: &mut PrinterSettings,
    path: &Path,
    kind: PresetKind,
    selection: MergeSelection,
) -> Result<String> {
    let name = file_stem(path);

    let id = match ImportFormat::from_path(path)? {
        ImportFormat::Printer => {
            let incoming = read_printer_settings(path)?;
            let id = current.add_preset(kind, SettingsLayer::named(name));
            let index = current.presets(kind).len() - 1;
            let merged = merge_printer_settings(
                current,
                MergeDestination::Preset { kind, index },
                &incoming,
                selection,
            );
            if let Err(e) = merged {
                current.presets_mut(kind).pop();
                return Err(e.into());
            }
            id
        }
        format @ (ImportFormat::Ini | ImportFormat::Slice) => {
            let ini = read_ini_layer(path)?;
            let preset = preset_from_ini(current, &ini, &name, format)?;
            current.add_preset(kind, preset)
        }
    };

    info!("Imported {:?} as {} preset {}", path, kind.label(), id);
    Ok(id)
}

fn preset_updates(
    incoming: &PrinterSettings,
    kind: PresetKind,
    index: usize,
    into_user_layer: bool,
) -> Result<Vec<(String, String)>, SliceMapError> {
    let presets = incoming.presets(kind);
    let preset = presets.get(index).ok_or(SliceMapError::PresetOutOfRange {
        kind: kind.label(),
        index,
        count: presets.len(),
    })?;

    let mut updates: Vec<(String, String)> = preset
        .iter()
        .filter(|(key, _)| !SKIP_MERGE_KEYS.contains(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    if !into_user_layer {
        if let Some(name) = preset.name() {
            updates.push((LAYER_NAME_KEY.to_string(), name.to_string()));
        }
    }

    Ok(updates)
}

/// Entries of `source` whose trimmed value differs from what `cascade`
/// resolves.
fn changed_values(source: &SettingsLayer, cascade: &Cascade<'_>) -> Vec<(String, String)> {
    source
        .iter()
        .filter(|(key, value)| cascade.resolve(key).trim() != value.trim())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn destination_layer(
    current: &PrinterSettings,
    destination: MergeDestination,
) -> Result<&SettingsLayer, SliceMapError> {
    match destination {
        MergeDestination::User => Ok(&current.user_layer),
        MergeDestination::Preset { kind, index } => {
            let presets = current.presets(kind);
            presets.get(index).ok_or(SliceMapError::PresetOutOfRange {
                kind: kind.label(),
                index,
                count: presets.len(),
            })
        }
    }
}

fn destination_layer_mut(
    current: &mut PrinterSettings,
    destination: MergeDestination,
) -> Result<&mut SettingsLayer, SliceMapError> {
    match destination {
        MergeDestination::User => Ok(&mut current.user_layer),
        MergeDestination::Preset { kind, index } => {
            let presets = current.presets_mut(kind);
            let count = presets.len();
            presets.get_mut(index).ok_or(SliceMapError::PresetOutOfRange {
                kind: kind.label(),
                index,
                count,
            })
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn layer(pairs: &[(&str, &str)]) -> SettingsLayer {
        pairs.iter().copied().collect()
    }

    fn current() -> PrinterSettings {
        PrinterSettings {
            oem_layer: layer(&[("temperature", "200"), ("layer_height", "0.2")]),
            base_layer: layer(&[("bed_temperature", "60")]),
            ..Default::default()
        }
    }

    fn incoming() -> PrinterSettings {
        PrinterSettings {
            base_layer: layer(&[("temperature", "200"), ("bed_temperature", "90")]),
            quality_layers: vec![layer(&[
                ("layer_name", "Fine"),
                ("layer_id", "q1"),
                ("layer_height", "0.1"),
            ])],
            material_layers: vec![layer(&[
                ("layer_name", "ABS"),
                ("layer_id", "m1"),
                ("temperature", "245"),
            ])],
            ..Default::default()
        }
    }

    #[test]
    fn test_import_format_from_path() {
        assert_eq!(
            ImportFormat::from_path(Path::new("a/b.PRINTER")).unwrap(),
            ImportFormat::Printer
        );
        assert_eq!(ImportFormat::from_path(Path::new("x.ini")).unwrap(), ImportFormat::Ini);
        assert_eq!(ImportFormat::from_path(Path::new("x.slice")).unwrap(), ImportFormat::Slice);

        let err = ImportFormat::from_path(Path::new("dir/model.stl")).unwrap_err();
        assert_eq!(err.to_string(), "Unable to recognize settings file 'model.stl'");
    }

    #[test]
    fn test_merge_base_layer_only_writes_differences() {
        let mut settings = current();
        let written = merge_printer_settings(
            &mut settings,
            MergeDestination::User,
            &incoming(),
            MergeSelection::default(),
        )
        .unwrap();

        assert_eq!(written, 1);
        assert_eq!(settings.user_layer.get("bed_temperature"), Some("90"));
        assert_eq!(settings.user_layer.get("temperature"), None);
    }

    #[test]
    fn test_merge_material_wins_over_quality() {
        let mut settings = current();
        merge_printer_settings(
            &mut settings,
            MergeDestination::User,
            &incoming(),
            MergeSelection {
                quality: Some(0),
                material: Some(0),
            },
        )
        .unwrap();

        assert_eq!(settings.user_layer.get("temperature"), Some("245"));
        assert_eq!(settings.user_layer.get("layer_height"), None);
    }

    #[test]
    fn test_merge_into_user_skips_identity_keys() {
        let mut settings = current();
        merge_printer_settings(
            &mut settings,
            MergeDestination::User,
            &incoming(),
            MergeSelection {
                quality: Some(0),
                material: None,
            },
        )
        .unwrap();

        assert_eq!(settings.user_layer.get("layer_height"), Some("0.1"));
        assert_eq!(settings.user_layer.name(), None);
        assert_eq!(settings.user_layer.id(), None);
    }

    #[test]
    fn test_merge_into_preset_keeps_name() {
        let mut settings = current();
        let id = settings.add_preset(PresetKind::Quality, SettingsLayer::named("incoming"));
        merge_printer_settings(
            &mut settings,
            MergeDestination::Preset {
                kind: PresetKind::Quality,
                index: 0,
            },
            &incoming(),
            MergeSelection {
                quality: Some(0),
                material: None,
            },
        )
        .unwrap();

        let preset = &settings.quality_layers[0];
        assert_eq!(preset.name(), Some("Fine"));
        assert_eq!(preset.id(), Some(id.as_str()));
        assert_eq!(preset.get("layer_height"), Some("0.1"));
    }

    #[test]
    fn test_merge_out_of_range_preset() {
        let mut settings = current();
        let err = merge_printer_settings(
            &mut settings,
            MergeDestination::User,
            &incoming(),
            MergeSelection {
                quality: None,
                material: Some(4),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SliceMapError::PresetOutOfRange { index: 4, count: 1, .. }
        ));
    }

    #[test]
    fn test_merge_ini_requires_layer_height() {
        let mut settings = current();
        let err = merge_ini_into_user(&mut settings, &layer(&[("infill", "20")]), "cura.ini")
            .unwrap_err();
        assert!(matches!(err, SliceMapError::UnsupportedIni(_)));
    }

    #[test]
    fn test_merge_ini_into_user() {
        let mut settings = current();
        let ini = layer(&[("layer_height", "0.2"), ("temperature", " 215 ")]);
        let written = merge_ini_into_user(&mut settings, &ini, "slic3r.ini").unwrap();

        assert_eq!(written, 1);
        assert_eq!(settings.user_layer.get("temperature"), Some(" 215 "));
        assert_eq!(settings.value("temperature"), " 215 ");
    }

    #[test]
    fn test_preset_from_ini_diffs_against_printer_layers() {
        let mut settings = current();
        settings.set_user_value("bed_temperature", "100");
        let ini = layer(&[("layer_height", "0.2"), ("bed_temperature", "60"), ("temperature", "230")]);

        let preset = preset_from_ini(&settings, &ini, "PETG", ImportFormat::Ini).unwrap();
        assert_eq!(preset.name(), Some("PETG"));
        assert_eq!(preset.get("temperature"), Some("230"));
        assert_eq!(preset.get("bed_temperature"), None);
        assert_eq!(preset.get("layer_height"), None);
    }

    #[test]
    fn test_preset_from_slice_needs_no_layer_height() {
        let settings = current();
        let ini = layer(&[("temperature", "230")]);
        assert!(preset_from_ini(&settings, &ini, "legacy", ImportFormat::Slice).is_ok());
        assert!(preset_from_ini(&settings, &ini, "legacy", ImportFormat::Ini).is_err());
    }

    #[test]
    fn test_import_preset_file_from_ini() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("Silk PLA.ini");
        std::fs::write(&path, "layer_height = 0.2\ntemperature = 215\n").unwrap();

        let mut settings = current();
        let id = import_preset_file(
            &mut settings,
            &path,
            PresetKind::Material,
            MergeSelection::default(),
        )
        .unwrap();

        let preset = &settings.material_layers[0];
        assert_eq!(preset.id(), Some(id.as_str()));
        assert_eq!(preset.name(), Some("Silk PLA"));
        assert_eq!(preset.get("temperature"), Some("215"));
    }

    #[test]
    fn test_merge_unknown_file_type() {
        let mut settings = current();
        let err = merge_file_into_user(
            &mut settings,
            Path::new("notes.txt"),
            MergeSelection::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unable to recognize"));
    }
}
