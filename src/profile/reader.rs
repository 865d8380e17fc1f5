use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use super::types::PrinterSettings;
use crate::settings::SettingsLayer;

/// Read a printer profile (`.printer` JSON) from disk.
pub fn read_printer_settings(path: &Path) -> Result<PrinterSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {:?}", path))?;
    let settings = PrinterSettings::from_json(&content)
        .with_context(|| format!("Failed to parse profile {:?}", path))?;

    debug!(
        "Read profile {:?} with {} quality and {} material presets from {:?}",
        settings.name().unwrap_or("<unnamed>"),
        settings.quality_layers.len(),
        settings.material_layers.len(),
        path
    );

    Ok(settings)
}

/// Read a flat settings file (`.ini`, legacy `.slice`) into a layer.
pub fn read_ini_layer(path: &Path) -> Result<SettingsLayer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {:?}", path))?;
    let layer = parse_ini(&content);
    debug!("Read {} settings from {:?}", layer.len(), path);
    Ok(layer)
}

/// Parse `key = value` lines.
///
/// Blank lines, `#`/`;` comments and `[section]` headers are skipped; only
/// the first `=` splits, so G-code values may contain `=` themselves.
pub fn parse_ini(content: &str) -> SettingsLayer {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('#') && !line.starts_with(';') && !line.starts_with('['))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
