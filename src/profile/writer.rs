use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use super::types::PrinterSettings;

/// Write a printer profile to disk atomically.
///
/// Uses a temporary file in the same directory as `target_path`, writes
/// the JSON content, then atomically renames the temp file to the target.
/// An interrupted save never leaves a partial profile behind.
pub fn write_printer_settings_atomic(settings: &PrinterSettings, target_path: &Path) -> Result<()> {
    let json = settings.to_json_pretty()?;

    let parent = target_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Target path has no parent directory: {:?}", target_path))?;

    std::fs::create_dir_all(parent)?;

    // Same filesystem as the target, so the rename is atomic
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(json.as_bytes())?;
    temp.flush()?;

    temp.persist(target_path)?;

    info!("Wrote profile to {:?}", target_path);
    Ok(())
}
