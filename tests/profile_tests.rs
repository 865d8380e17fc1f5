use std::path::PathBuf;

use slicemap::mapper::{default_table, MappingContext};
use slicemap::profile::import::{import_preset_file, merge_file_into_user};
use slicemap::profile::reader::{read_ini_layer, read_printer_settings};
use slicemap::profile::writer::write_printer_settings_atomic;
use slicemap::profile::{MergeSelection, PresetKind, PrinterSettings};
use slicemap::SliceMapError;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn sample_profile() -> PrinterSettings {
    read_printer_settings(&fixture_path("sample.printer")).expect("Failed to read fixture")
}

#[test]
fn test_fixture_loads_all_layers() {
    let settings = sample_profile();

    assert_eq!(settings.id, "7c1f6d5e-ender");
    assert_eq!(settings.name(), Some("Ender Dual"));
    assert_eq!(settings.quality_layers.len(), 1);
    assert_eq!(settings.material_layers.len(), 1);
    assert_eq!(settings.active_quality().and_then(|l| l.name()), Some("Fine"));
    assert!(settings.active_material().is_none());
}

#[test]
fn test_save_and_reload_preserves_document() {
    let settings = sample_profile();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("copy.printer");

    write_printer_settings_atomic(&settings, &path).expect("Failed to write");
    let reloaded = read_printer_settings(&path).expect("Failed to reload");

    assert_eq!(settings, reloaded);

    let keys: Vec<&str> = reloaded.quality_layers[0].iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["layer_id", "layer_name", "layer_height", "top_solid_layers"]);

    let saved = std::fs::read_to_string(&path).expect("Failed to read saved file");
    let id_at = saved.find("\"layer_id\": \"fine\"").expect("quality id saved");
    let height_at = saved.find("\"layer_height\": \"0.1\"").expect("quality height saved");
    assert!(id_at < height_at, "layer keys were reordered on save");
}

#[test]
fn test_read_slic3r_ini() {
    let ini = read_ini_layer(&fixture_path("slic3r_config.ini")).expect("Failed to read ini");

    assert_eq!(ini.len(), 6);
    assert_eq!(ini.get("first_layer_speed"), Some("30%"));
    assert_eq!(
        ini.get("start_gcode"),
        Some("G28 ; home all axes\\nM109 S[temperature]")
    );
}

#[test]
fn test_merge_ini_file_into_user_layer() {
    let mut settings = sample_profile();
    let written = merge_file_into_user(
        &mut settings,
        &fixture_path("slic3r_config.ini"),
        MergeSelection::default(),
    )
    .expect("Failed to merge");

    assert_eq!(written, 6);
    assert_eq!(settings.value("bed_temperature"), "60");
    assert_eq!(settings.value("layer_height"), "0.2");
    assert_eq!(settings.value("temperature"), "210");
}

#[test]
fn test_merged_start_gcode_keeps_user_wait() {
    let mut settings = sample_profile();
    merge_file_into_user(
        &mut settings,
        &fixture_path("slic3r_config.ini"),
        MergeSelection::default(),
    )
    .expect("Failed to merge");

    let cascade = settings.cascade();
    let ctx = MappingContext::new(&cascade, &[true]);
    let rendered = default_table().replace_macro_values("{start_gcode}", &ctx);

    assert!(rendered.contains("M109 S210"));
    assert_eq!(
        rendered.lines().filter(|l| l.starts_with("M109 ")).count(),
        1,
        "Only the user's own M109 should remain:\n{}",
        rendered
    );
}

#[test]
fn test_import_printer_file_as_material_preset() {
    let mut settings = PrinterSettings::default();
    let id = import_preset_file(
        &mut settings,
        &fixture_path("sample.printer"),
        PresetKind::Material,
        MergeSelection {
            quality: None,
            material: Some(0),
        },
    )
    .expect("Failed to import");

    settings
        .select_preset(PresetKind::Material, Some(&id))
        .expect("Imported preset should be selectable");

    let preset = settings.active_material().expect("Preset should be active");
    assert_eq!(preset.name(), Some("PETG"));
    assert_eq!(settings.value("temperature"), "235");
}

#[test]
fn test_failed_preset_import_leaves_presets_unchanged() {
    let mut settings = sample_profile();
    let before = settings.material_layers.clone();

    let err = import_preset_file(
        &mut settings,
        &fixture_path("sample.printer"),
        PresetKind::Material,
        MergeSelection {
            quality: None,
            material: Some(7),
        },
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SliceMapError>(),
        Some(SliceMapError::PresetOutOfRange { index: 7, count: 1, .. })
    ));
    assert_eq!(settings.material_layers, before);
}

#[test]
fn test_unknown_extension_is_rejected() {
    let mut settings = sample_profile();
    let err = merge_file_into_user(
        &mut settings,
        &fixture_path("model.stl"),
        MergeSelection::default(),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "Unable to recognize settings file 'model.stl'");
}
