use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceMapError {
    #[error("Unable to recognize settings file '{0}'")]
    UnrecognizedFormat(String),

    #[error("Settings file '{0}' is not a Slic3r-style INI (no layer_height)")]
    UnsupportedIni(String),

    #[error("Mapping table error: {0}")]
    MappingTable(String),

    #[error("{kind} preset index {index} out of range ({count} available)")]
    PresetOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("Profile error: {0}")]
    Profile(String),
}

