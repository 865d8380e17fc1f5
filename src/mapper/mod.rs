//! Slicer settings mapping.
//!
//! Converts profile settings into the literal values a slicing engine's
//! configuration and G-code templates expect.
//!
//! # Architecture
//!
//! - **Table**: an ordered list of [`MappedSetting`] rules, embedded from
//!   `config/slicer_mappings.toml` and built once per process
//! - **Transforms**: each rule resolves its canonical key against the active
//!   cascade and converts it (percentages, unit suffixes, scaling, start
//!   G-code injection)
//! - **Substitution**: `{name}` and `[name]` placeholders are replaced rule by
//!   rule, in table order
//!
//! # Example
//!
//! ```
//! use slicemap::mapper::{default_table, MappingContext};
//! use slicemap::settings::{Cascade, SettingsLayer};
//!
//! let mut user = SettingsLayer::named("User");
//! user.set("bed_temperature", "60");
//! let base = SettingsLayer::new();
//!
//! let cascade = Cascade::new(vec![&user, &base]);
//! let ctx = MappingContext::new(&cascade, &[true]);
//!
//! let gcode = default_table().replace_macro_values("M140 S{bed_temperature}", &ctx);
//! assert_eq!(gcode, "M140 S60");
//! ```

mod engine;
mod number;
mod rules;
mod start_gcode;
mod types;

pub use engine::{unescape_newlines, MappingContext};
pub use number::{first_value, format_number, percent_or_number};
pub use rules::{default_table, MappingTable};
pub use types::*;
