//! Layered printer settings and the cascade resolver.
//!
//! A setting's effective value is found by scanning an ordered list of
//! layers (most specific first) and taking the first one that defines the
//! key, falling back to the built-in defaults and finally the empty string.

pub mod defaults;
pub mod resolver;
pub mod types;

pub use defaults::builtin_defaults;
pub use resolver::{parse_or, resolve, Cascade};
pub use types::{SettingsLayer, LAYER_ID_KEY, LAYER_NAME_KEY};
