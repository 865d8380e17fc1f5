pub mod import;
pub mod paths;
pub mod reader;
pub mod types;
pub mod writer;

pub use import::{ImportFormat, MergeDestination, MergeSelection};
pub use paths::ProfilePaths;
pub use types::{PresetKind, PrinterSettings};
