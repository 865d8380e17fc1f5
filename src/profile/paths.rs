use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the profile directory.
pub const PROFILE_DIR_ENV: &str = "SLICEMAP_PROFILE_DIR";

/// Where printer profiles live on this machine.
#[derive(Debug, Clone)]
pub struct ProfilePaths {
    /// Directory holding `<name>.printer` files.
    pub profile_dir: PathBuf,
}

impl ProfilePaths {
    /// Detect the profile directory.
    ///
    /// Uses `$SLICEMAP_PROFILE_DIR` when set, otherwise
    /// `<config dir>/slicemap/profiles` (e.g. `~/.config/slicemap/profiles`
    /// on Linux).
    pub fn detect() -> Result<Self> {
        if let Some(dir) = std::env::var_os(PROFILE_DIR_ENV).filter(|d| !d.is_empty()) {
            debug!("Using profile directory from {}: {:?}", PROFILE_DIR_ENV, dir);
            return Ok(Self::new(PathBuf::from(dir)));
        }

        let Some(config_dir) = dirs::config_dir() else {
            bail!(
                "Could not determine a configuration directory; set {}",
                PROFILE_DIR_ENV
            );
        };
        let profile_dir = config_dir.join("slicemap").join("profiles");
        debug!("Using profile directory {:?}", profile_dir);
        Ok(Self::new(profile_dir))
    }

    pub fn new(profile_dir: PathBuf) -> Self {
        Self { profile_dir }
    }

    /// Path of the profile called `name`.
    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.profile_dir.join(format!("{}.printer", name))
    }

    /// Interpret a command-line profile argument.
    ///
    /// Anything that looks like a path (has an extension, a directory
    /// component, or exists) is used as is; a bare word is a profile name.
    pub fn resolve_profile(&self, arg: &str) -> PathBuf {
        let path = Path::new(arg);
        let looks_like_path =
            path.extension().is_some() || path.components().count() > 1 || path.exists();
        if looks_like_path {
            path.to_path_buf()
        } else {
            self.profile_path(arg)
        }
    }
}
