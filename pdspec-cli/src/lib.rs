// All core functionality is in pdspec-core
// This CLI acts as a thin wrapper around the core library

use std::path::{Path, PathBuf};
use tracing::warn;

// Re-export core types for convenience
pub use pdspec_core::*;

/// Application directory under the platform config dir
pub const APP_DIR: &str = "pdspec";
pub const CONFIG_FILE: &str = "config.yaml";

/// `<config_dir>/pdspec/config.yaml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Which config file to load: the explicit one, else the discovered default
/// when it exists.
pub fn resolve_config_path(explicit: Option<&Path>, discovered: Option<PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discovered.filter(|path| path.is_file()),
    }
}

/// A loaded config and the file it was read from, if any.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ExtractionConfig,
    pub source: Option<PathBuf>,
}

/// Load the config (falling back to defaults when the file cannot be read) and
/// apply `PDSPEC_*` overrides.
pub fn load_config(path: Option<&Path>, strict: bool) -> LoadedConfig {
    let (config, source) = match path {
        Some(p) => match ExtractionConfig::load_from_file(p) {
            Ok(config) => (config, Some(p.to_path_buf())),
            Err(e) => {
                warn!(path = %p.display(), error = %e, "failed to load config, using defaults");
                (ExtractionConfig::default(), None)
            }
        },
        None => (ExtractionConfig::default(), None),
    };

    let mut config = config.with_env_overrides();
    if strict {
        config.validation.strict_mode = true;
    }
    LoadedConfig { config, source }
}
