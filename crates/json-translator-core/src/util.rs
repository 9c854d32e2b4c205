//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Read a schema source file, mapping failures to a config error.
pub fn read_schema(path: impl AsRef<std::path::Path>) -> crate::Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| {
        crate::Error::ConfigLoad(format!("Failed to read schema file {}: {}", path.display(), e))
    })
}
