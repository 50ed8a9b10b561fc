//! Default paths for rosterd
//!
//! Paths are user-writable by default (no root required):
//! - Data: `$XDG_DATA_HOME/rosterd` or `~/.local/share/rosterd`

use std::path::PathBuf;

/// Environment variable for overriding the data file path
pub const ROSTER_DATA_FILE_ENV: &str = "ROSTER_DATA_FILE";

/// Data filename within the data directory
const DATA_FILENAME: &str = "roster.json";

/// Application subdirectory name
const APP_DIR: &str = "rosterd";

/// Get the default data file path.
///
/// Order of precedence:
/// 1. `$ROSTER_DATA_FILE` environment variable (if set)
/// 2. `$XDG_DATA_HOME/rosterd/roster.json` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/rosterd/roster.json` (fallback)
pub fn default_data_file() -> PathBuf {
    if let Ok(path) = std::env::var(ROSTER_DATA_FILE_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env().join(DATA_FILENAME)
}

/// Get the data directory without checking the env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR)
}
