//! XDG Base Directory paths for plugmgr data.
//!
//! Plugin data and fetched packages live under XDG paths on every platform,
//! so a package tree looks the same everywhere. Config file discovery belongs
//! to the CLI.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "plugmgr";

/// Get the plugmgr data directory.
///
/// Returns `$XDG_DATA_HOME/plugmgr` if set, otherwise `~/.local/share/plugmgr`.
/// Fetched packages live below this directory unless configured otherwise.
///
/// # Examples
///
/// ```
/// use plugmgr_paths::data_dir;
///
/// assert!(data_dir().ends_with("plugmgr"));
/// ```
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME"),
        dirs::home_dir(),
        Path::new(".local/share"),
    )
}

/// Default working directory for the package tool.
pub fn packages_dir() -> PathBuf {
    data_dir().join("packages")
}

fn resolve(xdg: Option<OsString>, home: Option<PathBuf>, home_relative: &Path) -> PathBuf {
    match (xdg.filter(|v| !v.is_empty()), home) {
        (Some(xdg), _) => PathBuf::from(xdg).join(APP_DIR),
        (None, Some(home)) => home.join(home_relative).join(APP_DIR),
        (None, None) => home_relative.join(APP_DIR),
    }
}
