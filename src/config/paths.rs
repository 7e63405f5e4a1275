use std::path::PathBuf;
use tracing::{debug, warn};

use crate::types::ShellError;

use super::Config;

impl Config {
    /// Get the root directory of the application
    pub fn app_root_dir() -> Result<PathBuf, ShellError> {
        let config_path = get_config_path()?;
        match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
            Some(_) => std::env::current_dir().map_err(|err| {
                ShellError::Config(format!("Failed to determine app root: {err}"))
            }),
            None => Err(ShellError::Config(
                "Unable to determine app root directory".to_string(),
            )),
        }
    }

    /// Location of config.json
    pub fn config_path() -> Result<PathBuf, ShellError> {
        get_config_path()
    }

    /// Path of the lock file that keeps the shell single-instance
    pub fn instance_lock_path() -> Result<PathBuf, ShellError> {
        Ok(Self::app_root_dir()?.join("fileassist-shell.lock"))
    }
}

/// Get the path to the config.json file
/// Looks for config.json in the app directory (parent of the bin folder)
pub(super) fn get_config_path() -> Result<PathBuf, ShellError> {
    // Executable is at: app_root/bin/fileassist-shell
    // Config should be at: app_root/config.json
    if let Ok(exe_path) = std::env::current_exe() {
        debug!(path = %exe_path.display(), "Executable path detected");

        if let Some(app_root) = exe_path.parent().and_then(|bin_dir| bin_dir.parent()) {
            let config_path = app_root.join("config.json");
            debug!(path = %config_path.display(), "Looking for config");
            return Ok(config_path);
        }
    }

    warn!("Using fallback: looking for config.json in current directory");
    Ok(PathBuf::from("config.json"))
}
