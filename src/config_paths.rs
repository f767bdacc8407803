//! Where milord keeps its files
//!
//! Everything lives in one directory:
//! - `MILORD_CONFIG_DIR` if set (tests, portable installs)
//! - else `$XDG_CONFIG_HOME/milord` or `~/.config/milord` on Unix/macOS
//! - else `%APPDATA%\milord` on Windows
//!
//! ```text
//! milord/
//!   config.yaml        highlighter order and flags, dictionary path
//!   dictionary.txt     default spell-check word list
//!   logs/milord.log.*  daily rotated debug log
//! ```

use std::{env, fs, path::PathBuf};

const APP_DIR: &str = "milord";

/// Environment override for the whole directory
pub const CONFIG_DIR_ENV: &str = "MILORD_CONFIG_DIR";

/// File name prefix of the rotated log files
pub const LOG_FILE_PREFIX: &str = "milord.log";

/// Platform config root, before the app directory is appended
fn platform_config_root() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        env::var_os("APPDATA").map(PathBuf::from)
    } else {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
    }
}

/// Base directory for all milord files
pub fn config_dir() -> Option<PathBuf> {
    match env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => platform_config_root().map(|root| root.join(APP_DIR)),
    }
}

fn in_config_dir(name: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(name))
}

pub fn config_file() -> Option<PathBuf> {
    in_config_dir("config.yaml")
}

/// Word list used when the config names none
pub fn dictionary_file() -> Option<PathBuf> {
    in_config_dir("dictionary.txt")
}

pub fn logs_dir() -> Option<PathBuf> {
    in_config_dir("logs")
}

fn create_dir(path: PathBuf) -> Result<PathBuf, String> {
    fs::create_dir_all(&path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))?;
    Ok(path)
}

/// Create the base directory if needed, returning it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    create_dir(config_dir().ok_or_else(|| "No config directory available".to_string())?)
}

/// Create the logs directory if needed, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    create_dir(ensure_config_dir()?.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_share_the_base_dir() {
        let Some(dir) = config_dir() else {
            return; // No home directory in this environment
        };
        assert_eq!(config_file().unwrap().parent(), Some(dir.as_path()));
        assert_eq!(dictionary_file().unwrap().parent(), Some(dir.as_path()));
        assert!(logs_dir().unwrap().starts_with(&dir));
    }
}
