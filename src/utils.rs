use std::path::{Path, PathBuf};

use crate::constants::HISTORY_CACHE_FILE;

const APP_DIR_NAME: &str = "SmartMap";

fn env_dir(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Base directory the OS reserves for per-user application data.
fn platform_data_root() -> PathBuf {
    let home = || env_dir("HOME").unwrap_or_else(|| PathBuf::from("."));
    match std::env::consts::OS {
        "macos" => home().join("Library/Application Support"),
        "windows" => env_dir("APPDATA").unwrap_or_else(|| PathBuf::from(".")),
        _ => env_dir("XDG_DATA_HOME").unwrap_or_else(|| home().join(".local/share")),
    }
}

/// Where the history cache and other service state live.
pub fn get_app_data_dir() -> PathBuf {
    platform_data_root().join(APP_DIR_NAME)
}

/// Ensures the directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<(), std::io::Error> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Returns the path to the history cache file
pub fn get_history_cache_path() -> PathBuf {
    get_app_data_dir().join(HISTORY_CACHE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_cache_lives_in_app_dir() {
        let path = get_history_cache_path();
        assert!(path.ends_with(Path::new(APP_DIR_NAME).join(HISTORY_CACHE_FILE)));
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("smartmap-dir-{}", std::process::id()));
        ensure_directory_exists(&dir).expect("create");
        ensure_directory_exists(&dir).expect("create again");
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
