use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::settings::{Settings, SettingsCascade};

/// Default bound on a single provider call in milliseconds
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 3000;

const APP_NAME: &str = "codeintel-lsp";

/// Returns the path to the data directory for codeintel-lsp.
/// Uses $XDG_DATA_HOME/codeintel-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/codeintel-lsp,
/// or ./codeintel-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the configuration directory, following the same
/// fallback order as [`data_dir`] with $XDG_CONFIG_HOME and ~/.config.
pub fn config_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(format!("{}.log", APP_NAME))
}

/// Returns the path to the default settings file.
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, home_relative: &str) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(home_relative)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME)
}

/// Reads a settings file into a snapshot.
///
/// A missing file yields empty, valid settings. An unreadable or malformed
/// file yields a snapshot carrying the error, which the bootstrapper rejects.
pub fn load_settings(path: &Path) -> SettingsCascade {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No settings file at {:?}, using defaults", path);
            return SettingsCascade::valid(Settings::new());
        }
        Err(e) => {
            warn!("Failed to read settings file {:?}: {}", path, e);
            return SettingsCascade::with_error(format!("{}: {}", path.display(), e));
        }
    };

    let value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse settings file {:?}: {}", path, e);
            return SettingsCascade::with_error(format!("{}: {}", path.display(), e));
        }
    };

    match Settings::from_json(value) {
        Some(settings) => {
            info!("Loaded settings from {:?}", path);
            SettingsCascade::valid(settings)
        }
        None => SettingsCascade::with_error(format!(
            "{}: settings must be a JSON object",
            path.display()
        )),
    }
}
