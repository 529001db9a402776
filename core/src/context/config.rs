//! Application configuration
//!
//! Re-exports the shared types from tally-types and adds TOML persistence
//! through confy.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::error::ConfigError;
pub use tally_types::{
    AppConfig, CopyHotkey, CopyLayout, HotkeySettings, SortColumn, SortDirection, WindowSettings,
};

pub const APP_NAME: &str = "tally";
const CONFIG_NAME: &str = "config";

/// Per-user directory for logs and crash reports.
pub fn app_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    /// Load from the default location, falling back to defaults on any error.
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
    fn path() -> Result<PathBuf, ConfigError>;
}

impl AppConfigExt for AppConfig {
    fn load() -> Self {
        match confy::load(APP_NAME, CONFIG_NAME) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Creates the file with defaults if it does not exist.
    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        confy::load_path(path).map_err(ConfigError::Load)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self.clone()).map_err(ConfigError::Save)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self.clone()).map_err(ConfigError::Save)
    }

    fn path() -> Result<PathBuf, ConfigError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).map_err(ConfigError::NoConfigDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_saved_hotkeys_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.hotkeys.paste = Some("Ctrl+Shift+F5".to_string());
        config.hotkeys.copy.push(CopyHotkey {
            keys: "Alt+Insert".to_string(),
            layout: CopyLayout {
                order_by: SortColumn::Name,
                order: SortDirection::Ascending,
                ..CopyLayout::default()
            },
        });
        config.window.invisible_when_idle = true;
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "window = [not toml").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Load(_))));
    }
}
