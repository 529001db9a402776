mod config;
mod error;

pub use config::{
    APP_NAME, AppConfig, AppConfigExt, CopyHotkey, CopyLayout, HotkeySettings, SortColumn,
    SortDirection, WindowSettings, app_dir,
};
pub use error::ConfigError;
