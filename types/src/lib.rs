//! Shared configuration types for Tally
//!
//! This crate contains serializable configuration types that are shared between
//! the reconciliation core (tally-core) and the command-line front end.

use serde::{Deserialize, Serialize};

pub mod formatting;

// ─────────────────────────────────────────────────────────────────────────────
// Copy Layouts
// ─────────────────────────────────────────────────────────────────────────────

/// Column used to order rows when exporting stats as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Damage,
    Dps,
    DamagePercentage,
    CritRate,
    HitsReceived,
    Name,
}

/// Direction applied to [`SortColumn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Text layout used by a copy hotkey.
///
/// `header` and `footer` are emitted once, `content` once per ranked row.
/// Placeholders are substituted by the exporter (`{name}`, `{dps}`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyLayout {
    pub header: String,
    pub content: String,
    pub footer: String,
    pub order_by: SortColumn,
    pub order: SortDirection,
}

impl Default for CopyLayout {
    fn default() -> Self {
        Self {
            header: "{encounter} {duration} | ".to_string(),
            content: "{name} {dps}/s {damage_percentage} | ".to_string(),
            footer: "Party {party_dps}/s".to_string(),
            order_by: SortColumn::Damage,
            order: SortDirection::Descending,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hotkeys
// ─────────────────────────────────────────────────────────────────────────────

/// A copy hotkey: key combination plus the layout it exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyHotkey {
    pub keys: String,
    #[serde(default)]
    pub layout: CopyLayout,
}

/// Global hotkey configuration.
///
/// Combinations use the `Modifier+Key` form, e.g. `"Ctrl+Shift+F5"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeySettings {
    pub paste: Option<String>,
    pub reset: Option<String>,
    pub copy: Vec<CopyHotkey>,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            paste: Some("Ctrl+Alt+V".to_string()),
            reset: Some("Ctrl+Alt+R".to_string()),
            copy: vec![CopyHotkey {
                keys: "Ctrl+Alt+C".to_string(),
                layout: CopyLayout::default(),
            }],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window
// ─────────────────────────────────────────────────────────────────────────────

/// User toggles that drive meter visibility and crash reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Keep the meter visible regardless of focus and roster state
    pub always_visible: bool,
    /// Hide the meter while no participant has stats
    pub invisible_when_idle: bool,
    /// Send crash bundles to `crash_report_url`
    pub remote_crash_reports: bool,
    pub crash_report_url: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub hotkeys: HotkeySettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[window]
invisible_when_idle = true

[hotkeys]
paste = "Alt+Insert"

[[hotkeys.copy]]
keys = "Ctrl+Shift+C"

[hotkeys.copy.layout]
content = "{name}: {dps}\n"
order_by = "dps"
order = "ascending"
"#;

        let config: AppConfig = toml::from_str(toml).unwrap();
        assert!(config.window.invisible_when_idle);
        assert!(!config.window.always_visible);
        assert_eq!(config.hotkeys.paste.as_deref(), Some("Alt+Insert"));
        // Unspecified fields fall back to defaults
        assert_eq!(config.hotkeys.reset.as_deref(), Some("Ctrl+Alt+R"));
        assert_eq!(config.hotkeys.copy.len(), 1);

        let layout = &config.hotkeys.copy[0].layout;
        assert_eq!(layout.order_by, SortColumn::Dps);
        assert_eq!(layout.order, SortDirection::Ascending);
        assert_eq!(layout.header, CopyLayout::default().header);
    }

    #[test]
    fn test_copy_hotkey_without_layout_uses_default() {
        let toml = r#"
[[copy]]
keys = "Ctrl+Alt+D"
"#;
        let hotkeys: HotkeySettings = toml::from_str(toml).unwrap();
        assert_eq!(hotkeys.copy[0].layout, CopyLayout::default());
    }
}
