use thiserror::Error;

use super::combo::KeyCombo;

/// Errors from parsing a combo string such as `"Ctrl+Shift+F5"`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyParseError {
    #[error("empty hotkey")]
    Empty,

    #[error("invalid hotkey '{combo}': {reason}")]
    Invalid { combo: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("hotkey {combo} is already registered by {owner}")]
    AlreadyOwned { combo: KeyCombo, owner: String },

    #[error("hotkey {combo} is already bound by another group")]
    DuplicateBinding { combo: KeyCombo },

    #[error(transparent)]
    InvalidCombo(#[from] HotkeyParseError),

    #[error("failed to register hotkey {combo}: {message}")]
    Os { combo: KeyCombo, message: String },

    #[error("hotkey backend is not running")]
    BackendUnavailable,

    #[error("global hotkeys unavailable: {0}")]
    ManagerUnavailable(String),
}
