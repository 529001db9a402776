//! Global hotkeys
//!
//! Combos are registered per [`BindingGroup`] through a [`HotkeyBackend`]; a
//! failing group never takes down bindings of another group. Triggers arrive
//! on the [`KeyboardHook`] thread and are handed to an [`ActionSink`] without
//! doing any work inline.

mod backend;
mod combo;
mod dispatcher;
mod error;
mod global;

#[cfg(test)]
mod table;

pub use backend::{HotkeyBackend, HotkeyId, KeyboardHook};
pub use combo::KeyCombo;
pub use dispatcher::{
    ActionSink, BindingGroup, HotkeyAction, HotkeyBinding, HotkeyDispatcher, bindings_for,
};
pub use error::{HotkeyParseError, RegistrationError};
pub use global::GlobalHotkeyBackend;
#[cfg(test)]
pub use table::HotkeyTable;
