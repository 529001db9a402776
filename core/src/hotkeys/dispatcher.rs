//! Hotkey registration by group and dispatch of triggered actions.

use std::sync::{Arc, Mutex};

use tally_types::{CopyLayout, HotkeySettings};
use tracing::{info, warn};

use super::backend::{HotkeyBackend, HotkeyId};
use super::combo::KeyCombo;
use super::error::RegistrationError;

/// Bindings that register and fail together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingGroup {
    PasteReset,
    Copy,
}

impl std::fmt::Display for BindingGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingGroup::PasteReset => f.pad("paste/reset"),
            BindingGroup::Copy => f.pad("copy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HotkeyAction {
    /// Inject the clipboard text into the focused input
    Paste,
    /// Clear the session's roster and encounter list
    Reset,
    /// Export the current frame with this layout, then paste it
    Copy(CopyLayout),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotkeyBinding {
    pub combo: KeyCombo,
    pub action: HotkeyAction,
}

impl HotkeyBinding {
    pub fn new(combo: KeyCombo, action: HotkeyAction) -> Self {
        Self { combo, action }
    }
}

/// Receives triggered actions. Called on the hook thread, so it must not block.
pub trait ActionSink: Send + Sync {
    fn dispatch(&self, action: HotkeyAction);
}

#[derive(Debug, Clone)]
struct Installed {
    group: BindingGroup,
    id: HotkeyId,
    binding: HotkeyBinding,
}

pub struct HotkeyDispatcher {
    backend: Arc<dyn HotkeyBackend>,
    installed: Mutex<Vec<Installed>>,
    sink: Arc<dyn ActionSink>,
}

impl HotkeyDispatcher {
    pub fn new(backend: Arc<dyn HotkeyBackend>, sink: Arc<dyn ActionSink>) -> Self {
        Self {
            backend,
            installed: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Register every binding of `group`, or none of them.
    ///
    /// A failure rolls back only what this call installed; other groups keep
    /// their registrations and the group's previous bindings are restored.
    /// Bindings sharing a combo within the group share one registration and
    /// all fire on trigger. Registering a group again replaces its previous
    /// bindings.
    pub fn register_group(
        &self,
        group: BindingGroup,
        bindings: Vec<HotkeyBinding>,
    ) -> Result<(), RegistrationError> {
        let mut installed = match self.installed.lock() {
            Ok(i) => i,
            Err(_) => return Err(RegistrationError::BackendUnavailable),
        };
        let previous: Vec<HotkeyBinding> = installed
            .iter()
            .filter(|i| i.group == group)
            .map(|i| i.binding.clone())
            .collect();
        self.unregister_where(&mut installed, |i| i.group == group);

        match self.install(group, bindings, &installed) {
            Ok(added) => {
                for i in &added {
                    info!(hotkey = %i.binding.combo, group = %group, "Registered hotkey");
                }
                installed.extend(added);
                Ok(())
            }
            Err(e) => {
                if !previous.is_empty() {
                    match self.install(group, previous, &installed) {
                        Ok(restored) => installed.extend(restored),
                        Err(restore) => {
                            warn!(error = %restore, group = %group, "Failed to restore previous hotkeys")
                        }
                    }
                }
                Err(e)
            }
        }
    }

    fn install(
        &self,
        group: BindingGroup,
        bindings: Vec<HotkeyBinding>,
        installed: &[Installed],
    ) -> Result<Vec<Installed>, RegistrationError> {
        let mut added: Vec<Installed> = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if installed.iter().any(|i| i.binding.combo == binding.combo) {
                self.rollback(&added);
                return Err(RegistrationError::DuplicateBinding {
                    combo: binding.combo,
                });
            }

            let shared = added
                .iter()
                .find(|i| i.binding.combo == binding.combo)
                .map(|i| i.id);
            let id = match shared {
                Some(id) => id,
                None => match self.backend.register(binding.combo) {
                    Ok(id) => id,
                    Err(e) => {
                        self.rollback(&added);
                        return Err(e);
                    }
                },
            };
            added.push(Installed { group, id, binding });
        }
        Ok(added)
    }

    /// Route a key-down to every matching binding. Returns how many fired.
    pub fn on_key_down(&self, combo: KeyCombo) -> usize {
        let actions: Vec<HotkeyAction> = {
            let installed = match self.installed.lock() {
                Ok(i) => i,
                Err(_) => return 0,
            };
            installed
                .iter()
                .filter(|i| i.binding.combo == combo)
                .map(|i| i.binding.action.clone())
                .collect()
        };

        for action in &actions {
            self.sink.dispatch(action.clone());
        }
        actions.len()
    }

    /// Unregister everything. Safe after partial registration and when called twice.
    pub fn dispose(&self) {
        if let Ok(mut installed) = self.installed.lock() {
            self.unregister_where(&mut installed, |_| true);
        }
    }

    /// Dispose all bindings and register both groups from `settings`.
    ///
    /// Returns the groups that failed. Each failure is logged once, and a
    /// failed group stays empty until the next rebind.
    pub fn rebind(&self, settings: &HotkeySettings) -> Vec<(BindingGroup, RegistrationError)> {
        self.dispose();

        let mut failures = Vec::new();
        for group in [BindingGroup::PasteReset, BindingGroup::Copy] {
            let result = bindings_for(group, settings).and_then(|b| {
                if b.is_empty() {
                    return Ok(());
                }
                self.register_group(group, b)
            });
            if let Err(e) = result {
                warn!(error = %e, group = %group, "Failed to register hotkey group");
                failures.push((group, e));
            }
        }
        failures
    }

    pub fn bound_combos(&self) -> Vec<(BindingGroup, KeyCombo)> {
        match self.installed.lock() {
            Ok(installed) => installed.iter().map(|i| (i.group, i.binding.combo)).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn rollback(&self, added: &[Installed]) {
        let mut ids: Vec<HotkeyId> = added.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        for id in ids {
            self.backend.unregister(id);
        }
    }

    fn unregister_where(&self, installed: &mut Vec<Installed>, pred: impl Fn(&Installed) -> bool) {
        let mut ids: Vec<HotkeyId> = Vec::new();
        installed.retain(|i| {
            if pred(i) {
                if !ids.contains(&i.id) {
                    ids.push(i.id);
                }
                false
            } else {
                true
            }
        });
        for id in ids {
            if !self.backend.unregister(id) {
                warn!(id, "Hotkey was not registered at dispose time");
            }
        }
    }
}

impl Drop for HotkeyDispatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Build the bindings of `group` from config strings.
pub fn bindings_for(
    group: BindingGroup,
    settings: &HotkeySettings,
) -> Result<Vec<HotkeyBinding>, RegistrationError> {
    let mut bindings = Vec::new();
    match group {
        BindingGroup::PasteReset => {
            if let Some(keys) = &settings.paste {
                bindings.push(HotkeyBinding::new(keys.parse()?, HotkeyAction::Paste));
            }
            if let Some(keys) = &settings.reset {
                bindings.push(HotkeyBinding::new(keys.parse()?, HotkeyAction::Reset));
            }
        }
        BindingGroup::Copy => {
            for copy in &settings.copy {
                bindings.push(HotkeyBinding::new(
                    copy.keys.parse()?,
                    HotkeyAction::Copy(copy.layout.clone()),
                ));
            }
        }
    }
    Ok(bindings)
}
