use tracing::warn;

use super::ServiceHandle;
use crate::clipboard::ClipboardHandle;
use crate::hotkeys::{ActionSink, HotkeyAction};

/// Routes hotkey actions to the clipboard worker and the presentation service.
pub struct ActionRouter {
    clipboard: ClipboardHandle,
    service: ServiceHandle,
}

impl ActionRouter {
    pub fn new(clipboard: ClipboardHandle, service: ServiceHandle) -> Self {
        Self { clipboard, service }
    }
}

impl ActionSink for ActionRouter {
    fn dispatch(&self, action: HotkeyAction) {
        let result = match action {
            HotkeyAction::Paste => self.clipboard.paste().map_err(|e| e.to_string()),
            HotkeyAction::Copy(layout) => self.clipboard.copy(layout).map_err(|e| e.to_string()),
            HotkeyAction::Reset => self.service.reset_session().map_err(|e| e.to_string()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Hotkey action dropped");
        }
    }
}
