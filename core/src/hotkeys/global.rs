//! OS hotkey registration through `global-hotkey`.
//!
//! The manager is not `Send` on every platform, so it lives on its own thread
//! and registration calls are forwarded to it and answered synchronously.

use std::sync::{Mutex, mpsc};
use std::thread;

use global_hotkey::GlobalHotKeyManager;
use global_hotkey::hotkey::HotKey;
use hashbrown::HashMap;
use tracing::{debug, warn};

use super::backend::{HotkeyBackend, HotkeyId};
use super::combo::KeyCombo;
use super::error::RegistrationError;

type Reply = mpsc::Sender<Result<(), global_hotkey::Error>>;

enum ManagerRequest {
    Register(HotKey, Reply),
    Unregister(HotKey, Reply),
}

/// Hotkeys registered with the OS. Ids are the ids `GlobalHotKeyEvent`
/// reports, so events resolve straight back to a combo.
pub struct GlobalHotkeyBackend {
    tx: mpsc::Sender<ManagerRequest>,
    registered: Mutex<HashMap<HotkeyId, KeyCombo>>,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self, RegistrationError> {
        let (tx, rx) = mpsc::channel::<ManagerRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("hotkey-manager".to_string())
            .spawn(move || {
                let manager = match GlobalHotKeyManager::new() {
                    Ok(manager) => manager,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                while let Ok(request) = rx.recv() {
                    match request {
                        ManagerRequest::Register(hotkey, reply) => {
                            let _ = reply.send(manager.register(hotkey));
                        }
                        ManagerRequest::Unregister(hotkey, reply) => {
                            let _ = reply.send(manager.unregister(hotkey));
                        }
                    }
                }
                debug!("Hotkey manager stopped");
            })
            .map_err(|e| RegistrationError::ManagerUnavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx,
                registered: Mutex::new(HashMap::new()),
            }),
            Ok(Err(message)) => Err(RegistrationError::ManagerUnavailable(message)),
            Err(_) => Err(RegistrationError::BackendUnavailable),
        }
    }

    fn call(
        &self,
        request: impl FnOnce(Reply) -> ManagerRequest,
    ) -> Result<Result<(), global_hotkey::Error>, RegistrationError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(request(reply_tx))
            .map_err(|_| RegistrationError::BackendUnavailable)?;
        reply_rx
            .recv()
            .map_err(|_| RegistrationError::BackendUnavailable)
    }
}

fn registration_error(combo: KeyCombo, error: global_hotkey::Error) -> RegistrationError {
    match error {
        global_hotkey::Error::AlreadyRegistered(_) => RegistrationError::AlreadyOwned {
            combo,
            owner: "another application".to_string(),
        },
        e => RegistrationError::Os {
            combo,
            message: e.to_string(),
        },
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&self, combo: KeyCombo) -> Result<HotkeyId, RegistrationError> {
        let mut registered = self
            .registered
            .lock()
            .map_err(|_| RegistrationError::BackendUnavailable)?;

        self.call(|reply| ManagerRequest::Register(combo.hotkey(), reply))?
            .map_err(|e| registration_error(combo, e))?;

        registered.insert(combo.id(), combo);
        debug!(hotkey = %combo, id = combo.id(), "Registered OS hotkey");
        Ok(combo.id())
    }

    fn unregister(&self, id: HotkeyId) -> bool {
        let Ok(mut registered) = self.registered.lock() else {
            return false;
        };
        let Some(combo) = registered.remove(&id) else {
            return false;
        };

        match self.call(|reply| ManagerRequest::Unregister(combo.hotkey(), reply)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(hotkey = %combo, error = %e, "Failed to unregister OS hotkey"),
            Err(e) => warn!(hotkey = %combo, error = %e, "Failed to unregister OS hotkey"),
        }
        true
    }

    fn lookup(&self, combo: &KeyCombo) -> Option<HotkeyId> {
        let registered = self.registered.lock().ok()?;
        registered.contains_key(&combo.id()).then(|| combo.id())
    }

    fn combo(&self, id: HotkeyId) -> Option<KeyCombo> {
        self.registered.lock().ok()?.get(&id).copied()
    }
}
