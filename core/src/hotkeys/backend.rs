//! Hotkey registration backend and the keyboard hook threads.
//!
//! [`KeyboardHook`] owns the dispatch thread. Key-downs reach it either from
//! the OS event pump ([`KeyboardHook::listen_os_events`]) or from
//! [`KeyboardHook::key_down`], and only combos the backend currently holds are
//! forwarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use global_hotkey::{GlobalHotKeyEvent, HotKeyState};
use tracing::{debug, warn};

use super::combo::KeyCombo;
use super::error::RegistrationError;

pub type HotkeyId = u32;

/// OS-facing registration. Calls are synchronous and succeed or fail immediately.
pub trait HotkeyBackend: Send + Sync {
    fn register(&self, combo: KeyCombo) -> Result<HotkeyId, RegistrationError>;

    /// Returns false if `id` was not registered.
    fn unregister(&self, id: HotkeyId) -> bool;

    /// Id of this process' registration for `combo`, if any.
    fn lookup(&self, combo: &KeyCombo) -> Option<HotkeyId>;

    /// Combo registered under `id`.
    fn combo(&self, id: HotkeyId) -> Option<KeyCombo>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboard hook
// ─────────────────────────────────────────────────────────────────────────────

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Dedicated hook threads. Key-downs for unregistered combos are dropped.
pub struct KeyboardHook {
    backend: Arc<dyn HotkeyBackend>,
    tx: Option<mpsc::Sender<KeyCombo>>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl KeyboardHook {
    pub fn spawn<F>(backend: Arc<dyn HotkeyBackend>, on_hotkey: F) -> std::io::Result<Self>
    where
        F: Fn(KeyCombo) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<KeyCombo>();
        let lookup = Arc::clone(&backend);
        let thread = thread::Builder::new()
            .name("keyboard-hook".to_string())
            .spawn(move || {
                while let Ok(combo) = rx.recv() {
                    if lookup.lookup(&combo).is_some() {
                        on_hotkey(combo);
                    }
                }
                debug!("Keyboard hook stopped");
            })?;

        Ok(Self {
            backend,
            tx: Some(tx),
            stop: Arc::new(AtomicBool::new(false)),
            threads: vec![thread],
        })
    }

    /// Forward `Pressed` events from the global hotkey receiver.
    pub fn listen_os_events(&mut self) -> std::io::Result<()> {
        let Some(tx) = self.tx.clone() else {
            return Ok(());
        };
        let backend = Arc::clone(&self.backend);
        let stop = Arc::clone(&self.stop);

        let thread = thread::Builder::new()
            .name("hotkey-events".to_string())
            .spawn(move || {
                let events = GlobalHotKeyEvent::receiver();
                while !stop.load(Ordering::SeqCst) {
                    let Ok(event) = events.recv_timeout(EVENT_POLL) else {
                        continue;
                    };
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }
                    match backend.combo(event.id) {
                        Some(combo) => {
                            if tx.send(combo).is_err() {
                                break;
                            }
                        }
                        None => debug!(id = event.id, "Hotkey event for unknown id"),
                    }
                }
                debug!("Hotkey event pump stopped");
            })?;

        self.threads.push(thread);
        Ok(())
    }

    /// Feed a key-down event into the hook.
    pub fn key_down(&self, combo: KeyCombo) -> bool {
        match &self.tx {
            Some(tx) => tx.send(combo).is_ok(),
            None => false,
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.tx = None;
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                warn!("Keyboard hook thread panicked");
            }
        }
    }
}

impl Drop for KeyboardHook {
    fn drop(&mut self) {
        self.stop();
    }
}
