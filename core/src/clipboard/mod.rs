//! System clipboard access
//!
//! The clipboard is a single shared OS resource. Every read and write goes
//! through the [`ClipboardWorker`] thread; nothing else holds a [`Clipboard`].

mod worker;

use std::sync::{Arc, Mutex};

use thiserror::Error;

pub use worker::{ClipboardHandle, ClipboardJob, ClipboardWorker};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard not available: {0}")]
    Unavailable(String),

    #[error("failed to read clipboard: {0}")]
    Read(String),

    #[error("failed to write clipboard: {0}")]
    Write(String),

    #[error("failed to inject text: {0}")]
    Inject(String),

    #[error("clipboard worker stopped")]
    WorkerStopped,
}

pub trait Clipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError>;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Types text into whatever input currently has focus.
pub trait TextInjector: Send {
    fn inject(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner = arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        self.inner
            .get_text()
            .map_err(|e| ClipboardError::Read(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    text: Option<String>,
    fail_writes: bool,
}

/// In-process clipboard for headless runs. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.text.clone())
    }

    /// Make subsequent writes fail, as if another process held the clipboard.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = fail;
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        let state = self
            .state
            .lock()
            .map_err(|_| ClipboardError::Read("poisoned".to_string()))?;
        state
            .text
            .clone()
            .ok_or_else(|| ClipboardError::Read("clipboard is empty".to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ClipboardError::Write("poisoned".to_string()))?;
        if state.fail_writes {
            return Err(ClipboardError::Write("clipboard is locked".to_string()));
        }
        state.text = Some(text.to_string());
        Ok(())
    }
}
