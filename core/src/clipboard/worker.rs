use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tally_types::CopyLayout;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Clipboard, ClipboardError, TextInjector};
use crate::service::Frame;

#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardJob {
    /// Read the clipboard and inject it into the focused input
    Paste,
    /// Export the latest frame, write it, read it back, then paste it
    Copy(CopyLayout),
    Shutdown,
}

/// Cheap, cloneable sender for clipboard jobs. Never blocks.
#[derive(Debug, Clone)]
pub struct ClipboardHandle {
    tx: mpsc::Sender<ClipboardJob>,
}

impl ClipboardHandle {
    pub fn paste(&self) -> Result<(), ClipboardError> {
        self.submit(ClipboardJob::Paste)
    }

    pub fn copy(&self, layout: CopyLayout) -> Result<(), ClipboardError> {
        self.submit(ClipboardJob::Copy(layout))
    }

    fn submit(&self, job: ClipboardJob) -> Result<(), ClipboardError> {
        self.tx.send(job).map_err(|_| ClipboardError::WorkerStopped)
    }
}

/// The single thread that owns the clipboard. Jobs run one at a time in
/// submission order.
pub struct ClipboardWorker {
    handle: ClipboardHandle,
    thread: Option<JoinHandle<()>>,
}

impl ClipboardWorker {
    /// Start the worker. `make_clipboard` runs on the worker thread, since
    /// some platforms tie clipboard ownership to the creating thread.
    pub fn spawn<F>(
        make_clipboard: F,
        injector: Box<dyn TextInjector>,
        frames: watch::Receiver<Arc<Frame>>,
    ) -> std::io::Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn Clipboard>, ClipboardError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("clipboard".to_string())
            .spawn(move || {
                let clipboard = match make_clipboard() {
                    Ok(c) => Some(c),
                    Err(e) => {
                        warn!(error = %e, "Clipboard unavailable, copy and paste hotkeys disabled");
                        None
                    }
                };
                run(clipboard, injector, frames, rx);
            })?;

        Ok(Self {
            handle: ClipboardHandle { tx },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> ClipboardHandle {
        self.handle.clone()
    }

    /// Finish queued jobs and stop the thread.
    pub fn shutdown(&mut self) {
        let _ = self.handle.submit(ClipboardJob::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("Clipboard worker panicked");
        }
    }
}

impl Drop for ClipboardWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    mut clipboard: Option<Box<dyn Clipboard>>,
    mut injector: Box<dyn TextInjector>,
    frames: watch::Receiver<Arc<Frame>>,
    rx: mpsc::Receiver<ClipboardJob>,
) {
    while let Ok(job) = rx.recv() {
        let Some(clipboard) = clipboard.as_deref_mut() else {
            if job == ClipboardJob::Shutdown {
                break;
            }
            warn!(?job, "Skipping clipboard job, clipboard unavailable");
            continue;
        };

        let result = match job {
            ClipboardJob::Shutdown => break,
            ClipboardJob::Paste => paste(clipboard, injector.as_mut()),
            ClipboardJob::Copy(layout) => {
                let frame = frames.borrow().clone();
                copy_then_paste(clipboard, injector.as_mut(), &frame.export(&layout))
            }
        };

        // Contention is transient; the user can press the hotkey again
        if let Err(e) = result {
            warn!(error = %e, "Clipboard job failed");
        }
    }
    debug!("Clipboard worker stopped");
}

fn paste(clipboard: &mut dyn Clipboard, injector: &mut dyn TextInjector) -> Result<(), ClipboardError> {
    let text = clipboard.get_text()?;
    injector.inject(&text)
}

fn copy_then_paste(
    clipboard: &mut dyn Clipboard,
    injector: &mut dyn TextInjector,
    text: &str,
) -> Result<(), ClipboardError> {
    clipboard.set_text(text)?;
    let confirmed = clipboard.get_text()?;
    info!(text = %confirmed, "Copied stats to clipboard");
    injector.inject(&confirmed)
}
