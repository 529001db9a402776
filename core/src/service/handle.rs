use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, watch};

use super::frame::Frame;
use super::state::Focus;
use super::{ServiceCommand, ServiceError, TaggedSnapshot};
use crate::snapshot::Snapshot;

// ─────────────────────────────────────────────────────────────────────────────
// Service Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to the presentation service. Every method is non-blocking and safe
/// to call from any thread, including the keyboard hook.
#[derive(Clone)]
pub struct ServiceHandle {
    pub(super) cmd_tx: mpsc::UnboundedSender<ServiceCommand>,
    pub(super) snapshot_tx: Arc<watch::Sender<Option<TaggedSnapshot>>>,
    pub(super) frames: watch::Receiver<Arc<Frame>>,
    pub(super) epoch: Arc<AtomicU64>,
}

impl ServiceHandle {
    fn send(&self, cmd: ServiceCommand) -> Result<(), ServiceError> {
        self.cmd_tx.send(cmd).map_err(|_| ServiceError::Stopped)
    }

    /// Hand over the newest tick. An unprocessed older tick is replaced.
    pub fn push_snapshot(&self, snapshot: Snapshot) -> Result<(), ServiceError> {
        if self.snapshot_tx.is_closed() {
            return Err(ServiceError::Stopped);
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.snapshot_tx.send_replace(Some(TaggedSnapshot {
            epoch,
            snapshot: Arc::new(snapshot),
        }));
        Ok(())
    }

    /// Reset requested locally (hotkey or user). The aggregator is told as well.
    pub fn reset_session(&self) -> Result<(), ServiceError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(ServiceCommand::Reset {
            epoch,
            notify_upstream: true,
        })
    }

    /// Reset reported by the aggregator.
    pub fn on_session_reset(&self) -> Result<(), ServiceError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(ServiceCommand::Reset {
            epoch,
            notify_upstream: false,
        })
    }

    pub fn set_focus(&self, game: bool, meter: bool) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Focus(Focus { game, meter }))
    }

    /// User picked entry `index` of the encounter list (0 is the aggregate).
    pub fn select_encounter(&self, index: usize) -> Result<(), ServiceError> {
        self.send(ServiceCommand::SelectEncounter(index))
    }

    pub fn toggle_timed(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::ToggleTimed)
    }

    pub fn toggle_invisible_when_idle(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::ToggleInvisibleWhenIdle)
    }

    pub fn toggle_always_visible(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::ToggleAlwaysVisible)
    }

    pub fn connected(&self, server: impl Into<String>) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Connected(server.into()))
    }

    pub fn shutdown(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Shutdown)
    }

    /// Subscribe to published frames.
    pub fn frames(&self) -> watch::Receiver<Arc<Frame>> {
        self.frames.clone()
    }

    pub fn latest_frame(&self) -> Arc<Frame> {
        self.frames.borrow().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}
