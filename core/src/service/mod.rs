//! Presentation service
//!
//! One tokio task owns the roster, encounter list and selection. Snapshots
//! arrive through a `watch` slot so only the newest unprocessed tick is ever
//! reconciled; commands arrive on an unbounded queue so senders never block.
//! Every reset bumps a shared epoch before it is queued, and any tick tagged
//! with an older epoch is discarded even if it finishes after the reset.

mod frame;
mod handle;
mod router;
mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tally_types::WindowSettings;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::snapshot::{Entity, Snapshot};
pub use frame::{Frame, Totals};
pub use handle::ServiceHandle;
pub use router::ActionRouter;
pub use state::Focus;
use state::PresentationState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("presentation service stopped")]
    Stopped,
}

/// Commands sent to the presentation task
#[derive(Debug, Clone)]
pub enum ServiceCommand {
    Reset { epoch: u64, notify_upstream: bool },
    Focus(Focus),
    Connected(String),
    SelectEncounter(usize),
    ToggleTimed,
    ToggleInvisibleWhenIdle,
    ToggleAlwaysVisible,
    Shutdown,
}

/// Requests for the sniffer/aggregator, which owns the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamRequest {
    /// Track a different current boss (`None` = aggregate)
    SwitchEncounter(Option<Entity>),
    SetTimed(bool),
    ResetSession,
}

#[derive(Debug, Clone)]
pub struct TaggedSnapshot {
    pub epoch: u64,
    pub snapshot: Arc<Snapshot>,
}

/// Render collaborator. Called on the presentation task for every published frame.
pub trait RenderSink: Send {
    fn render(&mut self, frame: &Frame);
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub app_name: String,
    pub version: String,
    pub window: WindowSettings,
}

impl ServiceOptions {
    fn title(&self, server: Option<&str>) -> String {
        format!(
            "{} v{}: {}",
            self.app_name,
            self.version,
            server.unwrap_or("No server")
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presentation Service
// ─────────────────────────────────────────────────────────────────────────────

pub struct PresentationService {
    options: ServiceOptions,
    state: PresentationState,
    cmd_rx: mpsc::UnboundedReceiver<ServiceCommand>,
    snapshot_rx: watch::Receiver<Option<TaggedSnapshot>>,
    frame_tx: watch::Sender<Arc<Frame>>,
    upstream_tx: mpsc::UnboundedSender<UpstreamRequest>,
    render: Option<Box<dyn RenderSink>>,
    epoch: Arc<AtomicU64>,
}

impl PresentationService {
    /// Create the service, a handle to it, and the receiver for upstream requests.
    pub fn new(
        options: ServiceOptions,
        render: Option<Box<dyn RenderSink>>,
    ) -> (Self, ServiceHandle, mpsc::UnboundedReceiver<UpstreamRequest>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (upstream_tx, upstream_rx) = mpsc::unbounded_channel();

        let state = PresentationState::new(options.window.clone(), options.title(None));
        let (frame_tx, frames) = watch::channel(Arc::new(state.frame().clone()));
        let epoch = Arc::new(AtomicU64::new(0));

        let service = Self {
            options,
            state,
            cmd_rx,
            snapshot_rx,
            frame_tx,
            upstream_tx,
            render,
            epoch: epoch.clone(),
        };
        let handle = ServiceHandle {
            cmd_tx,
            snapshot_tx: Arc::new(snapshot_tx),
            frames,
            epoch,
        };
        (service, handle, upstream_rx)
    }

    /// Create the service and run it on the current tokio runtime.
    pub fn spawn(
        options: ServiceOptions,
        render: Option<Box<dyn RenderSink>>,
    ) -> (ServiceHandle, mpsc::UnboundedReceiver<UpstreamRequest>, JoinHandle<()>) {
        let (service, handle, upstream_rx) = Self::new(options, render);
        let task = tokio::spawn(service.run());
        (handle, upstream_rx, task)
    }

    /// Run the service event loop. Commands are drained before snapshots.
    pub async fn run(mut self) {
        info!("Presentation service started");
        loop {
            tokio::select! {
                biased;

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(ServiceCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },

                changed = self.snapshot_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let tagged = self.snapshot_rx.borrow_and_update().clone();
                    if let Some(tagged) = tagged {
                        self.on_snapshot(tagged);
                    }
                }
            }
        }
        info!("Presentation service stopped");
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn on_snapshot(&mut self, tagged: TaggedSnapshot) {
        if tagged.epoch != self.current_epoch() {
            debug!(epoch = tagged.epoch, "Discarding snapshot from before reset");
            return;
        }

        let prepared = self.state.prepare(&tagged.snapshot, tagged.epoch);

        // A reset may have been requested from another thread while preparing
        if tagged.epoch != self.current_epoch() {
            debug!(epoch = tagged.epoch, "Discarding tick overtaken by reset");
            return;
        }

        let diff = self.state.commit(prepared);
        if !diff.is_empty() {
            debug!(
                admitted = diff.admitted.len(),
                evicted = diff.evicted.len(),
                "Roster changed"
            );
        }
        self.publish();
    }

    fn handle_command(&mut self, cmd: ServiceCommand) {
        match cmd {
            ServiceCommand::Reset {
                epoch,
                notify_upstream,
            } => {
                self.state.reset(epoch);
                if notify_upstream {
                    self.request(UpstreamRequest::ResetSession);
                }
                info!(epoch, "Session reset");
            }
            ServiceCommand::Focus(focus) => {
                self.state.set_focus(focus);
            }
            ServiceCommand::Connected(server) => {
                info!(server = %server, "Connected");
                self.state.set_connected(self.options.title(Some(&server)));
            }
            ServiceCommand::SelectEncounter(index) => {
                if let Some(request) = self.state.select_encounter(index) {
                    self.request(UpstreamRequest::SwitchEncounter(request.0));
                }
            }
            ServiceCommand::ToggleTimed => {
                self.request(UpstreamRequest::SetTimed(!self.state.timed()));
            }
            ServiceCommand::ToggleInvisibleWhenIdle => {
                let enabled = self.state.toggle_invisible_when_idle();
                info!(enabled, "Invisible when idle toggled");
            }
            ServiceCommand::ToggleAlwaysVisible => {
                let enabled = self.state.toggle_always_visible();
                info!(enabled, "Always visible toggled");
            }
            ServiceCommand::Shutdown => {}
        }
        self.publish();
    }

    fn request(&self, request: UpstreamRequest) {
        if self.upstream_tx.send(request).is_err() {
            warn!("Upstream receiver dropped, request ignored");
        }
    }

    fn publish(&mut self) {
        let frame = self.state.frame();
        if let Some(render) = self.render.as_mut() {
            render.render(frame);
        }
        self.frame_tx.send_replace(Arc::new(frame.clone()));
    }
}

#[cfg(test)]
mod service_tests;
