//! Session state the sniffer would own, for replayed snapshots.
//!
//! Recorded snapshots carry the current boss and timed flag as they were when
//! captured. Requests coming back from the presentation service are applied
//! on top, so selecting an encounter or toggling timed mode takes effect on
//! the next replayed tick.

use std::sync::{Arc, Mutex};

use tally_core::{Entity, Snapshot, UpstreamRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Default)]
struct SessionOverrides {
    /// `Some(None)` forces the aggregate view
    boss: Option<Option<Entity>>,
    timed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySession {
    inner: Arc<Mutex<SessionOverrides>>,
}

impl ReplaySession {
    pub fn apply(&self, snapshot: &mut Snapshot) {
        let Ok(overrides) = self.inner.lock() else {
            return;
        };
        if let Some(boss) = &overrides.boss {
            snapshot.current_boss = boss.clone();
        }
        if let Some(timed) = overrides.timed {
            snapshot.timed = timed;
        }
    }

    pub fn handle(&self, request: &UpstreamRequest) {
        let Ok(mut overrides) = self.inner.lock() else {
            return;
        };
        match request {
            UpstreamRequest::SwitchEncounter(boss) => overrides.boss = Some(boss.clone()),
            UpstreamRequest::SetTimed(timed) => overrides.timed = Some(*timed),
            UpstreamRequest::ResetSession => *overrides = SessionOverrides::default(),
        }
    }

    /// Consume upstream requests until the service goes away.
    pub fn spawn_listener(&self, mut rx: mpsc::UnboundedReceiver<UpstreamRequest>) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                info!(?request, "Upstream request");
                session.handle(&request);
            }
        })
    }
}
