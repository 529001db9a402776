pub mod clipboard;
pub mod context;
pub mod crash;
pub mod encounter;
pub mod export;
pub mod hotkeys;
pub mod ranking;
pub mod roster;
pub mod service;
pub mod snapshot;
pub mod visibility;

// Re-exports for convenience
pub use encounter::{BossRequest, EncounterEntry, EncounterList, EncounterSelector};
pub use ranking::{RankedRow, rank};
pub use roster::{RosterReconciler, RowHandle};
pub use service::{Frame, PresentationService, ServiceHandle, UpstreamRequest};
pub use snapshot::{Entity, Participant, ParticipantInfo, Snapshot};
pub use visibility::{Visibility, VisibilityPolicy};
