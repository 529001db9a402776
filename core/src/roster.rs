//! Roster reconciliation
//!
//! Keeps the set of visible participant rows stable across ticks. Rows that are
//! still active are never dropped; newcomers are admitted at most
//! [`MAX_ADMISSIONS_PER_TICK`] at a time so a large pull does not reshuffle
//! the whole display in one frame.

use hashbrown::HashSet;
use serde::Serialize;

use crate::snapshot::{EncounterWindow, Participant, ParticipantInfo, ParticipantStats};

/// Newcomers admitted per tick. Already-visible rows are not counted.
pub const MAX_ADMISSIONS_PER_TICK: usize = 9;

/// Opaque handle the renderer associates with one displayed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RowHandle(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub info: ParticipantInfo,
    pub handle: RowHandle,
}

/// Visible participant rows, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    rows: Vec<RosterRow>,
    next_handle: u64,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, info: &ParticipantInfo) -> bool {
        self.rows.iter().any(|r| &r.info == info)
    }

    pub fn handle_of(&self, info: &ParticipantInfo) -> Option<RowHandle> {
        self.rows.iter().find(|r| &r.info == info).map(|r| r.handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterRow> {
        self.rows.iter()
    }

    /// Empty roster that keeps allocating handles after the ones already issued.
    fn cleared(&self) -> Self {
        Self {
            rows: Vec::new(),
            next_handle: self.next_handle,
        }
    }

    fn allocate(&mut self, info: &ParticipantInfo) -> RowHandle {
        let handle = RowHandle(self.next_handle);
        self.next_handle += 1;
        self.rows.push(RosterRow {
            info: info.clone(),
            handle,
        });
        handle
    }
}

/// Row-level changes produced by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterDiff {
    pub admitted: Vec<RowHandle>,
    /// Rows whose render handles must be torn down
    pub evicted: Vec<RosterRow>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty() && self.evicted.is_empty()
    }
}

/// A participant is active when it dealt damage to, or took hits during, the encounter.
pub fn is_active(stats: &ParticipantStats, window: &EncounterWindow) -> bool {
    let encounter = window.encounter();
    stats.dealt.damage(encounter, window.timed) != 0
        || stats
            .received
            .hits(encounter, window.first_hit, window.last_hit, window.timed)
            != 0
}

/// Compute the next roster from the current one.
///
/// Pure: the same inputs always produce the same roster and diff.
pub fn reconcile(
    current: &Roster,
    participants: &[Participant],
    window: &EncounterWindow,
) -> (Roster, RosterDiff) {
    let mut active: HashSet<&ParticipantInfo> = HashSet::with_capacity(participants.len());
    let mut newcomers: Vec<&ParticipantInfo> = Vec::new();

    for participant in participants {
        if !is_active(&participant.stats, window) {
            continue;
        }
        let info = &participant.info;
        if current.contains(info) {
            active.insert(info);
            continue;
        }
        if newcomers.len() == MAX_ADMISSIONS_PER_TICK || newcomers.contains(&info) {
            continue;
        }
        active.insert(info);
        newcomers.push(info);
    }

    let mut next = current.cleared();
    let mut diff = RosterDiff::default();

    for row in current.iter() {
        if active.contains(&row.info) {
            next.rows.push(row.clone());
        } else {
            diff.evicted.push(row.clone());
        }
    }
    for info in newcomers {
        diff.admitted.push(next.allocate(info));
    }

    (next, diff)
}

/// Owns the roster for the presentation context.
#[derive(Debug, Clone, Default)]
pub struct RosterReconciler {
    roster: Roster,
}

impl RosterReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Reconcile without committing. See [`RosterReconciler::commit`].
    pub fn prepare(&self, participants: &[Participant], window: &EncounterWindow) -> (Roster, RosterDiff) {
        reconcile(&self.roster, participants, window)
    }

    pub fn commit(&mut self, roster: Roster) {
        self.roster = roster;
    }

    pub fn apply(&mut self, participants: &[Participant], window: &EncounterWindow) -> RosterDiff {
        let (roster, diff) = self.prepare(participants, window);
        self.commit(roster);
        diff
    }

    /// Drop every row, returning them so their handles can be torn down.
    pub fn reset(&mut self) -> Vec<RosterRow> {
        let cleared = self.roster.cleared();
        std::mem::replace(&mut self.roster, cleared).rows
    }
}
