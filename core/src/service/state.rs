//! Reconciliation state owned by the presentation task.

use tally_types::WindowSettings;

use super::frame::{Frame, Totals};
use crate::encounter::{BossRequest, EncounterSelector, TOTAL_LABEL};
use crate::ranking::rank;
use crate::roster::{Roster, RosterDiff, RosterReconciler};
use crate::snapshot::{Entity, Snapshot};
use crate::visibility::{VisibilityInputs, VisibilityPolicy};

/// A reconciled tick that has not been committed yet.
pub struct PreparedTick {
    roster: Roster,
    diff: RosterDiff,
    selector: EncounterSelector,
    policy: VisibilityPolicy,
    frame: Frame,
    current_boss: Option<Entity>,
    timed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Focus {
    pub game: bool,
    pub meter: bool,
}

pub struct PresentationState {
    reconciler: RosterReconciler,
    selector: EncounterSelector,
    policy: VisibilityPolicy,
    window: WindowSettings,
    focus: Focus,
    title: String,
    current_boss: Option<Entity>,
    timed: bool,
    frame: Frame,
}

impl PresentationState {
    /// Neither window counts as focused until the first focus report, so the
    /// meter starts hidden unless it is pinned.
    pub fn new(window: WindowSettings, title: String) -> Self {
        let frame = Frame {
            title: title.clone(),
            ..Frame::default()
        };
        let mut state = Self {
            reconciler: RosterReconciler::new(),
            selector: EncounterSelector::new(),
            policy: VisibilityPolicy::new(),
            window,
            focus: Focus::default(),
            title,
            current_boss: None,
            timed: false,
            frame,
        };
        let inputs = state.inputs(false);
        state.policy.evaluate(&inputs);
        state.frame.visibility = state.policy.state();
        state
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn timed(&self) -> bool {
        self.timed
    }

    fn inputs(&self, roster_non_empty: bool) -> VisibilityInputs {
        VisibilityInputs {
            always_visible: self.window.always_visible,
            invisible_when_idle: self.window.invisible_when_idle,
            roster_non_empty,
            game_focused: self.focus.game,
            meter_focused: self.focus.meter,
        }
    }

    /// Run the whole tick pipeline against copies of the current state.
    pub fn prepare(&self, snapshot: &Snapshot, epoch: u64) -> PreparedTick {
        let window = snapshot.window();
        let (roster, diff) = self.reconciler.prepare(&snapshot.participants, &window);

        let mut selector = self.selector.clone();
        selector.update(snapshot.ordered_entities(), snapshot.current_boss.as_ref());

        let ranked = rank(&roster, &snapshot.participants, &window, snapshot.total_damage);

        let mut policy = self.policy.clone();
        let visibility = policy.on_roster_update(&self.inputs(!roster.is_empty()));

        let frame = Frame {
            title: self.title.clone(),
            ranked,
            encounters: selector.list().clone(),
            selected_index: selector.selected_index(),
            selection: selector.selection().cloned(),
            encounter_name: snapshot
                .current_boss
                .as_ref()
                .map_or_else(|| TOTAL_LABEL.to_string(), |b| b.name.clone()),
            visibility,
            totals: Totals::new(snapshot.total_damage, snapshot.party_dps, window.duration_secs()),
            admitted: diff.admitted.clone(),
            evicted: diff.evicted.iter().map(|r| r.handle).collect(),
            epoch,
        };

        PreparedTick {
            roster,
            diff,
            selector,
            policy,
            frame,
            current_boss: snapshot.current_boss.clone(),
            timed: snapshot.timed,
        }
    }

    /// Install a prepared tick. Returns the roster diff it carried.
    pub fn commit(&mut self, tick: PreparedTick) -> RosterDiff {
        self.reconciler.commit(tick.roster);
        self.selector = tick.selector;
        self.policy = tick.policy;
        self.current_boss = tick.current_boss;
        self.timed = tick.timed;
        self.frame = tick.frame;
        tick.diff
    }

    /// Swap roster, encounter list and selection back to empty defaults.
    pub fn reset(&mut self, epoch: u64) {
        let torn_down = self.reconciler.reset();
        self.selector.reset();
        self.current_boss = None;
        let visibility = self.policy.on_roster_update(&self.inputs(false));

        self.frame = Frame {
            title: self.title.clone(),
            visibility,
            evicted: torn_down.iter().map(|r| r.handle).collect(),
            epoch,
            ..Frame::default()
        };
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        let inputs = self.inputs(!self.reconciler.roster().is_empty());
        self.policy.evaluate(&inputs);
        self.refresh();
    }

    pub fn set_connected(&mut self, title: String) {
        self.title = title;
        self.refresh();
    }

    /// Apply a dropdown pick. Returns the upstream request, if the pick
    /// differs from the boss the aggregator is tracking.
    pub fn select_encounter(&mut self, index: usize) -> Option<BossRequest> {
        let request = self
            .selector
            .select_by_user(index, self.current_boss.as_ref());
        self.refresh();
        request
    }

    pub fn toggle_invisible_when_idle(&mut self) -> bool {
        self.window.invisible_when_idle = !self.window.invisible_when_idle;
        self.policy.toggle_invisible_when_idle(
            self.window.invisible_when_idle,
            !self.reconciler.roster().is_empty(),
        );
        self.refresh();
        self.window.invisible_when_idle
    }

    pub fn toggle_always_visible(&mut self) -> bool {
        self.window.always_visible = !self.window.always_visible;
        let inputs = self.inputs(!self.reconciler.roster().is_empty());
        self.policy.evaluate(&inputs);
        self.refresh();
        self.window.always_visible
    }

    /// Rebuild the non-stat parts of the current frame after a command.
    fn refresh(&mut self) {
        self.frame.title = self.title.clone();
        self.frame.encounters = self.selector.list().clone();
        self.frame.selected_index = self.selector.selected_index();
        self.frame.selection = self.selector.selection().cloned();
        self.frame.visibility = self.policy.state();
        self.frame.admitted.clear();
        self.frame.evicted.clear();
    }
}
