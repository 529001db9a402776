//! Show/hide decision for the meter window.
//!
//! The only state carried between evaluations is the `forced_hidden` latch,
//! which records that the window was hidden by the focus rule rather than by
//! the idle rule.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Inputs sampled for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityInputs {
    pub always_visible: bool,
    pub invisible_when_idle: bool,
    pub roster_non_empty: bool,
    pub game_focused: bool,
    pub meter_focused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityPolicy {
    forced_hidden: bool,
    state: Visibility,
}

impl VisibilityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn forced_hidden(&self) -> bool {
        self.forced_hidden
    }

    /// Full evaluation, run whenever focus or a toggle changes.
    pub fn evaluate(&mut self, inputs: &VisibilityInputs) -> Visibility {
        if inputs.always_visible {
            self.forced_hidden = false;
            self.state = Visibility::Visible;
        } else if !inputs.game_focused && !inputs.meter_focused {
            self.forced_hidden = true;
            self.state = Visibility::Hidden;
        } else if !inputs.invisible_when_idle || inputs.roster_non_empty {
            self.forced_hidden = false;
            self.state = Visibility::Visible;
        } else {
            // Focused, idle mode on, nothing to show. The latch is left alone.
            self.state = Visibility::Hidden;
        }
        self.state
    }

    /// Re-derive visibility after a reconciled tick.
    ///
    /// Focus is not consulted: a window hidden by the focus rule stays hidden
    /// until focus returns.
    pub fn on_roster_update(&mut self, inputs: &VisibilityInputs) -> Visibility {
        if inputs.always_visible {
            self.forced_hidden = false;
            self.state = Visibility::Visible;
        } else if inputs.invisible_when_idle {
            if !inputs.roster_non_empty {
                self.state = Visibility::Hidden;
            } else if !self.forced_hidden {
                self.state = Visibility::Visible;
            }
        } else if !self.forced_hidden {
            self.state = Visibility::Visible;
        }
        self.state
    }

    /// Apply a flip of the invisible-when-idle toggle.
    pub fn toggle_invisible_when_idle(&mut self, now_enabled: bool, roster_non_empty: bool) -> Visibility {
        if self.forced_hidden {
            return self.state;
        }
        self.state = if !now_enabled || roster_non_empty {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        self.state
    }
}
