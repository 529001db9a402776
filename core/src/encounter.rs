//! Encounter list and selection
//!
//! The list always starts with the synthetic aggregate entry, followed by every
//! engaged boss in snapshot order. Rebuilds only happen when the boss set
//! changes, so an unchanged tick never disturbs the user's selection.

use serde::Serialize;

use crate::snapshot::{Entity, KnownEntity};

pub const TOTAL_LABEL: &str = "TOTAL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EncounterEntry {
    /// Aggregate across all bosses. Only ever at index 0.
    Total,
    Boss(Entity),
}

impl EncounterEntry {
    pub fn label(&self) -> &str {
        match self {
            EncounterEntry::Total => TOTAL_LABEL,
            EncounterEntry::Boss(entity) => &entity.name,
        }
    }

    pub fn entity(&self) -> Option<&Entity> {
        match self {
            EncounterEntry::Total => None,
            EncounterEntry::Boss(entity) => Some(entity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncounterList {
    entries: Vec<EncounterEntry>,
}

impl Default for EncounterList {
    fn default() -> Self {
        Self {
            entries: vec![EncounterEntry::Total],
        }
    }
}

impl EncounterList {
    fn with_bosses(bosses: Vec<Entity>) -> Self {
        let mut entries = Vec::with_capacity(bosses.len() + 1);
        entries.push(EncounterEntry::Total);
        entries.extend(bosses.into_iter().map(EncounterEntry::Boss));
        Self { entries }
    }

    pub fn entries(&self) -> &[EncounterEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&EncounterEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the aggregate entry is never removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bosses(&self) -> impl Iterator<Item = &Entity> {
        self.entries[1..].iter().filter_map(EncounterEntry::entity)
    }

    /// Index of `entity`, never 0 (a boss named like the aggregate is still a boss).
    pub fn position(&self, entity: &Entity) -> Option<usize> {
        self.entries
            .iter()
            .skip(1)
            .position(|e| e.entity() == Some(entity))
            .map(|i| i + 1)
    }

    fn same_bosses(&self, candidates: &[Entity]) -> bool {
        self.entries.len() - 1 == candidates.len() && self.bosses().eq(candidates.iter())
    }
}

/// A request to switch the externally tracked current boss (`None` = aggregate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossRequest(pub Option<Entity>);

/// Owns the encounter list and the selected index for the presentation context.
#[derive(Debug, Clone, Default)]
pub struct EncounterSelector {
    list: EncounterList,
    selected: usize,
}

impl EncounterSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &EncounterList {
        &self.list
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The selected boss, `None` when the aggregate entry is selected.
    pub fn selection(&self) -> Option<&Entity> {
        self.list.get(self.selected).and_then(EncounterEntry::entity)
    }

    /// Fold one tick's known entities into the list.
    ///
    /// `known` must already be in snapshot order. Returns true when the list was rebuilt.
    pub fn update<'a>(
        &mut self,
        known: impl IntoIterator<Item = &'a KnownEntity>,
        current_boss: Option<&Entity>,
    ) -> bool {
        let mut candidates: Vec<Entity> = Vec::new();
        for known in known {
            if known.entity.is_boss && known.info.is_engaged() && !candidates.contains(&known.entity) {
                candidates.push(known.entity.clone());
            }
        }

        if self.list.same_bosses(&candidates) {
            if let Some(index) = current_boss.and_then(|boss| self.list.position(boss)) {
                self.selected = index;
            }
            return false;
        }

        let previous = self.selection().cloned();
        self.list = EncounterList::with_bosses(candidates);
        self.selected = previous
            .as_ref()
            .and_then(|entity| self.list.position(entity))
            .or_else(|| current_boss.and_then(|boss| self.list.position(boss)))
            .unwrap_or(0);
        true
    }

    /// Apply a selection made by the user in the encounter dropdown.
    ///
    /// Returns the upstream request when it differs from `current_boss`.
    /// Indices outside the list select the aggregate entry.
    pub fn select_by_user(&mut self, index: usize, current_boss: Option<&Entity>) -> Option<BossRequest> {
        self.selected = if index < self.list.len() { index } else { 0 };
        let chosen = self.selection().cloned();
        if chosen.as_ref() == current_boss {
            return None;
        }
        Some(BossRequest(chosen))
    }

    pub fn reset(&mut self) {
        self.list = EncounterList::default();
        self.selected = 0;
    }
}
