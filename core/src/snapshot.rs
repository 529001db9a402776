//! Snapshot data contract
//!
//! A [`Snapshot`] is produced once per tick by the external sniffer/aggregator and
//! handed to the presentation context by value. Nothing in this crate mutates one.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub type EntityId = u64;

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// A combat entity (NPC or boss). Equality and hashing use identity only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub is_boss: bool,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_boss: false,
        }
    }

    pub fn boss(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_boss: true,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Engagement timestamps (seconds) for one entity. `0` means never engaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterInfo {
    pub first_hit: i64,
    pub last_hit: i64,
}

impl EncounterInfo {
    pub fn is_engaged(&self) -> bool {
        self.first_hit != 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownEntity {
    pub entity: Entity,
    pub info: EncounterInfo,
}

// ─────────────────────────────────────────────────────────────────────────────
// Participants
// ─────────────────────────────────────────────────────────────────────────────

/// Player identity, stable across ticks. `class` is display data only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub class: String,
}

impl ParticipantInfo {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            class: String::new(),
        }
    }
}

impl PartialEq for ParticipantInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for ParticipantInfo {}

impl Hash for ParticipantInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

/// Damage dealt against a single target.
///
/// `timed_damage` is everything the participant dealt (to any target) while the
/// target's encounter was running, as computed by the aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTally {
    pub damage: i64,
    pub timed_damage: i64,
    pub hits: u32,
    pub crits: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealtStats {
    pub targets: HashMap<EntityId, TargetTally>,
    pub total: TargetTally,
}

impl DealtStats {
    /// Damage against `encounter`, or against everything when `encounter` is `None`.
    pub fn damage(&self, encounter: Option<&Entity>, timed: bool) -> i64 {
        match encounter {
            None => self.total.damage,
            Some(entity) => self
                .targets
                .get(&entity.id)
                .map(|t| if timed { t.timed_damage } else { t.damage })
                .unwrap_or(0),
        }
    }

    /// Share of `total` this participant contributed, in `[0, 1]` for sane input.
    pub fn damage_fraction(&self, encounter: Option<&Entity>, total: i64, timed: bool) -> f64 {
        if total <= 0 {
            return 0.0;
        }
        self.damage(encounter, timed) as f64 / total as f64
    }

    pub fn crit_rate(&self, encounter: Option<&Entity>) -> f64 {
        let tally = match encounter {
            None => Some(&self.total),
            Some(entity) => self.targets.get(&entity.id),
        };
        match tally {
            Some(t) if t.hits > 0 => t.crits as f64 / t.hits as f64,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceivedStats {
    /// Hits taken, keyed by the entity that landed them
    pub from_sources: HashMap<EntityId, u32>,
    /// Hits taken from anyone, bucketed by second
    pub per_second: BTreeMap<i64, u32>,
    pub total_hits: u32,
}

impl ReceivedStats {
    /// Hits received for the encounter.
    ///
    /// In timed mode with a selected encounter, every hit inside `[from, to]`
    /// counts regardless of source.
    pub fn hits(&self, encounter: Option<&Entity>, from: i64, to: i64, timed: bool) -> u32 {
        match encounter {
            None => self.total_hits,
            Some(_) if timed => {
                if from > to {
                    return 0;
                }
                self.per_second.range(from..=to).map(|(_, hits)| *hits).sum()
            }
            Some(entity) => self.from_sources.get(&entity.id).copied().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantStats {
    pub dealt: DealtStats,
    pub received: ReceivedStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub info: ParticipantInfo,
    #[serde(default)]
    pub stats: ParticipantStats,
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// The encounter a tick's stats are measured against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncounterWindow {
    /// `None` is the aggregate/TOTAL view
    pub encounter: Option<Entity>,
    pub first_hit: i64,
    pub last_hit: i64,
    pub timed: bool,
}

impl EncounterWindow {
    pub fn encounter(&self) -> Option<&Entity> {
        self.encounter.as_ref()
    }

    pub fn duration_secs(&self) -> i64 {
        (self.last_hit - self.first_hit).max(0)
    }
}

/// One tick of aggregated combat state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub first_hit: i64,
    pub last_hit: i64,
    pub total_damage: i64,
    pub party_dps: i64,
    pub entities: Vec<KnownEntity>,
    pub participants: Vec<Participant>,
    pub current_boss: Option<Entity>,
    pub timed: bool,
}

impl Snapshot {
    pub fn window(&self) -> EncounterWindow {
        EncounterWindow {
            encounter: self.current_boss.clone(),
            first_hit: self.first_hit,
            last_hit: self.last_hit,
            timed: self.timed,
        }
    }

    /// Known entities, most recently hit first. Ties keep snapshot order.
    pub fn ordered_entities(&self) -> Vec<&KnownEntity> {
        let mut ordered: Vec<&KnownEntity> = self.entities.iter().collect();
        ordered.sort_by(|a, b| b.info.last_hit.cmp(&a.info.last_hit));
        ordered
    }
}
