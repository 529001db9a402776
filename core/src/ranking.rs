//! Ranking of visible rows by damage contribution.

use std::cmp::Ordering;

use hashbrown::HashMap;
use serde::Serialize;

use crate::roster::{Roster, RowHandle};
use crate::snapshot::{EncounterWindow, Participant, ParticipantInfo};

/// One ranked row, with the values the renderer and exporter display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub handle: RowHandle,
    pub name: String,
    pub class: String,
    pub damage: i64,
    pub dps: i64,
    /// Share of the tick's total damage, in `[0, 1]`
    pub damage_fraction: f64,
    pub crit_rate: f64,
    pub hits_received: u32,
}

/// Order roster rows by damage fraction, highest first.
///
/// The sort is stable: rows with equal fractions keep roster (first-seen) order.
/// Rows without stats in `participants` are left out.
pub fn rank(
    roster: &Roster,
    participants: &[Participant],
    window: &EncounterWindow,
    total_damage: i64,
) -> Vec<RankedRow> {
    let by_info: HashMap<&ParticipantInfo, &Participant> =
        participants.iter().map(|p| (&p.info, p)).collect();
    let encounter = window.encounter();
    let secs = window.duration_secs().max(1);

    let mut ranked: Vec<RankedRow> = roster
        .iter()
        .filter_map(|row| {
            let participant = by_info.get(&row.info)?;
            let dealt = &participant.stats.dealt;
            let damage = dealt.damage(encounter, window.timed);
            Some(RankedRow {
                handle: row.handle,
                name: row.info.name.clone(),
                class: participant.info.class.clone(),
                damage,
                dps: damage / secs,
                damage_fraction: dealt.damage_fraction(encounter, total_damage, window.timed),
                crit_rate: dealt.crit_rate(encounter),
                hits_received: participant.stats.received.hits(
                    encounter,
                    window.first_hit,
                    window.last_hit,
                    window.timed,
                ),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.damage_fraction
            .partial_cmp(&a.damage_fraction)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::reconcile;
    use crate::snapshot::{ParticipantStats, TargetTally};

    fn participant(id: u64, damage: i64) -> Participant {
        let mut stats = ParticipantStats::default();
        stats.dealt.total = TargetTally {
            damage,
            timed_damage: damage,
            hits: 10,
            crits: 2,
        };
        Participant {
            info: ParticipantInfo::new(id, format!("p{id}")),
            stats,
        }
    }

    fn aggregate_window() -> EncounterWindow {
        EncounterWindow {
            encounter: None,
            first_hit: 100,
            last_hit: 110,
            timed: false,
        }
    }

    #[test]
    fn test_rank_by_fraction_descending() {
        let participants = vec![participant(1, 500), participant(2, 200), participant(3, 800)];
        let (roster, _) = reconcile(&Roster::new(), &participants, &aggregate_window());

        let ranked = rank(&roster, &participants, &aggregate_window(), 1000);
        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["p3", "p1", "p2"]);
        assert_eq!(ranked[0].damage_fraction, 0.8);
        assert_eq!(ranked[0].dps, 80);
        assert_eq!(ranked[0].crit_rate, 0.2);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let participants = vec![participant(1, 300), participant(2, 300), participant(3, 300)];
        let (roster, _) = reconcile(&Roster::new(), &participants, &aggregate_window());

        // Stats arrive in a different order than the roster was built in
        let reordered = vec![participants[2].clone(), participants[0].clone(), participants[1].clone()];
        let ranked = rank(&roster, &reordered, &aggregate_window(), 900);
        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_zero_duration_uses_raw_damage_for_dps() {
        let participants = vec![participant(1, 450)];
        let window = EncounterWindow {
            first_hit: 100,
            last_hit: 100,
            ..aggregate_window()
        };
        let (roster, _) = reconcile(&Roster::new(), &participants, &window);
        let ranked = rank(&roster, &participants, &window, 450);
        assert_eq!(ranked[0].dps, 450);
    }
}
