use serde::Serialize;
use tally_types::CopyLayout;
use tally_types::formatting::format_timer;

use crate::encounter::{EncounterList, TOTAL_LABEL};
use crate::export::{self, ExportContext};
use crate::ranking::RankedRow;
use crate::roster::RowHandle;
use crate::snapshot::Entity;
use crate::visibility::Visibility;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_damage: i64,
    pub party_dps: i64,
    pub duration_secs: i64,
    /// `duration_secs` as `mm:ss`
    pub timer: String,
}

impl Totals {
    pub fn new(total_damage: i64, party_dps: i64, duration_secs: i64) -> Self {
        Self {
            total_damage,
            party_dps,
            duration_secs,
            timer: format_timer(duration_secs),
        }
    }
}

/// Everything the renderer needs for one redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub title: String,
    pub ranked: Vec<RankedRow>,
    pub encounters: EncounterList,
    pub selected_index: usize,
    /// Selected boss, `None` for the aggregate entry
    pub selection: Option<Entity>,
    /// Label of the encounter the stats are measured against
    pub encounter_name: String,
    pub visibility: Visibility,
    pub totals: Totals,
    /// Rows that appeared since the previous frame
    pub admitted: Vec<RowHandle>,
    /// Rows whose render handles must be torn down
    pub evicted: Vec<RowHandle>,
    /// Session epoch the frame was produced in
    pub epoch: u64,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            title: String::new(),
            ranked: Vec::new(),
            encounters: EncounterList::default(),
            selected_index: 0,
            selection: None,
            encounter_name: TOTAL_LABEL.to_string(),
            visibility: Visibility::Visible,
            totals: Totals::new(0, 0, 0),
            admitted: Vec::new(),
            evicted: Vec::new(),
            epoch: 0,
        }
    }
}

impl Frame {
    pub fn export_context(&self) -> ExportContext {
        ExportContext {
            encounter: self.encounter_name.clone(),
            duration_secs: self.totals.duration_secs,
            total_damage: self.totals.total_damage,
            party_dps: self.totals.party_dps,
        }
    }

    pub fn export(&self, layout: &CopyLayout) -> String {
        export::format(&self.ranked, &self.export_context(), layout)
    }
}
