//! Terminal stand-ins for the meter window and the focused chat input.

use std::io::Write;

use tally_core::clipboard::{ClipboardError, TextInjector};
use tally_core::service::RenderSink;
use tally_core::{Frame, Visibility};
use tally_types::formatting::{format_compact, format_fraction_pct};
use tracing::debug;

/// Prints roster and visibility changes as frames are published.
#[derive(Default)]
pub struct ConsoleRenderer {
    last_visibility: Option<Visibility>,
}

impl RenderSink for ConsoleRenderer {
    fn render(&mut self, frame: &Frame) {
        debug!(rows = frame.ranked.len(), epoch = frame.epoch, "Frame");

        if self.last_visibility != Some(frame.visibility) {
            println!("[window] {:?}", frame.visibility);
            self.last_visibility = Some(frame.visibility);
        }
        if !frame.admitted.is_empty() || !frame.evicted.is_empty() {
            println!(
                "[roster] +{} -{} ({} rows)",
                frame.admitted.len(),
                frame.evicted.len(),
                frame.ranked.len()
            );
        }
    }
}

/// "Types" pasted text by echoing it.
pub struct StdoutInjector;

impl TextInjector for StdoutInjector {
    fn inject(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "[paste] {text}").map_err(|e| ClipboardError::Inject(e.to_string()))?;
        stdout.flush().map_err(|e| ClipboardError::Inject(e.to_string()))
    }
}

pub fn print_frame(frame: &Frame) {
    println!("{}", frame.title);
    println!(
        "{:?} | {} | {} dmg | {}/s | {}",
        frame.visibility,
        frame.encounter_name,
        format_compact(frame.totals.total_damage),
        format_compact(frame.totals.party_dps),
        frame.totals.timer
    );

    for (i, entry) in frame.encounters.entries().iter().enumerate() {
        let marker = if i == frame.selected_index { '>' } else { ' ' };
        println!(" {marker} [{i}] {}", entry.label());
    }

    for (i, row) in frame.ranked.iter().enumerate() {
        println!(
            "  {:>2}. {:<16} {:<12} {:>9} {:>8}/s {:>6} crit {:>6} hits {}",
            i + 1,
            row.name,
            row.class,
            format_compact(row.damage),
            format_compact(row.dps),
            format_fraction_pct(row.damage_fraction),
            format_fraction_pct(row.crit_rate),
            row.hits_received
        );
    }
}
