//! Text export of ranked stats for pasting into chat.

use std::cmp::Ordering;

use tally_types::formatting::{format_compact, format_fraction_pct, format_timer};
use tally_types::{CopyLayout, SortColumn, SortDirection};

use crate::ranking::RankedRow;

/// Values available to the header and footer templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportContext {
    pub encounter: String,
    pub duration_secs: i64,
    pub total_damage: i64,
    pub party_dps: i64,
}

/// Render `ranked` with `layout`.
///
/// Rows are re-ordered by the layout's sort column and direction; ties keep
/// their ranked order. An empty sequence yields header and footer only.
pub fn format(ranked: &[RankedRow], context: &ExportContext, layout: &CopyLayout) -> String {
    let mut rows: Vec<&RankedRow> = ranked.iter().collect();
    rows.sort_by(|a, b| {
        let ord = compare(a, b, layout.order_by);
        match layout.order {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    let mut out = fill_summary(&layout.header, context);
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&fill_row(&layout.content, i + 1, row));
    }
    out.push_str(&fill_summary(&layout.footer, context));
    out
}

fn compare(a: &RankedRow, b: &RankedRow, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Damage => a.damage.cmp(&b.damage),
        SortColumn::Dps => a.dps.cmp(&b.dps),
        SortColumn::DamagePercentage => a
            .damage_fraction
            .partial_cmp(&b.damage_fraction)
            .unwrap_or(Ordering::Equal),
        SortColumn::CritRate => a.crit_rate.partial_cmp(&b.crit_rate).unwrap_or(Ordering::Equal),
        SortColumn::HitsReceived => a.hits_received.cmp(&b.hits_received),
        SortColumn::Name => a.name.cmp(&b.name),
    }
}

/// Substitute `{name}` placeholders in one left-to-right pass. Inserted values
/// are never rescanned; unknown placeholders stay as written.
fn fill(template: &str, value: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| Some((close, value(&after[..close])?))) {
            Some((close, text)) => {
                out.push_str(&text);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn fill_summary(template: &str, context: &ExportContext) -> String {
    fill(template, |name| match name {
        "encounter" => Some(context.encounter.clone()),
        "duration" => Some(format_timer(context.duration_secs)),
        "total_damage" => Some(format_compact(context.total_damage)),
        "party_dps" => Some(format_compact(context.party_dps)),
        _ => None,
    })
}

fn fill_row(template: &str, rank: usize, row: &RankedRow) -> String {
    fill(template, |name| match name {
        "rank" => Some(rank.to_string()),
        "name" => Some(row.name.clone()),
        "class" => Some(row.class.clone()),
        "damage" => Some(format_compact(row.damage)),
        "dps" => Some(format_compact(row.dps)),
        "damage_percentage" => Some(format_fraction_pct(row.damage_fraction)),
        "crit_rate" => Some(format_fraction_pct(row.crit_rate)),
        "hits_received" => Some(row.hits_received.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RowHandle;

    fn row(handle: u64, name: &str, damage: i64, fraction: f64, hits: u32) -> RankedRow {
        RankedRow {
            handle: RowHandle(handle),
            name: name.to_string(),
            class: "Sorc".to_string(),
            damage,
            dps: damage / 10,
            damage_fraction: fraction,
            crit_rate: 0.25,
            hits_received: hits,
        }
    }

    fn ranked() -> Vec<RankedRow> {
        vec![
            row(1, "Ayla", 8_000, 0.8, 1),
            row(2, "Bren", 1_500, 0.15, 7),
            row(3, "Cass", 500, 0.05, 3),
        ]
    }

    fn context() -> ExportContext {
        ExportContext {
            encounter: "BossX".to_string(),
            duration_secs: 125,
            total_damage: 10_000,
            party_dps: 1_000,
        }
    }

    #[test]
    fn test_default_layout() {
        let text = format(&ranked(), &context(), &CopyLayout::default());
        assert_eq!(
            text,
            "BossX 02:05 | Ayla 800/s 80.0% | Bren 150/s 15.0% | Cass 50/s 5.0% | Party 1.00K/s"
        );
    }

    #[test]
    fn test_empty_ranked_yields_header_and_footer() {
        let layout = CopyLayout {
            header: "[{encounter}]".to_string(),
            content: "{name},".to_string(),
            footer: "<{total_damage}>".to_string(),
            ..CopyLayout::default()
        };
        assert_eq!(format(&[], &context(), &layout), "[BossX]<10.00K>");
    }

    #[test]
    fn test_sort_by_column_and_direction() {
        let layout = CopyLayout {
            header: String::new(),
            content: "{rank}.{name}({hits_received}) ".to_string(),
            footer: String::new(),
            order_by: SortColumn::HitsReceived,
            order: SortDirection::Ascending,
        };
        assert_eq!(
            format(&ranked(), &context(), &layout),
            "1.Ayla(1) 2.Cass(3) 3.Bren(7) "
        );

        let by_name_desc = CopyLayout {
            order_by: SortColumn::Name,
            order: SortDirection::Descending,
            ..layout
        };
        assert_eq!(
            format(&ranked(), &context(), &by_name_desc),
            "1.Cass(3) 2.Bren(7) 3.Ayla(1) "
        );
    }

    #[test]
    fn test_ties_keep_ranked_order() {
        let rows = vec![row(1, "Zed", 100, 0.5, 0), row(2, "Abe", 100, 0.5, 0)];
        let layout = CopyLayout {
            header: String::new(),
            content: "{name} ".to_string(),
            footer: String::new(),
            order_by: SortColumn::Damage,
            order: SortDirection::Descending,
        };
        assert_eq!(format(&rows, &ExportContext::default(), &layout), "Zed Abe ");
    }

    #[test]
    fn test_all_row_placeholders() {
        let layout = CopyLayout {
            header: String::new(),
            content: "{rank}|{name}|{class}|{damage}|{dps}|{damage_percentage}|{crit_rate}|{hits_received}"
                .to_string(),
            footer: String::new(),
            ..CopyLayout::default()
        };
        let rows = vec![row(1, "Ayla", 2_300_000, 0.8, 4)];
        assert_eq!(
            format(&rows, &context(), &layout),
            "1|Ayla|Sorc|2.30M|230.00K|80.0%|25.0%|4"
        );
    }

    #[test]
    fn test_inserted_text_is_not_rescanned() {
        let mut rows = ranked();
        rows[0].name = "Evil{dps}".to_string();
        let layout = CopyLayout {
            header: "[{encounter}] ".to_string(),
            content: "{name}:{dps} ".to_string(),
            footer: "{unknown} {".to_string(),
            ..CopyLayout::default()
        };
        let context = ExportContext {
            encounter: "{party_dps}".to_string(),
            ..context()
        };

        let text = format(&rows[..1], &context, &layout);
        assert_eq!(text, "[{party_dps}] Evil{dps}:800 {unknown} {");
    }
}
