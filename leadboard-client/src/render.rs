use shared_types::{Lead, Pagination};
use std::fmt::Write;

use crate::board::Board;
use crate::selection::SelectionSet;

/// Compact price, e.g. `1.25M` or `890K`.
pub fn format_price(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
            .replace(".00M", "M")
    } else if value >= 1_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

fn card_line(lead: &Lead) -> String {
    let mut line = format!("  - {} [{}] score {:.0}", lead.name, lead.priority.label(), lead.score);
    if let Some(deal_value) = lead.deal_value {
        let _ = write!(line, " · {}", format_price(deal_value));
    }
    if let Some(agent) = &lead.assigned_to {
        let _ = write!(line, " · @{}", agent.name);
    }
    let _ = write!(line, "  ({})", lead.id);
    line
}

/// Kanban columns one below the other with their count and deal total.
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    for column in &board.columns {
        let total = column.total_deal_value();
        if total > 0.0 {
            let _ = writeln!(
                out,
                "{} ({}) · {}",
                column.label,
                column.count(),
                format_price(total)
            );
        } else {
            let _ = writeln!(out, "{} ({})", column.label, column.count());
        }

        if column.leads.is_empty() {
            let _ = writeln!(out, "  (empty)");
        }
        for lead in &column.leads {
            let _ = writeln!(out, "{}", card_line(lead));
        }
    }
    out
}

/// Table view of one page, with a selection marker per row.
pub fn render_table(leads: &[Lead], pagination: &Pagination, selection: &SelectionSet) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "    {:<24} {:<28} {:<18} {:<8} {:>5}",
        "NAME", "EMAIL", "STAGE", "PRIORITY", "SCORE"
    );
    for lead in leads {
        let marker = if selection.contains(&lead.id) { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{} {:<24} {:<28} {:<18} {:<8} {:>5.0}",
            marker,
            truncate(&lead.name, 24),
            truncate(lead.email.as_deref().unwrap_or("-"), 28),
            lead.stage.label(),
            lead.priority.label(),
            lead.score
        );
    }

    let first = if pagination.total == 0 {
        0
    } else {
        pagination.offset.saturating_add(1)
    };
    let shown = u32::try_from(leads.len()).unwrap_or(u32::MAX);
    let last = pagination.offset.saturating_add(shown);
    let _ = writeln!(out, "Showing {}-{} of {}", first, last, pagination.total);
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
