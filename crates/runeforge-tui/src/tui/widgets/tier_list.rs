// Tier list widget: ranked champions for the selected role.
//
// Each row: "{tier}  {champion}  {role}  {winrate:.2}% WR", in service order.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use runeforge_core::tier_list::{Tier, TierEntry};

use crate::tui::{TierListStatus, ViewState};

/// Render the tier list tab into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Tier List [{}]", state.role));

    let list = match &state.tier_list {
        TierListStatus::Loaded(list) => list,
        other => {
            let (text, color) = match other {
                TierListStatus::Loading => ("  Loading tier list...".to_string(), Color::DarkGray),
                TierListStatus::Failed(e) => (format!("  Tier list unavailable: {e}"), Color::Red),
                _ => ("  Tier list not loaded.".to_string(), Color::DarkGray),
            };
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(color))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let entries = list.for_role(state.role);
    if entries.is_empty() {
        let paragraph = Paragraph::new(format!("  No entries for {}.", state.role))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Tier"),
        Cell::from("Champion"),
        Cell::from("Role"),
        Cell::from("Win rate"),
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    // Borders and header take three rows.
    let visible_rows = (area.height as usize).saturating_sub(3).max(1);
    let scroll = state.tier_list_scroll.min(entries.len().saturating_sub(1));

    let rows: Vec<Row> = entries
        .iter()
        .skip(scroll)
        .take(visible_rows)
        .map(entry_row)
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn entry_row(entry: &TierEntry) -> Row<'static> {
    Row::new(vec![
        Cell::from(entry.tier.as_str()).style(
            Style::default()
                .fg(tier_color(entry.tier))
                .add_modifier(Modifier::BOLD),
        ),
        Cell::from(entry.name.clone()),
        Cell::from(entry.role.clone()),
        Cell::from(format_winrate(entry.winrate)),
    ])
}

/// Format a win-rate percentage for display.
pub fn format_winrate(winrate: f64) -> String {
    format!("{:.2}% WR", winrate)
}

pub fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::S => Color::Magenta,
        Tier::A => Color::Green,
        Tier::B => Color::Cyan,
        Tier::C => Color::Yellow,
        Tier::D => Color::Red,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
