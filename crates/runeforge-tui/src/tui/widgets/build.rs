// Build page widget: rune page and item sets of the current champion.
//
// Left column: primary tree (keystone highlighted), secondary tree, shards,
// with rune names coloured by their tree. Right column: starting items, core
// items and the import key hints with their last result.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use runeforge_core::assets::rune_tree_color;
use runeforge_core::dispatcher::ImportKind;
use runeforge_core::model::{Item, Rune, RunePage, RUNE_PAGE_LEN};
use runeforge_core::projector::BuildView;
use runeforge_core::service::is_success_status;
use runeforge_core::session::SessionState;

use crate::tui::layout::split_build_panel;
use crate::tui::{ImportStatus, ViewState};

/// Render the build page into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(champion) = state.session.champion() else {
        let paragraph = Paragraph::new(waiting_text(&state.session))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Build"));
        frame.render_widget(paragraph, area);
        return;
    };

    let view = state.projector.project(champion);
    let (rune_area, item_area) = split_build_panel(area);

    let runes = Paragraph::new(rune_lines(view.runes)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(
                "{} ({}) - Runes by {}",
                champion.name,
                champion.role,
                view.mode.label()
            )),
    );
    frame.render_widget(runes, rune_area);

    let mut lines = item_lines(&view);
    lines.push(Line::raw(""));
    lines.push(import_line(state, ImportKind::Runes));
    lines.push(import_line(state, ImportKind::Items));

    let items = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Items"));
    frame.render_widget(items, item_area);
}

/// Placeholder text shown until a champion is picked.
pub fn waiting_text(session: &SessionState) -> String {
    match session {
        SessionState::Idle => "  Waiting for the game client...".to_string(),
        SessionState::Identified(user) => {
            format!("  Hi {}, waiting for champion select...", user.username)
        }
        SessionState::InChampSelect { .. } => String::new(),
    }
}

/// Display name of a rune, falling back to its id.
pub fn rune_name(rune: &Rune) -> String {
    if rune.info.name.is_empty() {
        format!("#{}", rune.id)
    } else {
        rune.info.name.clone()
    }
}

/// Colour of the tree a rune slot belongs to.
pub fn tree_color(tree: Option<&Rune>) -> Color {
    tree.and_then(|rune| rune_tree_color(rune.id))
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::White)
}

/// Lines for the rune column in slot order.
pub fn rune_lines(page: RunePage<'_>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if page.is_empty() {
        lines.push(Line::styled(
            "  No runes for this sort.",
            Style::default().fg(Color::DarkGray),
        ));
        return lines;
    }

    let primary = tree_color(page.primary_tree());
    let secondary = tree_color(page.secondary_tree());

    if let Some(tree) = page.primary_tree() {
        lines.push(heading(format!("Primary: {}", rune_name(tree)), primary));
    }
    if let Some(keystone) = page.keystone() {
        lines.push(Line::from(vec![
            Span::raw("  ★ "),
            Span::styled(
                rune_name(keystone),
                Style::default().fg(primary).add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    for rune in page.primary_runes() {
        lines.push(rune_line(rune, primary));
    }

    if let Some(tree) = page.secondary_tree() {
        lines.push(Line::raw(""));
        lines.push(heading(format!("Secondary: {}", rune_name(tree)), secondary));
    }
    for rune in page.secondary_runes() {
        lines.push(rune_line(rune, secondary));
    }

    if !page.stat_shards().is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Shards".to_string(), Color::Gray));
        for rune in page.stat_shards() {
            lines.push(rune_line(rune, Color::Gray));
        }
    }

    if !page.is_complete() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("  Incomplete rune page ({} of {})", page.len(), RUNE_PAGE_LEN),
            Style::default().fg(Color::Red),
        ));
    }
    lines
}

/// Lines for the item column: starting items first, then the build.
pub fn item_lines(view: &BuildView<'_>) -> Vec<Line<'static>> {
    let mut lines = vec![heading("Starting items".to_string(), Color::Yellow)];
    push_items(&mut lines, view.starting_items);
    lines.push(Line::raw(""));
    lines.push(heading("Build".to_string(), Color::Yellow));
    push_items(&mut lines, view.items);
    lines
}

fn push_items(lines: &mut Vec<Line<'static>>, items: &[Item]) {
    if items.is_empty() {
        lines.push(Line::styled("  (none)", Style::default().fg(Color::DarkGray)));
        return;
    }
    for item in items {
        let name = if item.name.is_empty() {
            format!("#{}", item.id)
        } else {
            item.name.clone()
        };
        lines.push(Line::raw(format!("  {}", name)));
    }
}

/// Key hint for an import, with the state of the last request of that kind.
pub fn import_line(state: &ViewState, kind: ImportKind) -> Line<'static> {
    let key = match kind {
        ImportKind::Runes => 'r',
        ImportKind::Items => 'i',
    };
    let (status, color) = match state.imports.get(&kind) {
        None => (String::new(), Color::White),
        Some(ImportStatus::Pending) => ("importing...".to_string(), Color::Yellow),
        Some(ImportStatus::Answered(code)) if is_success_status(*code) => {
            (format!("done ({code})"), Color::Green)
        }
        Some(ImportStatus::Answered(code)) => (format!("rejected ({code})"), Color::Red),
        Some(ImportStatus::Failed(_)) => ("failed".to_string(), Color::Red),
    };
    Line::from(vec![
        Span::styled(format!("[{key}] import {kind} "), Style::default().fg(Color::White)),
        Span::styled(status, Style::default().fg(color)),
    ])
}

fn heading(text: String, color: Color) -> Line<'static> {
    Line::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn rune_line(rune: &Rune, color: Color) -> Line<'static> {
    Line::styled(format!("    {}", rune_name(rune)), Style::default().fg(color))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
