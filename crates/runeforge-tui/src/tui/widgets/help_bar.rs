// Bottom rows: last message and keyboard shortcut hints for the active tab.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::TabId;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state.active_tab),
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

pub fn render_message(frame: &mut Frame, area: Rect, state: &ViewState) {
    let text = state.message.as_deref().unwrap_or("");
    let paragraph = Paragraph::new(format!(" {}", text)).style(Style::default().fg(Color::Gray));
    frame.render_widget(paragraph, area);
}

pub fn help_text(tab: TabId) -> &'static str {
    match tab {
        TabId::Build => " q:Quit | 1-2/Tab:Tabs | s:Sort | r:Import runes | i:Import items | c:Reconnect",
        TabId::TierList => " q:Quit | 1-2/Tab:Tabs | p:Role | f:Refresh | j/k:Scroll | c:Reconnect",
    }
}
