// Status bar widget: connection, session, tab indicator, sort mode.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use runeforge_core::session::SessionState;

use crate::protocol::{ConnectionStatus, TabId};
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [connection] [session] | [tabs] | [sort mode] [last update]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (dot, dot_color) = connection_indicator(state.connection_status);
    spans.push(Span::styled(format!(" {} ", dot), Style::default().fg(dot_color)));

    spans.push(Span::styled(
        session_summary(&state.session),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    spans.extend(tab_spans(state.active_tab));

    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
    spans.push(Span::styled(
        format!("Sort: {}", state.sort_mode().label()),
        Style::default().fg(Color::Cyan),
    ));

    if let Some(at) = state.last_session_update {
        spans.push(Span::styled(
            format!(" | {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the connection dot character and its color.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color) {
    match status {
        ConnectionStatus::Connected => ("●", Color::Green),
        ConnectionStatus::Connecting => ("●", Color::Yellow),
        ConnectionStatus::Disconnected => ("●", Color::Red),
    }
}

/// One-line description of who is connected and what they are doing.
pub fn session_summary(session: &SessionState) -> String {
    match session {
        SessionState::Idle => "Waiting for client".to_string(),
        SessionState::Identified(user) => user.username.clone(),
        SessionState::InChampSelect { user, champion } => {
            format!("{} | {}", user.username, champion.name)
        }
    }
}

/// Tab indicator spans with the active tab highlighted.
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let tabs = [(TabId::Build, "1:Build"), (TabId::TierList, "2:Tier List")];

    let mut spans = Vec::new();
    for (tab_id, label) in tabs {
        let style = if tab_id == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}]", label), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
