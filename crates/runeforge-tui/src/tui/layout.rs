// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Main Panel (fill)                                 |
// |   Build tab: runes (55%) | items (45%)            |
// |   Tier list tab: full width                       |
// +--------------------------------------------------+
// | Message Line (1 row)                              |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: connection, session, tabs, sort mode.
    pub status_bar: Rect,
    /// Tab-switched content area.
    pub main_panel: Rect,
    /// Last import result or other transient message.
    pub message_line: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(6),    // main panel
            Constraint::Length(1), // message line
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        main_panel: vertical[1],
        message_line: vertical[2],
        help_bar: vertical[3],
    }
}

/// Split the build page into the rune column and the item column.
pub fn split_build_panel(area: Rect) -> (Rect, Rect) {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    (horizontal[0], horizontal[1])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 120, 40)
    }

    #[test]
    fn layout_all_rects_nonzero() {
        let layout = build_layout(test_area());
        let rects = [
            ("status_bar", layout.status_bar),
            ("main_panel", layout.main_panel),
            ("message_line", layout.message_line),
            ("help_bar", layout.help_bar),
        ];
        for (name, rect) in &rects {
            assert!(
                rect.width > 0 && rect.height > 0,
                "{} has zero area: {:?}",
                name,
                rect
            );
        }
    }

    #[test]
    fn single_row_bars() {
        let layout = build_layout(test_area());
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.message_line.height, 1);
        assert_eq!(layout.help_bar.height, 1);
        assert_eq!(layout.main_panel.height, 37);
    }

    #[test]
    fn zones_stack_without_overlap() {
        let layout = build_layout(test_area());
        assert_eq!(layout.main_panel.y, layout.status_bar.y + 1);
        assert_eq!(
            layout.message_line.y,
            layout.main_panel.y + layout.main_panel.height
        );
        assert_eq!(layout.help_bar.y, layout.message_line.y + 1);
    }

    #[test]
    fn build_panel_split_covers_width() {
        let (runes, items) = split_build_panel(Rect::new(0, 0, 100, 20));
        assert_eq!(runes.width + items.width, 100);
        assert!(runes.width > items.width);
        assert_eq!(items.x, runes.x + runes.width);
    }

    #[test]
    fn small_terminal_does_not_panic() {
        let layout = build_layout(Rect::new(0, 0, 20, 5));
        assert_eq!(layout.status_bar.width, 20);
    }
}
