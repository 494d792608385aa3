// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the app
// orchestrator, or into local ViewState mutations (tab switching, sort mode,
// role filter, scrolling).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use runeforge_core::dispatcher::ImportKind;

use super::{TierListStatus, ViewState};
use crate::protocol::{TabId, UserCommand};

/// Rows moved by PageUp/PageDown in the tier list.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    match key_event.code {
        KeyCode::Char('q') => Some(UserCommand::Quit),

        // Tab switching
        KeyCode::Char('1') => switch_tab(view_state, TabId::Build),
        KeyCode::Char('2') => switch_tab(view_state, TabId::TierList),
        KeyCode::Tab => {
            let next = match view_state.active_tab {
                TabId::Build => TabId::TierList,
                TabId::TierList => TabId::Build,
            };
            switch_tab(view_state, next)
        }

        // Build page
        KeyCode::Char('s') => {
            if view_state.active_tab == TabId::Build {
                view_state.projector.toggle();
            }
            None
        }
        KeyCode::Char('r') => import_command(view_state, ImportKind::Runes),
        KeyCode::Char('i') => import_command(view_state, ImportKind::Items),

        // Tier list
        KeyCode::Char('p') => {
            if view_state.active_tab == TabId::TierList {
                view_state.role = view_state.role.next();
                view_state.tier_list_scroll = 0;
            }
            None
        }
        KeyCode::Char('f') => {
            if view_state.active_tab == TabId::TierList {
                Some(UserCommand::LoadTierList)
            } else {
                None
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            scroll_up(view_state, 1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            scroll_down(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll_up(view_state, PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            scroll_down(view_state, PAGE_SIZE);
            None
        }

        // Connection
        KeyCode::Char('c') => Some(UserCommand::Reconnect),

        _ => None,
    }
}

/// Activate `tab`. Activating the tier list fetches it.
fn switch_tab(view_state: &mut ViewState, tab: TabId) -> Option<UserCommand> {
    if view_state.active_tab == tab {
        return None;
    }
    view_state.active_tab = tab;
    match tab {
        TabId::TierList => Some(UserCommand::LoadTierList),
        TabId::Build => None,
    }
}

/// Build an import command for the current sort mode.
///
/// Nothing is sent outside champion select or while an import of the same
/// kind is still in flight.
fn import_command(view_state: &ViewState, kind: ImportKind) -> Option<UserCommand> {
    if view_state.active_tab != TabId::Build
        || view_state.session.champion().is_none()
        || view_state.import_pending(kind)
    {
        return None;
    }
    let mode = view_state.sort_mode();
    Some(match kind {
        ImportKind::Runes => UserCommand::ImportRunes { mode },
        ImportKind::Items => UserCommand::ImportItems { mode },
    })
}

fn scroll_up(view_state: &mut ViewState, amount: usize) {
    if view_state.active_tab == TabId::TierList {
        view_state.tier_list_scroll = view_state.tier_list_scroll.saturating_sub(amount);
    }
}

fn scroll_down(view_state: &mut ViewState, amount: usize) {
    if view_state.active_tab != TabId::TierList {
        return;
    }
    let rows = match &view_state.tier_list {
        TierListStatus::Loaded(list) => list.for_role(view_state.role).len(),
        _ => 0,
    };
    let max = rows.saturating_sub(1);
    view_state.tier_list_scroll = (view_state.tier_list_scroll + amount).min(max);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
