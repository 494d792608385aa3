// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the session and everything else it
// renders. The app orchestrator pushes `UiUpdate` messages over an mpsc
// channel; the TUI applies them to `ViewState` and re-renders at ~30 fps.
// The build sort mode lives here and nowhere else.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::debug;

use runeforge_core::dispatcher::ImportKind;
use runeforge_core::projector::{SortMode, SortProjector};
use runeforge_core::service::is_success_status;
use runeforge_core::session::SessionState;
use runeforge_core::tier_list::{Role, TierList};

use crate::protocol::{ConnectionStatus, TabId, UiUpdate, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// Import and tier-list status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    Pending,
    /// The service answered with this HTTP status.
    Answered(u16),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TierListStatus {
    NotLoaded,
    Loading,
    Loaded(TierList),
    Failed(String),
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
pub struct ViewState {
    /// Latest session snapshot from the app.
    pub session: SessionState,
    /// Active build sort mode.
    pub projector: SortProjector,
    /// Mode restored whenever the session starts over.
    pub default_sort: SortMode,
    pub connection_status: ConnectionStatus,
    pub active_tab: TabId,
    /// Role filter of the tier list tab.
    pub role: Role,
    pub tier_list: TierListStatus,
    pub tier_list_scroll: usize,
    pub imports: HashMap<ImportKind, ImportStatus>,
    /// One-line message under the main panel (last import result).
    pub message: Option<String>,
    /// Wall-clock time of the last session update.
    pub last_session_update: Option<DateTime<Local>>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(SortMode::default(), Role::default())
    }
}

impl ViewState {
    pub fn new(default_sort: SortMode, default_role: Role) -> Self {
        ViewState {
            session: SessionState::Idle,
            projector: SortProjector::new(default_sort),
            default_sort,
            connection_status: ConnectionStatus::Disconnected,
            active_tab: TabId::Build,
            role: default_role,
            tier_list: TierListStatus::NotLoaded,
            tier_list_scroll: 0,
            imports: HashMap::new(),
            message: None,
            last_session_update: None,
        }
    }

    pub fn sort_mode(&self) -> SortMode {
        self.projector.mode()
    }

    pub fn import_pending(&self, kind: ImportKind) -> bool {
        self.imports.get(&kind) == Some(&ImportStatus::Pending)
    }

    /// Forget everything derived from the previous session.
    fn clear_session_view(&mut self) {
        self.projector.set_mode(self.default_sort);
        self.imports.clear();
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Session(session) => {
            if *session == SessionState::Idle {
                state.clear_session_view();
            }
            state.session = *session;
            state.last_session_update = Some(Local::now());
        }
        UiUpdate::ConnectionStatus(status) => {
            state.connection_status = status;
            if status != ConnectionStatus::Connected {
                state.clear_session_view();
            }
        }
        UiUpdate::ImportStarted(kind) => {
            state.imports.insert(kind, ImportStatus::Pending);
            state.message = Some(format!("Importing {kind}..."));
        }
        UiUpdate::ImportFinished(outcome) => {
            let (status, message) = match outcome.result {
                Ok(code) if is_success_status(code) => (
                    ImportStatus::Answered(code),
                    format!("Import {} answered {}", outcome.kind, code),
                ),
                Ok(code) => (
                    ImportStatus::Answered(code),
                    format!("Import {} rejected with {}", outcome.kind, code),
                ),
                Err(e) => (
                    ImportStatus::Failed(e.clone()),
                    format!("Import {} failed: {}", outcome.kind, e),
                ),
            };
            state.imports.insert(outcome.kind, status);
            state.message = Some(message);
        }
        UiUpdate::TierListLoading => {
            state.tier_list = TierListStatus::Loading;
        }
        UiUpdate::TierList(list) => {
            state.tier_list = TierListStatus::Loaded(*list);
            state.tier_list_scroll = 0;
        }
        UiUpdate::TierListError(e) => {
            state.tier_list = TierListStatus::Failed(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    match state.active_tab {
        TabId::Build => widgets::build::render(frame, layout.main_panel, state),
        TabId::TierList => widgets::tier_list::render(frame, layout.main_panel, state),
    }
    widgets::help_bar::render_message(frame, layout.message_line, state);
    widgets::help_bar::render(frame, layout.help_bar, state);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the user quits or the app goes away.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook that restores the terminal.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            debug!("User command: {:?}", cmd);
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events; the next tick redraws anyway.
                    }
                    Some(Err(_)) | None => break,
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
