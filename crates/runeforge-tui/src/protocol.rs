// Messages exchanged between the app orchestrator and the TUI.

use runeforge_core::dispatcher::{ImportKind, ImportOutcome};
use runeforge_core::projector::SortMode;
use runeforge_core::session::SessionState;
use runeforge_core::tier_list::TierList;

/// State of the event-source connection as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Tabs of the main panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabId {
    Build,
    TierList,
}

/// App → TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// The session moved to a new state; always a full snapshot.
    Session(Box<SessionState>),
    ConnectionStatus(ConnectionStatus),
    ImportStarted(ImportKind),
    ImportFinished(ImportOutcome),
    TierListLoading,
    TierList(Box<TierList>),
    TierListError(String),
}

/// TUI → App.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Import the rune page of the current champion as sorted by `mode`.
    ImportRunes { mode: SortMode },
    ImportItems { mode: SortMode },
    /// Replace the event-source connection with a fresh one.
    Reconnect,
    LoadTierList,
    Quit,
}
