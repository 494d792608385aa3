// Session state machine.
//
// `apply` is the pure transition function. `SessionStore` is the single
// mutable cell that owns the current state and publishes every transition to
// its subscribers, in order, as a full snapshot.

use tokio::sync::broadcast;
use tracing::info;

use crate::codec::Event;
use crate::model::{ChampionRecord, UserInfo};

/// Capacity of the per-subscriber transition backlog.
const SUBSCRIBER_BACKLOG: usize = 64;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Connected (or connecting) but no summoner identified yet.
    #[default]
    Idle,
    Identified(UserInfo),
    InChampSelect {
        user: UserInfo,
        champion: Box<ChampionRecord>,
    },
}

impl SessionState {
    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            SessionState::Idle => None,
            SessionState::Identified(user) => Some(user),
            SessionState::InChampSelect { user, .. } => Some(user),
        }
    }

    pub fn champion(&self) -> Option<&ChampionRecord> {
        match self {
            SessionState::InChampSelect { champion, .. } => Some(champion),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Identified(_) => "identified",
            SessionState::InChampSelect { .. } => "champ-select",
        }
    }
}

/// Compute the state that follows `event`.
///
/// Champion events that arrive before any user is known are out of order and
/// leave the state untouched, as does `Event::Noop`.
pub fn apply(current: SessionState, event: Event) -> SessionState {
    match (current, event) {
        (state, Event::Noop) => state,

        (SessionState::Idle, Event::UserInfo(user)) => SessionState::Identified(user),
        (SessionState::Idle, _) => SessionState::Idle,

        (SessionState::Identified(_), Event::UserInfo(user)) => SessionState::Identified(user),
        (SessionState::Identified(user), Event::ChampionChange(champion)) => {
            SessionState::InChampSelect { user, champion }
        }
        (SessionState::Identified(user), Event::QuitChampSelect) => {
            SessionState::Identified(user)
        }

        (SessionState::InChampSelect { champion, .. }, Event::UserInfo(user)) => {
            SessionState::InChampSelect { user, champion }
        }
        (SessionState::InChampSelect { user, .. }, Event::ChampionChange(champion)) => {
            SessionState::InChampSelect { user, champion }
        }
        (SessionState::InChampSelect { user, .. }, Event::QuitChampSelect) => {
            SessionState::Identified(user)
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Owner of the live session state.
///
/// Readers only ever see whole states: `snapshot` clones the current value
/// and subscribers receive one snapshot per transition.
pub struct SessionStore {
    state: SessionState,
    tx: broadcast::Sender<SessionState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIBER_BACKLOG);
        SessionStore {
            state: SessionState::Idle,
            tx,
        }
    }

    pub fn current(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Apply `event` and publish the result if the state changed.
    /// Returns whether a transition happened.
    pub fn apply(&mut self, event: Event) -> bool {
        let previous = std::mem::take(&mut self.state);
        let from = previous.label();
        let next = apply(previous.clone(), event);
        if next == previous {
            self.state = previous;
            return false;
        }
        info!("Session transition: {} -> {}", from, next.label());
        self.publish(next);
        true
    }

    /// Drop everything and go back to `Idle` (connection lost or replaced).
    pub fn reset(&mut self) -> bool {
        if self.state == SessionState::Idle {
            return false;
        }
        info!("Session reset: {} -> idle", self.state.label());
        self.publish(SessionState::Idle);
        true
    }

    fn publish(&mut self, next: SessionState) {
        self.state = next;
        // No receivers is fine; the state is still held here.
        let _ = self.tx.send(self.state.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
