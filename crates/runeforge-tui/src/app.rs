// Application state and orchestration logic.
//
// The central event loop that routes event-source messages through the codec
// into the session store, runs user commands from the TUI and forwards
// session transitions, import outcomes and tier-list results to the TUI.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use runeforge_core::assets;
use runeforge_core::codec::{self, Event};
use runeforge_core::config::Config;
use runeforge_core::connection::{ConnEvent, ConnectionLifecycle};
use runeforge_core::dispatcher::{ActionDispatcher, ImportKind, ImportOutcome};
use runeforge_core::projector::{self, SortMode};
use runeforge_core::service::LocalService;
use runeforge_core::session::{SessionState, SessionStore};
use runeforge_core::tier_list;

use crate::protocol::{ConnectionStatus, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    /// The one session cell. Only this loop mutates it.
    pub session: SessionStore,
    pub lifecycle: ConnectionLifecycle,
    pub dispatcher: ActionDispatcher,
    pub service: Arc<dyn LocalService>,
    pub connection_status: ConnectionStatus,
    /// When to open a new connection after the last one dropped.
    /// `None` when no reconnect is scheduled.
    pub reconnect_at: Option<Instant>,
    pub tier_list_task: Option<JoinHandle<()>>,
}

impl AppState {
    /// Create the application state.
    ///
    /// Import outcomes are reported on `outcome_tx`; the matching receiver is
    /// passed to `run`.
    pub fn new(
        config: Config,
        service: Arc<dyn LocalService>,
        lifecycle: ConnectionLifecycle,
        outcome_tx: mpsc::Sender<ImportOutcome>,
    ) -> Self {
        let dispatcher = ActionDispatcher::new(Arc::clone(&service)).with_outcomes(outcome_tx);
        AppState {
            config,
            session: SessionStore::new(),
            lifecycle,
            dispatcher,
            service,
            connection_status: ConnectionStatus::Disconnected,
            reconnect_at: None,
            tier_list_task: None,
        }
    }

    /// Post the current champion's rune page for `mode`.
    ///
    /// Returns false when no champion is selected.
    pub fn import_runes(&self, mode: SortMode) -> bool {
        let Some(champion) = self.session.current().champion() else {
            debug!("Rune import requested outside champion select");
            return false;
        };
        let view = projector::project(champion, mode);
        // The request runs on its own; its outcome comes back on the outcome channel.
        drop(
            self.dispatcher
                .import_runes(view.runes.all(), &champion.id, &champion.role),
        );
        true
    }

    /// Post the current champion's starting and full item sets for `mode`.
    pub fn import_items(&self, mode: SortMode) -> bool {
        let Some(champion) = self.session.current().champion() else {
            debug!("Item import requested outside champion select");
            return false;
        };
        let view = projector::project(champion, mode);
        drop(self.dispatcher.import_items(
            view.starting_items,
            view.items,
            &champion.id,
            &champion.role,
        ));
        true
    }

    pub fn cancel_tier_list_task(&mut self) {
        if let Some(task) = self.tier_list_task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Opens the first connection, then listens using `tokio::select!` on:
/// 1. Connection events
/// 2. Session transitions (forwarded to the TUI as snapshots)
/// 3. Import outcomes
/// 4. User commands from the TUI
/// 5. The reconnect timer, when one is scheduled
pub async fn run(
    mut conn_rx: mpsc::Receiver<ConnEvent>,
    mut outcome_rx: mpsc::Receiver<ImportOutcome>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut session_rx = state.session.subscribe();
    let mut outcomes_open = true;

    open_connection(&mut state, &ui_tx).await;

    loop {
        tokio::select! {
            // --- Connection events ---
            event = conn_rx.recv() => {
                match event {
                    Some(event) => handle_conn_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("Connection channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Session transitions ---
            snapshot = session_rx.recv() => {
                match snapshot {
                    Ok(snapshot) => {
                        let _ = ui_tx.send(UiUpdate::Session(Box::new(snapshot))).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Session subscriber lagged by {} transitions", skipped);
                        let snapshot = catch_up(&mut session_rx, &state.session);
                        let _ = ui_tx.send(UiUpdate::Session(Box::new(snapshot))).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Session store closed, shutting down");
                        break;
                    }
                }
            }

            // --- Import outcomes (only poll while the channel is open) ---
            outcome = outcome_rx.recv(), if outcomes_open => {
                match outcome {
                    Some(outcome) => {
                        let _ = ui_tx.send(UiUpdate::ImportFinished(outcome)).await;
                    }
                    None => {
                        info!("Import outcome channel closed");
                        outcomes_open = false;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Scheduled reconnect ---
            _ = tokio::time::sleep_until(state.reconnect_at.unwrap_or_else(Instant::now)),
                if state.reconnect_at.is_some() =>
            {
                state.reconnect_at = None;
                info!("Reconnecting to event source");
                open_connection(&mut state, &ui_tx).await;
            }
        }
    }

    // Cleanup
    state.cancel_tier_list_task();
    state.lifecycle.close().await;
    info!("Application event loop exiting");
    Ok(())
}

/// Skip a lagging subscriber past its backlog and return the latest state.
/// Queued states are older than the snapshot and must not follow it.
fn catch_up(
    session_rx: &mut broadcast::Receiver<SessionState>,
    session: &SessionStore,
) -> SessionState {
    *session_rx = session_rx.resubscribe();
    session.snapshot()
}

/// Drop the session and replace the connection with a fresh one.
async fn open_connection(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    state.reconnect_at = None;
    state.session.reset();
    set_connection_status(state, ConnectionStatus::Connecting, ui_tx).await;
    let generation = state.lifecycle.connect().await;
    info!(
        "Opened event source {} (generation {})",
        state.lifecycle.url(),
        generation
    );
}

async fn set_connection_status(
    state: &mut AppState,
    status: ConnectionStatus,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    state.connection_status = status;
    let _ = ui_tx.send(UiUpdate::ConnectionStatus(status)).await;
}

/// Handle one event from the connection task.
async fn handle_conn_event(
    state: &mut AppState,
    event: ConnEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    // Discard events from connections that have since been replaced.
    if !state.lifecycle.is_current(event.generation()) {
        debug!(
            "Discarding stale connection event (event gen: {}, current gen: {})",
            event.generation(),
            state.lifecycle.generation()
        );
        return;
    }

    match event {
        ConnEvent::Connected { url, .. } => {
            info!("Event source connected: {}", url);
            state.reconnect_at = None;
            set_connection_status(state, ConnectionStatus::Connected, ui_tx).await;
        }
        ConnEvent::Message { text, .. } => handle_message(state, &text),
        ConnEvent::Disconnected { generation } => {
            warn!("Event source disconnected (generation {})", generation);
            state.session.reset();
            set_connection_status(state, ConnectionStatus::Disconnected, ui_tx).await;
            match state.config.reconnect_delay() {
                Some(delay) => {
                    info!("Reconnecting in {:?}", delay);
                    state.reconnect_at = Some(Instant::now() + delay);
                }
                None => info!("Automatic reconnect disabled"),
            }
        }
    }
}

/// Decode one raw message and apply it to the session.
///
/// Nothing here can fail past this point: undecodable messages are logged
/// and dropped with the session untouched.
fn handle_message(state: &mut AppState, raw: &str) {
    let event = match codec::decode(raw) {
        Ok(event) => event,
        Err(e) => {
            warn!("Dropping undecodable message: {}", e);
            return;
        }
    };

    match &event {
        Event::Noop => {
            debug!("Ignoring message of unknown kind");
            return;
        }
        Event::ChampionChange(record) => {
            debug!(
                "Champion select: {} ({}), tile {}, role icon {}",
                record.name,
                record.role,
                assets::champion_tile_url(&record.id),
                assets::role_icon_url(&record.role)
            );
            for (collection, len) in record.short_rune_pages() {
                warn!(
                    "Champion {} has {} runes in {} (expected a full page)",
                    record.name, len, collection
                );
            }
        }
        Event::UserInfo(_) | Event::QuitChampSelect => {}
    }

    if !state.session.apply(event) {
        debug!("Event left session unchanged ({})", state.session.current().label());
    }
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::ImportRunes { mode } => {
            if state.import_runes(mode) {
                let _ = ui_tx.send(UiUpdate::ImportStarted(ImportKind::Runes)).await;
            }
        }
        UserCommand::ImportItems { mode } => {
            if state.import_items(mode) {
                let _ = ui_tx.send(UiUpdate::ImportStarted(ImportKind::Items)).await;
            }
        }
        UserCommand::Reconnect => {
            info!("Manual reconnect requested");
            open_connection(state, ui_tx).await;
        }
        UserCommand::LoadTierList => {
            state.cancel_tier_list_task();
            let _ = ui_tx.send(UiUpdate::TierListLoading).await;
            let service = Arc::clone(&state.service);
            let ui_tx = ui_tx.clone();
            state.tier_list_task = Some(tokio::spawn(async move {
                let update = match tier_list::fetch(service.as_ref()).await {
                    Ok(list) => {
                        info!("Tier list loaded");
                        UiUpdate::TierList(Box::new(list))
                    }
                    Err(e) => {
                        warn!("Tier list fetch failed: {}", e);
                        UiUpdate::TierListError(e.to_string())
                    }
                };
                let _ = ui_tx.send(update).await;
            }));
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use runeforge_core::config::parse_config;
    use runeforge_core::model::UserInfo;
    use runeforge_core::connection::{ConnectionError, Connector};
    use runeforge_core::service::{ServiceError, ServiceResponse};
    use runeforge_core::tier_list::TierList;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Mutex;

    const CONFIG: &str = r#"
        [service]
        host = "127.0.0.1"
        port = 4246
        events_path = "/lcu"

        [connection]
        reconnect_delay_secs = 0
        request_timeout_secs = 10

        [ui]
    "#;

    #[derive(Default)]
    struct RecordingService {
        posts: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl LocalService for RecordingService {
        async fn post_json(
            &self,
            path: &str,
            body: Value,
        ) -> Result<ServiceResponse, ServiceError> {
            self.posts.lock().unwrap().push((path.to_string(), body));
            Ok(ServiceResponse {
                status: 200,
                body: String::new(),
            })
        }

        async fn fetch_tier_list(&self) -> Result<TierList, ServiceError> {
            Ok(TierList::default())
        }
    }

    struct IdleConnector;

    #[async_trait]
    impl Connector for IdleConnector {
        async fn run(
            &self,
            _url: &str,
            _generation: u64,
            _tx: &mpsc::Sender<ConnEvent>,
        ) -> Result<(), ConnectionError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn test_state() -> (AppState, Arc<RecordingService>, mpsc::Receiver<ImportOutcome>) {
        let config = parse_config(CONFIG, Path::new("test")).unwrap();
        let service = Arc::new(RecordingService::default());
        let (conn_tx, _conn_rx) = mpsc::channel(8);
        let lifecycle = ConnectionLifecycle::new(config.events_url(), Arc::new(IdleConnector), conn_tx);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        let state = AppState::new(config, service.clone(), lifecycle, outcome_tx);
        (state, service, outcome_rx)
    }

    fn champion_json() -> String {
        let runes: Vec<Value> = (1..=9).map(|id| json!({"Id": id})).collect();
        let win_runes: Vec<Value> = (11..=19).map(|id| json!({"Id": id})).collect();
        json!({
            "type": 1,
            "id": "103",
            "name": "Ahri",
            "role": "MID",
            "runesByPopularity": runes,
            "runesByWinRate": win_runes,
            "itemsByPopularity": [{"Id": 3020}],
            "itemsByWinRate": [{"Id": 6655}],
            "startingItemsByPopularity": [{"Id": 1056}],
            "startingItemsByWinRate": [{"Id": 2003}],
        })
        .to_string()
    }

    #[tokio::test]
    async fn messages_drive_the_session() {
        let (mut state, _, _) = test_state();

        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);
        assert!(matches!(state.session.current(), SessionState::Identified(u) if u.username == "Fry"));

        handle_message(&mut state, &champion_json());
        assert_eq!(state.session.current().label(), "champ-select");

        handle_message(&mut state, r#"{"type":2}"#);
        assert!(matches!(state.session.current(), SessionState::Identified(u) if u.icon_id == "42"));
    }

    #[tokio::test]
    async fn malformed_and_unknown_messages_leave_session_untouched() {
        let (mut state, _, _) = test_state();
        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);
        let before = state.session.snapshot();

        handle_message(&mut state, "{not json");
        handle_message(&mut state, r#"{"type":99,"whatever":true}"#);
        handle_message(&mut state, r#"{"username":"NoType"}"#);

        assert_eq!(state.session.snapshot(), before);
    }

    #[tokio::test]
    async fn import_runes_uses_requested_mode() {
        let (mut state, service, mut outcome_rx) = test_state();
        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);
        handle_message(&mut state, &champion_json());

        assert!(state.import_runes(SortMode::ByWinRate));
        let outcome = outcome_rx.recv().await.unwrap();
        assert_eq!(outcome.kind, ImportKind::Runes);

        let posts = service.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1["runes"], json!([11, 12, 13, 14, 15, 16, 17, 18, 19]));
        assert_eq!(posts[0].1["champion_id"], "103");
        assert_eq!(posts[0].1["role"], "MID");
    }

    #[tokio::test]
    async fn import_items_sends_both_lists_of_one_mode() {
        let (mut state, service, mut outcome_rx) = test_state();
        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);
        handle_message(&mut state, &champion_json());

        assert!(state.import_items(SortMode::ByPopularity));
        outcome_rx.recv().await.unwrap();

        let posts = service.posts.lock().unwrap().clone();
        assert_eq!(posts[0].1["items"], json!([3020]));
        assert_eq!(posts[0].1["starting_items"], json!([1056]));
    }

    #[tokio::test]
    async fn imports_need_a_champion() {
        let (state, service, _) = test_state();
        assert!(!state.import_runes(SortMode::ByPopularity));
        assert!(!state.import_items(SortMode::ByPopularity));
        assert!(service.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_stale_backlog() {
        let mut store = SessionStore::new();
        let mut rx = store.subscribe();
        for i in 0..100 {
            store.apply(Event::UserInfo(UserInfo {
                username: format!("user{i}"),
                icon_id: "1".into(),
            }));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));

        let latest = catch_up(&mut rx, &store);
        assert_eq!(latest.user().unwrap().username, "user99");
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));

        // Later transitions still arrive.
        store.apply(Event::QuitChampSelect);
        store.apply(Event::UserInfo(UserInfo {
            username: "Fry".into(),
            icon_id: "42".into(),
        }));
        assert_eq!(rx.recv().await.unwrap().user().unwrap().username, "Fry");
    }

    #[tokio::test]
    async fn disconnect_resets_session() {
        let (mut state, _, _) = test_state();
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        let generation = state.lifecycle.connect().await;

        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);
        handle_conn_event(&mut state, ConnEvent::Disconnected { generation }, &ui_tx).await;

        assert_eq!(*state.session.current(), SessionState::Idle);
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        // Reconnect delay 0 means nothing is scheduled.
        assert!(state.reconnect_at.is_none());
        assert!(matches!(
            ui_rx.recv().await.unwrap(),
            UiUpdate::ConnectionStatus(ConnectionStatus::Disconnected)
        ));
        state.lifecycle.close().await;
    }

    #[tokio::test]
    async fn disconnect_schedules_reconnect_when_enabled() {
        let (mut state, _, _) = test_state();
        state.config.connection.reconnect_delay_secs = 3;
        let (ui_tx, _ui_rx) = mpsc::channel(16);
        let generation = state.lifecycle.connect().await;

        handle_conn_event(&mut state, ConnEvent::Disconnected { generation }, &ui_tx).await;
        assert!(state.reconnect_at.is_some());

        handle_conn_event(
            &mut state,
            ConnEvent::Connected {
                generation,
                url: "ws://127.0.0.1:4246/lcu".into(),
            },
            &ui_tx,
        )
        .await;
        assert!(state.reconnect_at.is_none());
        state.lifecycle.close().await;
    }

    #[tokio::test]
    async fn stale_generation_events_are_ignored() {
        let (mut state, _, _) = test_state();
        let (ui_tx, _ui_rx) = mpsc::channel(16);
        state.lifecycle.connect().await;
        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);
        let current = state.lifecycle.connect().await;

        handle_conn_event(&mut state, ConnEvent::Disconnected { generation: current - 1 }, &ui_tx).await;
        handle_conn_event(
            &mut state,
            ConnEvent::Message {
                generation: current - 1,
                text: r#"{"type":0,"username":"Bender","iconId":"1"}"#.into(),
            },
            &ui_tx,
        )
        .await;

        assert_eq!(state.session.current().user().unwrap().username, "Fry");
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        state.lifecycle.close().await;
    }

    #[tokio::test]
    async fn load_tier_list_reports_result() {
        let (mut state, _, _) = test_state();
        let (ui_tx, mut ui_rx) = mpsc::channel(16);

        handle_user_command(&mut state, UserCommand::LoadTierList, &ui_tx).await;

        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::TierListLoading));
        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::TierList(list) if list.is_empty()));
    }

    #[tokio::test]
    async fn manual_reconnect_resets_session_and_bumps_generation() {
        let (mut state, _, _) = test_state();
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        let first = state.lifecycle.connect().await;
        handle_message(&mut state, r#"{"type":0,"username":"Fry","iconId":"42"}"#);

        handle_user_command(&mut state, UserCommand::Reconnect, &ui_tx).await;

        assert_eq!(state.lifecycle.generation(), first + 1);
        assert_eq!(state.session.snapshot(), SessionState::Idle);
        assert!(matches!(
            ui_rx.recv().await.unwrap(),
            UiUpdate::ConnectionStatus(ConnectionStatus::Connecting)
        ));
        state.lifecycle.close().await;
    }
}
