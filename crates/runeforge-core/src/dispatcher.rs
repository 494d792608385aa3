// Fire-and-forget import actions.
//
// Each import builds its payload from the build view the user is looking at,
// posts it on a spawned task and only logs the answer. Failures never reach
// the session state; an optional channel reports outcomes for display.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::model::{Item, Rune};
use crate::service::{LocalService, IMPORT_ITEMS_PATH, IMPORT_RUNES_PATH};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRunesRequest {
    pub runes: Vec<u16>,
    pub champion_id: String,
    pub role: String,
}

impl ImportRunesRequest {
    pub fn new(runes: &[Rune], champion_id: &str, role: &str) -> Self {
        ImportRunesRequest {
            runes: runes.iter().map(|r| r.id).collect(),
            champion_id: champion_id.to_string(),
            role: role.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportItemsRequest {
    pub items: Vec<u16>,
    pub starting_items: Vec<u16>,
    pub champion_id: String,
    pub role: String,
}

impl ImportItemsRequest {
    pub fn new(starting_items: &[Item], items: &[Item], champion_id: &str, role: &str) -> Self {
        ImportItemsRequest {
            items: items.iter().map(|i| i.id).collect(),
            starting_items: starting_items.iter().map(|i| i.id).collect(),
            champion_id: champion_id.to_string(),
            role: role.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Runes,
    Items,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Runes => f.write_str("runes"),
            ImportKind::Items => f.write_str("items"),
        }
    }
}

/// Result of one import request: the HTTP status, or the transport error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub kind: ImportKind,
    pub result: Result<u16, String>,
}

// ---------------------------------------------------------------------------
// ActionDispatcher
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ActionDispatcher {
    service: Arc<dyn LocalService>,
    outcomes: Option<mpsc::Sender<ImportOutcome>>,
}

impl ActionDispatcher {
    pub fn new(service: Arc<dyn LocalService>) -> Self {
        ActionDispatcher {
            service,
            outcomes: None,
        }
    }

    /// Also report each finished request on `tx`.
    pub fn with_outcomes(mut self, tx: mpsc::Sender<ImportOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    /// Post the rune page. The returned handle may be dropped.
    pub fn import_runes(&self, runes: &[Rune], champion_id: &str, role: &str) -> JoinHandle<()> {
        let request = ImportRunesRequest::new(runes, champion_id, role);
        info!(
            "Importing {} runes for champion {} ({})",
            request.runes.len(),
            request.champion_id,
            request.role
        );
        self.spawn_post(ImportKind::Runes, IMPORT_RUNES_PATH, &request)
    }

    /// Post the starting and full item sets. The returned handle may be dropped.
    pub fn import_items(
        &self,
        starting_items: &[Item],
        items: &[Item],
        champion_id: &str,
        role: &str,
    ) -> JoinHandle<()> {
        let request = ImportItemsRequest::new(starting_items, items, champion_id, role);
        info!(
            "Importing {} starting + {} items for champion {} ({})",
            request.starting_items.len(),
            request.items.len(),
            request.champion_id,
            request.role
        );
        self.spawn_post(ImportKind::Items, IMPORT_ITEMS_PATH, &request)
    }

    fn spawn_post<T: Serialize>(
        &self,
        kind: ImportKind,
        path: &'static str,
        request: &T,
    ) -> JoinHandle<()> {
        let body = serde_json::to_value(request);
        let service = Arc::clone(&self.service);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let result = match body {
                Ok(body) => match service.post_json(path, body).await {
                    Ok(response) if response.is_success() => {
                        info!(
                            "Import {} answered {}: {}",
                            kind, response.status, response.body
                        );
                        Ok(response.status)
                    }
                    Ok(response) => {
                        warn!(
                            "Import {} rejected with {}: {}",
                            kind, response.status, response.body
                        );
                        Ok(response.status)
                    }
                    Err(e) => {
                        warn!("Import {} failed: {}", kind, e);
                        Err(e.to_string())
                    }
                },
                Err(e) => {
                    warn!("Import {} payload could not be encoded: {}", kind, e);
                    Err(e.to_string())
                }
            };
            if let Some(tx) = outcomes {
                let _ = tx.send(ImportOutcome { kind, result }).await;
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
