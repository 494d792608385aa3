// Event-source connection lifecycle.
//
// Exactly one connection is live at a time. `ConnectionLifecycle::connect`
// closes (and awaits) the previous connection before opening the next, and a
// `ConnectionHandle` that is dropped without `close()` aborts its task, so two
// connections can never feed the session at once. Every event carries the
// generation of the connection that produced it; consumers discard events
// from generations that are no longer current.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Events emitted by a connection to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnEvent {
    /// The event source accepted the connection.
    Connected { generation: u64, url: String },
    /// A text message was received (raw JSON string).
    Message { generation: u64, text: String },
    /// The connection ended, failed to open, or was closed by us.
    Disconnected { generation: u64 },
}

impl ConnEvent {
    pub fn generation(&self) -> u64 {
        match self {
            ConnEvent::Connected { generation, .. }
            | ConnEvent::Message { generation, .. }
            | ConnEvent::Disconnected { generation } => *generation,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("event channel closed")]
    ChannelClosed,
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Opens one event-source connection and drives it to completion.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn run(
        &self,
        url: &str,
        generation: u64,
        tx: &mpsc::Sender<ConnEvent>,
    ) -> Result<(), ConnectionError>;
}

/// WebSocket connector backed by tokio-tungstenite.
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn run(
        &self,
        url: &str,
        generation: u64,
        tx: &mpsc::Sender<ConnEvent>,
    ) -> Result<(), ConnectionError> {
        let (ws_stream, _response) =
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|source| ConnectionError::Connect {
                    url: url.to_string(),
                    source,
                })?;
        info!("Connected to event source {url} (generation {generation})");

        tx.send(ConnEvent::Connected {
            generation,
            url: url.to_string(),
        })
        .await
        .map_err(|_| ConnectionError::ChannelClosed)?;

        process_message_stream(ws_stream, tx, generation, url)
            .await
            .map_err(|()| ConnectionError::ChannelClosed)
    }
}

/// Forward text payloads from any WebSocket message stream through `tx`.
///
/// Stops at a close frame or a read error. Returns `Err(())` if the channel
/// is closed (receiver dropped), signalling the caller to stop.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<ConnEvent>,
    generation: u64,
    url: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let event = ConnEvent::Message {
                    generation,
                    text: text.to_string(),
                };
                if tx.send(event).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Event source {url} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {url}: {e}");
                break;
            }
            _ => {
                // Binary, Ping, Pong and raw frames carry no events.
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ConnectionHandle
// ---------------------------------------------------------------------------

/// A live connection task. Dropping the handle aborts the task.
pub struct ConnectionHandle {
    generation: u64,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Spawn a task running `connector` against `url`.
    ///
    /// The task ends by sending `Disconnected` for its generation when the
    /// source closes or fails. Once `close()` is requested the event is only
    /// sent if the channel has room.
    pub fn spawn(
        connector: Arc<dyn Connector>,
        url: String,
        generation: u64,
        tx: mpsc::Sender<ConnEvent>,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tokio::select! {
                result = connector.run(&url, generation, &tx) => {
                    match result {
                        Ok(()) => info!("Event source {url} closed (generation {generation})"),
                        Err(e) => warn!("Event source connection failed: {e}"),
                    }
                    // The closer may be the receiver, so a close request
                    // wins over a send stuck on a full channel.
                    tokio::select! {
                        _ = tx.send(ConnEvent::Disconnected { generation }) => {}
                        _ = &mut shutdown_rx => {
                            debug!("Close requested before disconnect of generation {generation} was delivered");
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("Closing event source {url} (generation {generation})");
                    // The closer may be the receiver and be waiting on us, so
                    // never block on a full channel here.
                    let _ = tx.try_send(ConnEvent::Disconnected { generation });
                }
            }
        });
        ConnectionHandle {
            generation,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Close the connection and wait for its task to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Connection task {} ended abnormally: {}", self.generation, e);
                }
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionLifecycle
// ---------------------------------------------------------------------------

/// Owner of the single event-source connection.
pub struct ConnectionLifecycle {
    url: String,
    connector: Arc<dyn Connector>,
    tx: mpsc::Sender<ConnEvent>,
    generation: u64,
    current: Option<ConnectionHandle>,
}

impl ConnectionLifecycle {
    pub fn new(url: impl Into<String>, connector: Arc<dyn Connector>, tx: mpsc::Sender<ConnEvent>) -> Self {
        ConnectionLifecycle {
            url: url.into(),
            connector,
            tx,
            generation: 0,
            current: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Generation of the most recently opened connection (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current.is_some() && generation == self.generation
    }

    /// Tear down the current connection, if any, then open a new one.
    pub async fn connect(&mut self) -> u64 {
        self.close().await;
        self.generation += 1;
        debug!("Opening event source {} (generation {})", self.url, self.generation);
        self.current = Some(ConnectionHandle::spawn(
            Arc::clone(&self.connector),
            self.url.clone(),
            self.generation,
            self.tx.clone(),
        ));
        self.generation
    }

    /// Close the current connection and wait until it is gone.
    pub async fn close(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.close().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
