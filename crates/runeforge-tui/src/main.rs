// Runeforge entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the service client and the connection lifecycle
// 4. Create mpsc channels
// 5. Spawn app logic task
// 6. Run the TUI until the user quits
// 7. Cleanup on exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use runeforge_core::config;
use runeforge_core::connection::{ConnectionLifecycle, TungsteniteConnector};
use runeforge_core::service::HttpService;
use runeforge_tui::app;
use runeforge_tui::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Runeforge starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: events at {}, service at {}",
        config.events_url(),
        config.service_url()
    );

    // 3. Service client and connection lifecycle
    let service = HttpService::new(config.service_url(), config.request_timeout())
        .context("failed to build HTTP client")?;

    // 4. Channels
    let (conn_tx, conn_rx) = mpsc::channel(256);
    let (outcome_tx, outcome_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let lifecycle = ConnectionLifecycle::new(
        config.events_url(),
        Arc::new(TungsteniteConnector),
        conn_tx,
    );
    let view_state = tui::ViewState::new(config.ui.default_sort, config.ui.default_role);
    let app_state = app::AppState::new(config, Arc::new(service), lifecycle, outcome_tx);

    // 5. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(conn_rx, outcome_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 6. Run the TUI event loop (blocking until user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx, view_state).await {
        error!("TUI error: {}", e);
    }

    // 7. Cleanup: the app closes the connection once the command channel is
    // gone; give it a moment.
    if tokio::time::timeout(Duration::from_secs(5), app_handle)
        .await
        .is_err()
    {
        error!("Application loop did not stop in time");
    }

    info!("Runeforge shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("runeforge.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("runeforge=info,runeforge_tui=info,runeforge_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
