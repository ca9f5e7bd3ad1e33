mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frontdesk_core::{
    create_notifier, load_config, validate_config, AutoCloseScheduler, Clock, Notification,
    SqliteTicketStore, SystemClock, TicketLifecycle, TicketPolicy, TicketStore,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the notification channel
const NOTIFY_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("FRONTDESK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // All timestamp writes and idle comparisons share this clock
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Create SQLite ticket store
    let policy = TicketPolicy {
        max_open_per_user: config.tickets.max_open_per_user,
    };
    let ticket_store: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path, policy, Arc::clone(&clock))
            .context("Failed to create ticket store")?,
    );
    info!("Ticket store initialized");

    // Create notification channel and spawn the forwarder task
    let (notifier, notifications) = create_notifier(NOTIFY_BUFFER_SIZE);
    let forwarder_handle = tokio::spawn(forward_notifications(notifications));

    // Create the state machine driver
    let lifecycle = Arc::new(TicketLifecycle::new(
        Arc::clone(&ticket_store),
        notifier.clone(),
        Arc::clone(&clock),
    ));

    // Create and start the auto-close scheduler if enabled
    let scheduler = if config.autoclose.enabled {
        let scheduler = Arc::new(AutoCloseScheduler::new(
            config.autoclose.clone(),
            Arc::clone(&ticket_store),
            Arc::clone(&lifecycle),
        ));
        scheduler.start().await;
        info!("Auto-close scheduler started");
        Some(scheduler)
    } else {
        info!("Auto-close scheduler disabled in config");
        None
    };

    // Create app state
    let app_state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&ticket_store),
        Arc::clone(&lifecycle),
        scheduler.clone(),
    ));

    // Create router
    let app = create_router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {} (version {})", addr, VERSION);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop scheduler if running
    if let Some(ref scheduler) = scheduler {
        info!("Stopping auto-close scheduler...");
        scheduler.stop().await;
        info!("Auto-close scheduler stopped");
    }

    info!("Server shutting down...");

    // Drop all holders of NotifierHandle so the forwarder's channel closes.
    // The lifecycle holds a clone, and the scheduler holds the lifecycle.
    drop(scheduler);
    drop(lifecycle);
    drop(notifier);

    // Wait for the forwarder to drain remaining notifications
    let _ = forwarder_handle.await;
    info!("Notification forwarder stopped");

    Ok(())
}

/// Drain the notification channel.
///
/// The chat transport layer hooks in here; a stand-alone server just logs
/// each delivery. Delivery failures never reach back into the engine.
async fn forward_notifications(mut rx: mpsc::Receiver<Notification>) {
    info!("Notification forwarder started");

    while let Some(notification) = rx.recv().await {
        info!(
            recipient = notification.recipient.as_str(),
            ticket_id = notification.event.ticket_id(),
            kind = notification.event.event_type(),
            "Notification"
        );
    }

    info!("Notification forwarder shutting down");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
