//! Auto-close scheduler implementation.
//!
//! Periodically scans the store for open tickets whose last message came from
//! support and that have been idle past the configured threshold, then drives
//! each one through the same state-machine transition an admin close uses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::lifecycle::TicketLifecycle;
use crate::metrics;
use crate::ticket::{TicketError, TicketStore};

use super::config::AutoCloseConfig;

/// Outcome of one scan-and-close pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Candidates returned by the idle scan.
    pub examined: usize,
    /// Tickets closed this pass.
    pub closed: usize,
    /// Candidates skipped as benign races (replied, closed, or gone).
    pub skipped: usize,
    /// Candidates that failed with a real error.
    pub failed: usize,
}

/// The auto-close scheduler.
///
/// Holds no ticket state of its own: each tick is a fresh query against the
/// store, and every close attempt re-validates its preconditions inside the
/// store's per-ticket gate.
pub struct AutoCloseScheduler {
    config: AutoCloseConfig,
    store: Arc<dyn TicketStore>,
    lifecycle: Arc<TicketLifecycle>,

    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl AutoCloseScheduler {
    /// Create a new scheduler with injected dependencies.
    pub fn new(
        config: AutoCloseConfig,
        store: Arc<dyn TicketStore>,
        lifecycle: Arc<TicketLifecycle>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            store,
            lifecycle,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the scheduler (spawns the background loop).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Auto-close scheduler already running");
            return;
        }

        info!(
            interval_secs = self.config.interval_secs,
            after_hours = self.config.after_hours,
            "Starting auto-close scheduler"
        );

        let running = Arc::clone(&self.running);
        let store = Arc::clone(&self.store);
        let lifecycle = Arc::clone(&self.lifecycle);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Auto-close loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Auto-close loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let summary = Self::run_tick(&store, &lifecycle, &config).await;
                        if summary.closed > 0 || summary.failed > 0 {
                            info!(
                                examined = summary.examined,
                                closed = summary.closed,
                                skipped = summary.skipped,
                                failed = summary.failed,
                                "Auto-close pass finished"
                            );
                        } else {
                            debug!(examined = summary.examined, "Auto-close pass finished, nothing to close");
                        }
                    }
                }
            }
            info!("Auto-close loop stopped");
        });
    }

    /// Stop the scheduler gracefully.
    ///
    /// No further ticks are scheduled; an in-progress tick finishes its
    /// current per-ticket attempt (which is atomic in the store) and exits.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Auto-close scheduler not running");
            return;
        }

        info!("Stopping auto-close scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Whether the background loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run a single scan-and-close pass immediately.
    ///
    /// Used by the background loop; also the entry point for tests driving
    /// the scheduler against a mock clock without real sleeping.
    pub async fn run_tick_now(&self) -> TickSummary {
        Self::run_tick(&self.store, &self.lifecycle, &self.config).await
    }

    async fn run_tick(
        store: &Arc<dyn TicketStore>,
        lifecycle: &Arc<TicketLifecycle>,
        config: &AutoCloseConfig,
    ) -> TickSummary {
        metrics::AUTOCLOSE_TICKS.inc();

        let threshold = config.idle_threshold();
        let candidates = match store.list_idle_support_last(threshold) {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Failed to scan for idle tickets: {}", e);
                return TickSummary::default();
            }
        };

        metrics::AUTOCLOSE_CANDIDATES
            .with_label_values(&[])
            .observe(candidates.len() as f64);

        let mut summary = TickSummary {
            examined: candidates.len(),
            ..Default::default()
        };

        // Each ticket's close attempt is independent: one failure never
        // aborts the batch.
        for ticket in candidates {
            match lifecycle.auto_close(&ticket.id, threshold).await {
                Ok(_) => {
                    summary.closed += 1;
                }
                Err(TicketError::NotFound(_)) => {
                    debug!(ticket_id = %ticket.id, "Ticket gone since scan, skipping");
                    summary.skipped += 1;
                }
                Err(TicketError::InvalidTransition { .. }) | Err(TicketError::TicketClosed(_)) => {
                    // The user replied or the ticket closed between scan and
                    // apply: the re-check inside the store gate caught it
                    debug!(ticket_id = %ticket.id, "Ticket no longer eligible, skipping");
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(ticket_id = %ticket.id, "Failed to auto-close ticket: {}", e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
