//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ticket lifecycle (created, closed by reason, messages, rejections)
//! - Auto-close scheduler (ticks, candidates per tick)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Lifecycle Metrics
// =============================================================================

/// Tickets created total.
pub static TICKETS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("frontdesk_tickets_created_total", "Total tickets created").unwrap()
});

/// Tickets closed total by reason.
pub static TICKETS_CLOSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("frontdesk_tickets_closed_total", "Total tickets closed"),
        &["reason"], // "manual_admin", "auto_timeout"
    )
    .unwrap()
});

/// Thread messages recorded by sender role.
pub static MESSAGES_RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "frontdesk_messages_recorded_total",
            "Total thread messages recorded",
        ),
        &["sender"], // "user", "support"
    )
    .unwrap()
});

/// Events rejected by the state machine, by event kind.
pub static TRANSITIONS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "frontdesk_transitions_rejected_total",
            "Events rejected by the ticket state machine",
        ),
        &["event"],
    )
    .unwrap()
});

// =============================================================================
// Auto-Close Scheduler Metrics
// =============================================================================

/// Auto-close scan passes executed.
pub static AUTOCLOSE_TICKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "frontdesk_autoclose_ticks_total",
        "Total auto-close scan passes",
    )
    .unwrap()
});

/// Candidates found per auto-close pass.
pub static AUTOCLOSE_CANDIDATES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "frontdesk_autoclose_candidates",
            "Number of idle tickets found per auto-close pass",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKETS_CREATED.clone()),
        Box::new(TICKETS_CLOSED.clone()),
        Box::new(MESSAGES_RECORDED.clone()),
        Box::new(TRANSITIONS_REJECTED.clone()),
        Box::new(AUTOCLOSE_TICKS.clone()),
        Box::new(AUTOCLOSE_CANDIDATES.clone()),
    ]
}
