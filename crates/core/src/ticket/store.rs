//! Ticket storage trait and types.

use chrono::Duration;
use serde::Serialize;
use thiserror::Error;

use crate::ticket::{Ticket, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Referenced ticket does not exist.
    #[error("ticket not found: {0}")]
    NotFound(String),

    /// The per-user open-ticket cap forbids creating another ticket.
    #[error("user {user_id} already has {open} open ticket(s), limit is {limit}")]
    DuplicateOpenTicket { user_id: i64, open: i64, limit: u32 },

    /// An event precondition was not met.
    #[error("cannot apply {event} to ticket {ticket_id}: status is {status}")]
    InvalidTransition {
        ticket_id: String,
        event: &'static str,
        status: &'static str,
    },

    /// The ticket is closed and accepts no further events.
    #[error("ticket {0} is closed")]
    TicketClosed(String),

    /// A concurrent writer invalidated this mutation.
    #[error("concurrent update conflict on ticket {0}")]
    Conflict(String),

    /// Storage backend error.
    #[error("database error: {0}")]
    Database(String),
}

/// Request to create a new ticket.
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    /// Requesting party.
    pub user_id: i64,
    /// The message that opens the ticket.
    pub initial_message: String,
}

/// Per-user open-ticket policy enforced by [`TicketStore::create`].
#[derive(Debug, Clone, Copy)]
pub struct TicketPolicy {
    /// Maximum simultaneously open tickets per user (0 = unlimited).
    pub max_open_per_user: u32,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            max_open_per_user: 1,
        }
    }
}

/// Filter for querying tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Filter by status.
    pub status: Option<TicketStatus>,
    /// Filter by requesting party.
    pub user_id: Option<i64>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            user_id: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by status.
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by requesting party.
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Counts reported by [`TicketStore::stats`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreStats {
    pub total: i64,
    pub new: i64,
    pub in_progress: i64,
    pub closed: i64,
    pub messages: i64,
}

/// A single atomic mutation applied under the store's per-ticket gate.
///
/// The closure sees the current record and may reject the mutation by
/// returning an error; nothing is written in that case. Preconditions must be
/// re-checked inside the closure, never trusted from an earlier read.
pub type TicketMutation<'a> = Box<dyn FnOnce(&mut Ticket) -> Result<(), TicketError> + Send + 'a>;

/// Trait for ticket storage backends.
///
/// The store is the sole owner of ticket records. `update` guarantees
/// at-most-one in-flight mutation per ticket id; mutations on different ids
/// proceed independently.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket with its opening message.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Ticket, TicketError>;

    /// Apply a mutation atomically and return the updated record.
    ///
    /// Refreshes `updated_at` and bumps `version` on success.
    fn update(&self, id: &str, mutation: TicketMutation<'_>) -> Result<Ticket, TicketError>;

    /// List tickets matching the filter, newest first.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Open tickets whose last message came from support and that have been
    /// idle for at least `older_than`. Scan used by the auto-close scheduler;
    /// eligibility is re-checked at apply time.
    fn list_idle_support_last(&self, older_than: Duration) -> Result<Vec<Ticket>, TicketError>;

    /// Aggregate counts over all tickets.
    fn stats(&self) -> Result<StoreStats, TicketError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder() {
        let filter = TicketFilter::new()
            .with_status(TicketStatus::New)
            .with_user(7)
            .with_limit(10)
            .with_offset(20);
        assert_eq!(filter.status, Some(TicketStatus::New));
        assert_eq!(filter.user_id, Some(7));
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 20);
    }

    #[test]
    fn test_filter_defaults() {
        let filter = TicketFilter::new();
        assert!(filter.status.is_none());
        assert!(filter.user_id.is_none());
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn test_policy_default_is_one_open_ticket() {
        assert_eq!(TicketPolicy::default().max_open_per_user, 1);
    }

    #[test]
    fn test_error_display() {
        let err = TicketError::NotFound("t-1".to_string());
        assert_eq!(err.to_string(), "ticket not found: t-1");

        let err = TicketError::InvalidTransition {
            ticket_id: "t-2".to_string(),
            event: "admin_takes",
            status: "in_progress",
        };
        assert_eq!(
            err.to_string(),
            "cannot apply admin_takes to ticket t-2: status is in_progress"
        );

        let err = TicketError::DuplicateOpenTicket {
            user_id: 9,
            open: 1,
            limit: 1,
        };
        assert_eq!(
            err.to_string(),
            "user 9 already has 1 open ticket(s), limit is 1"
        );
    }
}
