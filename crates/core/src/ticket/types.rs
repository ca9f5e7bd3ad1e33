//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message or action in a ticket thread.
///
/// Deliberately a closed two-variant enum: the engine only distinguishes the
/// requesting party from the support side, never individual agents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    User,
    Support,
}

impl Actor {
    /// Returns the actor as a string (for storage and metric labels).
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::User => "user",
            Actor::Support => "support",
        }
    }

    /// The other side of the conversation.
    pub fn counterpart(&self) -> Actor {
        match self {
            Actor::User => Actor::Support,
            Actor::Support => Actor::User,
        }
    }

    /// Parse from the stored string form.
    pub fn parse(s: &str) -> Option<Actor> {
        match s {
            "user" => Some(Actor::User),
            "support" => Some(Actor::Support),
            _ => None,
        }
    }
}

/// Current status of a ticket.
///
/// Status flow:
/// ```text
/// New -> InProgress -> Closed
///   \________________/
/// ```
///
/// `Closed` is terminal: no event may mutate a closed ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Ticket created, not yet picked up by support.
    New,
    /// Support has engaged with the ticket.
    InProgress,
    /// Ticket closed (terminal).
    Closed,
}

impl TicketStatus {
    /// Returns true if this is the terminal state.
    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }

    /// Returns true if the ticket still accepts events.
    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    /// Returns the status as a string (for storage and filtering).
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    /// Parse from the stored string form.
    pub fn parse(s: &str) -> Option<TicketStatus> {
        match s {
            "new" => Some(TicketStatus::New),
            "in_progress" => Some(TicketStatus::InProgress),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

/// Why a ticket reached `Closed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// An administrator closed the ticket.
    ManualAdmin,
    /// The auto-close scheduler closed it after the idle threshold.
    AutoTimeout,
}

impl CloseReason {
    /// Returns the reason as a string (for storage and metric labels).
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ManualAdmin => "manual_admin",
            CloseReason::AutoTimeout => "auto_timeout",
        }
    }

    /// Parse from the stored string form.
    pub fn parse(s: &str) -> Option<CloseReason> {
        match s {
            "manual_admin" => Some(CloseReason::ManualAdmin),
            "auto_timeout" => Some(CloseReason::AutoTimeout),
            _ => None,
        }
    }
}

/// One entry in a ticket's message thread.
///
/// The thread is append-only: entries are never mutated or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadMessage {
    /// Who sent the message.
    pub sender: Actor,
    /// When the message was recorded.
    pub sent_at: DateTime<Utc>,
    /// Message text.
    pub body: String,
}

/// A support ticket: one conversation between a user and the support side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier (UUID).
    pub id: String,

    /// Chat-platform identifier of the requesting party.
    pub user_id: i64,

    /// Current status.
    pub status: TicketStatus,

    /// Who sent the most recent message in the thread. Updated by message
    /// events only; taking a ticket without replying does not change it.
    pub last_actor: Actor,

    /// When the ticket was created.
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp. The auto-close idle check compares against
    /// this field.
    pub updated_at: DateTime<Utc>,

    /// Set once, on transition into `Closed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Set only when `status` becomes `Closed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<CloseReason>,

    /// Append-only message thread.
    pub messages: Vec<ThreadMessage>,

    /// Per-record write counter, bumped by every committed mutation.
    #[serde(default)]
    pub version: i64,
}

impl Ticket {
    /// Returns true if the ticket still accepts events.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
