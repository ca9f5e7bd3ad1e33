//! Inbound ticket events and the transition rules between statuses.

use chrono::{DateTime, Duration, Utc};

use crate::ticket::{Actor, CloseReason, ThreadMessage, Ticket, TicketError, TicketStatus};

/// An inbound event to be applied to a ticket.
#[derive(Debug, Clone)]
pub enum TicketEvent {
    /// The requesting party sent a message.
    UserMessage { body: String },
    /// An administrator took the ticket without replying.
    AdminTakes,
    /// An administrator replied.
    AdminMessage { body: String },
    /// An administrator closed the ticket.
    AdminClose,
    /// The scheduler found the ticket idle past the threshold.
    AutoCloseTimeout { idle_threshold: Duration },
}

impl TicketEvent {
    /// Returns the event kind as a string (for errors and metric labels).
    pub fn name(&self) -> &'static str {
        match self {
            TicketEvent::UserMessage { .. } => "user_message",
            TicketEvent::AdminTakes => "admin_takes",
            TicketEvent::AdminMessage { .. } => "admin_message",
            TicketEvent::AdminClose => "admin_close",
            TicketEvent::AutoCloseTimeout { .. } => "auto_close_timeout",
        }
    }
}

/// Apply `event` to `ticket`, enforcing the transition table.
///
/// Runs inside the store's per-ticket gate, so the record it sees is current;
/// every precondition is checked here regardless of what the caller observed
/// earlier. `ticket.updated_at` still holds the previous mutation time, which
/// is exactly what the auto-close idle check compares against.
pub fn apply_event(
    ticket: &mut Ticket,
    event: &TicketEvent,
    now: DateTime<Utc>,
) -> Result<(), TicketError> {
    if ticket.status.is_closed() {
        return Err(TicketError::TicketClosed(ticket.id.clone()));
    }

    match event {
        TicketEvent::UserMessage { body } => {
            ticket.messages.push(ThreadMessage {
                sender: Actor::User,
                sent_at: now,
                body: body.clone(),
            });
            ticket.last_actor = Actor::User;
        }

        TicketEvent::AdminTakes => {
            if ticket.status != TicketStatus::New {
                return Err(invalid(ticket, event));
            }
            // Taking is not a message: last_actor stays as it was
            ticket.status = TicketStatus::InProgress;
        }

        TicketEvent::AdminMessage { body } => {
            ticket.messages.push(ThreadMessage {
                sender: Actor::Support,
                sent_at: now,
                body: body.clone(),
            });
            if ticket.status == TicketStatus::New {
                ticket.status = TicketStatus::InProgress;
            }
            ticket.last_actor = Actor::Support;
        }

        TicketEvent::AdminClose => {
            close(ticket, CloseReason::ManualAdmin, now);
        }

        TicketEvent::AutoCloseTimeout { idle_threshold } => {
            if ticket.last_actor != Actor::Support || now - ticket.updated_at < *idle_threshold {
                return Err(invalid(ticket, event));
            }
            close(ticket, CloseReason::AutoTimeout, now);
        }
    }

    Ok(())
}

fn close(ticket: &mut Ticket, reason: CloseReason, now: DateTime<Utc>) {
    ticket.status = TicketStatus::Closed;
    ticket.closed_reason = Some(reason);
    ticket.closed_at = Some(now);
}

fn invalid(ticket: &Ticket, event: &TicketEvent) -> TicketError {
    TicketError::InvalidTransition {
        ticket_id: ticket.id.clone(),
        event: event.name(),
        status: ticket.status.as_str(),
    }
}
