//! Ticket state machine driver.
//!
//! Routes inbound events through the store's atomic `update`, so every
//! precondition is re-validated inside the per-ticket gate, and emits
//! notifications only after the mutation has committed.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::metrics;
use crate::notify::{NotifierHandle, NotifyEvent};
use crate::ticket::{
    Actor, CloseReason, CreateTicketRequest, Ticket, TicketError, TicketStatus, TicketStore,
};

use super::events::{apply_event, TicketEvent};

/// Drives tickets through the state machine.
///
/// Shared by the live event-handling path and the auto-close scheduler; both
/// go through the same store gate, so their events are applied in the order
/// the gate admits them.
pub struct TicketLifecycle {
    store: Arc<dyn TicketStore>,
    notifier: NotifierHandle,
    clock: Arc<dyn Clock>,
}

impl TicketLifecycle {
    /// Create a new lifecycle driver.
    pub fn new(store: Arc<dyn TicketStore>, notifier: NotifierHandle, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Open a ticket from a user's first message.
    pub async fn create_ticket(&self, user_id: i64, text: String) -> Result<Ticket, TicketError> {
        let ticket = self.store.create(CreateTicketRequest {
            user_id,
            initial_message: text.clone(),
        })?;

        metrics::TICKETS_CREATED.inc();
        metrics::MESSAGES_RECORDED
            .with_label_values(&[Actor::User.as_str()])
            .inc();
        info!(ticket_id = %ticket.id, user_id, "Ticket created");

        // Ping the support inbox with the opening message
        self.notifier
            .emit(
                Actor::Support,
                NotifyEvent::NewMessage {
                    ticket_id: ticket.id.clone(),
                    sender: Actor::User,
                    body: text,
                },
            )
            .await;

        Ok(ticket)
    }

    /// Record a message from the requesting party.
    pub async fn user_message(&self, id: &str, body: String) -> Result<Ticket, TicketError> {
        let event = TicketEvent::UserMessage { body: body.clone() };
        let (ticket, _) = self.apply(id, &event)?;

        metrics::MESSAGES_RECORDED
            .with_label_values(&[Actor::User.as_str()])
            .inc();
        self.notifier
            .emit(
                Actor::Support,
                NotifyEvent::NewMessage {
                    ticket_id: ticket.id.clone(),
                    sender: Actor::User,
                    body,
                },
            )
            .await;

        Ok(ticket)
    }

    /// An administrator takes the ticket without replying.
    pub async fn admin_take(&self, id: &str) -> Result<Ticket, TicketError> {
        let (ticket, changed_from) = self.apply(id, &TicketEvent::AdminTakes)?;

        info!(ticket_id = %ticket.id, "Ticket taken by support");
        self.emit_status_changed(&ticket, changed_from, None).await;

        Ok(ticket)
    }

    /// Record an administrator's reply.
    pub async fn admin_message(&self, id: &str, body: String) -> Result<Ticket, TicketError> {
        let event = TicketEvent::AdminMessage { body: body.clone() };
        let (ticket, changed_from) = self.apply(id, &event)?;

        metrics::MESSAGES_RECORDED
            .with_label_values(&[Actor::Support.as_str()])
            .inc();
        self.notifier
            .emit(
                Actor::User,
                NotifyEvent::NewMessage {
                    ticket_id: ticket.id.clone(),
                    sender: Actor::Support,
                    body,
                },
            )
            .await;
        self.emit_status_changed(&ticket, changed_from, None).await;

        Ok(ticket)
    }

    /// Close the ticket on an administrator's request.
    pub async fn admin_close(&self, id: &str) -> Result<Ticket, TicketError> {
        let (ticket, changed_from) = self.apply(id, &TicketEvent::AdminClose)?;

        metrics::TICKETS_CLOSED
            .with_label_values(&[CloseReason::ManualAdmin.as_str()])
            .inc();
        info!(ticket_id = %ticket.id, "Ticket closed by admin");
        self.emit_status_changed(&ticket, changed_from, Some(CloseReason::ManualAdmin))
            .await;

        Ok(ticket)
    }

    /// Close the ticket because it sat idle past the threshold.
    ///
    /// The idle precondition is re-checked against the current record inside
    /// the store gate; a user reply between the scheduler's scan and this
    /// call surfaces as `InvalidTransition`.
    pub async fn auto_close(
        &self,
        id: &str,
        idle_threshold: Duration,
    ) -> Result<Ticket, TicketError> {
        let event = TicketEvent::AutoCloseTimeout { idle_threshold };
        let (ticket, changed_from) = self.apply(id, &event)?;

        metrics::TICKETS_CLOSED
            .with_label_values(&[CloseReason::AutoTimeout.as_str()])
            .inc();
        info!(ticket_id = %ticket.id, "Ticket auto-closed after idle timeout");
        self.emit_status_changed(&ticket, changed_from, Some(CloseReason::AutoTimeout))
            .await;

        Ok(ticket)
    }

    /// Apply an event through the store gate, retrying once on `Conflict`.
    ///
    /// Returns the updated ticket and, when the event changed the status,
    /// the status it changed from.
    fn apply(
        &self,
        id: &str,
        event: &TicketEvent,
    ) -> Result<(Ticket, Option<TicketStatus>), TicketError> {
        let mut retried = false;
        loop {
            let now = self.clock.now();
            let mut from = None;
            let result = self.store.update(
                id,
                Box::new(|ticket| {
                    from = Some(ticket.status);
                    apply_event(ticket, event, now)
                }),
            );

            match result {
                Ok(ticket) => {
                    let from = from.unwrap_or(ticket.status);
                    let changed = (from != ticket.status).then_some(from);
                    return Ok((ticket, changed));
                }
                Err(TicketError::Conflict(conflicted)) if !retried => {
                    retried = true;
                    warn!(ticket_id = %conflicted, event = event.name(), "Update conflict, retrying with fresh state");
                }
                Err(e) => {
                    if matches!(
                        e,
                        TicketError::InvalidTransition { .. } | TicketError::TicketClosed(_)
                    ) {
                        metrics::TRANSITIONS_REJECTED
                            .with_label_values(&[event.name()])
                            .inc();
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn emit_status_changed(
        &self,
        ticket: &Ticket,
        from: Option<TicketStatus>,
        reason: Option<CloseReason>,
    ) {
        let Some(from_status) = from else {
            return;
        };
        self.notifier
            .emit(
                Actor::User,
                NotifyEvent::StatusChanged {
                    ticket_id: ticket.id.clone(),
                    from_status,
                    to_status: ticket.status,
                    reason,
                    actor: Actor::Support,
                },
            )
            .await;
    }
}
