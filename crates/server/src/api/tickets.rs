//! Ticket API handlers.
//!
//! The chat transport layer delivers normalized inbound events through these
//! endpoints: ticket creation, user/admin messages, takes, and closes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use frontdesk_core::{
    Actor, CloseReason, StoreStats, Ticket, TicketError, TicketFilter, TicketStatus,
};

use crate::state::AppState;

/// Maximum allowed limit for ticket queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for ticket queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    /// Chat-platform identifier of the requesting party
    pub user_id: i64,
    /// The message that opens the ticket
    pub text: String,
}

/// Request body for message events (user message or admin reply)
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub text: String,
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    /// Filter by status ("new", "in_progress", "closed")
    pub status: Option<String>,
    /// Filter by requesting party
    pub user_id: Option<i64>,
    /// Maximum number of tickets to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// One thread entry in a ticket response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub sender: Actor,
    pub sent_at: String,
    pub body: String,
}

/// Response for ticket operations
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub user_id: i64,
    pub status: TicketStatus,
    pub last_actor: Actor,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<CloseReason>,
    pub messages: Vec<MessageResponse>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            user_id: ticket.user_id,
            status: ticket.status,
            last_actor: ticket.last_actor,
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
            closed_at: ticket.closed_at.map(|t| t.to_rfc3339()),
            closed_reason: ticket.closed_reason,
            messages: ticket
                .messages
                .into_iter()
                .map(|m| MessageResponse {
                    sender: m.sender,
                    sent_at: m.sent_at.to_rfc3339(),
                    body: m.body,
                })
                .collect(),
        }
    }
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<TicketResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<TicketErrorResponse>);

fn error_response(err: TicketError) -> ErrorReply {
    let status = match &err {
        TicketError::NotFound(_) => StatusCode::NOT_FOUND,
        TicketError::DuplicateOpenTicket { .. }
        | TicketError::InvalidTransition { .. }
        | TicketError::TicketClosed(_) => StatusCode::CONFLICT,
        TicketError::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
        TicketError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(TicketErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(TicketErrorResponse {
            error: message.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new ticket from a user's first message
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<TicketResponse>), ErrorReply> {
    if body.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let ticket = state
        .lifecycle()
        .create_ticket(body.user_id, body.text)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ErrorReply> {
    let ticket = state.ticket_store().get(&id).map_err(error_response)?;
    Ok(Json(TicketResponse::from(ticket)))
}

/// List tickets with optional filters
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<ListTicketsResponse>, ErrorReply> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = TicketFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status_param) = params.status {
        let status = TicketStatus::parse(status_param)
            .ok_or_else(|| bad_request(format!("unknown status: {}", status_param)))?;
        filter = filter.with_status(status);
    }

    if let Some(user_id) = params.user_id {
        filter = filter.with_user(user_id);
    }

    let tickets = state.ticket_store().list(&filter).map_err(error_response)?;

    // Total count ignores pagination
    let count_filter = TicketFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter
    };
    let total = state
        .ticket_store()
        .count(&count_filter)
        .map_err(error_response)?;

    Ok(Json(ListTicketsResponse {
        tickets: tickets.into_iter().map(TicketResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Aggregate ticket counts
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreStats>, ErrorReply> {
    let stats = state.ticket_store().stats().map_err(error_response)?;
    Ok(Json(stats))
}

/// Record a message from the requesting party
pub async fn user_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<Json<TicketResponse>, ErrorReply> {
    if body.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let ticket = state
        .lifecycle()
        .user_message(&id, body.text)
        .await
        .map_err(error_response)?;

    Ok(Json(TicketResponse::from(ticket)))
}

/// An administrator takes the ticket without replying
pub async fn take_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ErrorReply> {
    let ticket = state
        .lifecycle()
        .admin_take(&id)
        .await
        .map_err(error_response)?;

    Ok(Json(TicketResponse::from(ticket)))
}

/// Record an administrator's reply
pub async fn reply_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<Json<TicketResponse>, ErrorReply> {
    if body.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let ticket = state
        .lifecycle()
        .admin_message(&id, body.text)
        .await
        .map_err(error_response)?;

    Ok(Json(TicketResponse::from(ticket)))
}

/// Close the ticket on an administrator's request
pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponse>, ErrorReply> {
    let ticket = state
        .lifecycle()
        .admin_close(&id)
        .await
        .map_err(error_response)?;

    Ok(Json(TicketResponse::from(ticket)))
}
