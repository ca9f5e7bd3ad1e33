use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Tickets
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/stats", get(tickets::get_stats))
        .route("/tickets/{id}", get(tickets::get_ticket))
        // Inbound conversation events
        .route("/tickets/{id}/messages", post(tickets::user_message))
        .route("/tickets/{id}/take", post(tickets::take_ticket))
        .route("/tickets/{id}/reply", post(tickets::reply_ticket))
        .route("/tickets/{id}/close", post(tickets::close_ticket))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
