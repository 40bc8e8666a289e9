use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer, Config};
use crate::handlers::events::{
    add_tier, attendees, availability, cancel_event, create_event, update_event, update_tier,
    verify_ticket,
};
use crate::handlers::health_check;
use crate::handlers::registrations::{allocate, cancel, my_registrations, transfer, update_rsvp};
use crate::state::AppState;
use crate::store::CapacityStore;

/// API routes without the outer middleware stack.
pub fn api_routes<S: CapacityStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/v1/events/:id/availability",
            get(availability::<S>),
        )
        .route(
            "/api/v1/registrations",
            get(my_registrations::<S>).post(allocate::<S>),
        )
        .route("/api/v1/registrations/:id", delete(cancel::<S>))
        .route("/api/v1/registrations/:id/transfer", post(transfer::<S>))
        .route("/api/v1/registrations/:id/rsvp", put(update_rsvp::<S>))
        .route("/api/v1/tickets/:code", get(verify_ticket::<S>))
        .route("/api/v1/admin/events", post(create_event::<S>))
        .route("/api/v1/admin/events/:id", put(update_event::<S>))
        .route("/api/v1/admin/events/:id/tiers", post(add_tier::<S>))
        .route(
            "/api/v1/admin/events/:id/tiers/:tier_id",
            put(update_tier::<S>),
        )
        .route(
            "/api/v1/admin/events/:id/attendees",
            get(attendees::<S>),
        )
        .route("/api/v1/admin/events/:id/cancel", post(cancel_event::<S>))
        .with_state(state)
}

pub fn create_routes<S: CapacityStore>(state: AppState<S>, config: &Config) -> Router {
    apply_security_headers(api_routes(state), config.production)
        .layer(create_cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}
