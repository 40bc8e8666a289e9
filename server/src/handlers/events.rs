use axum::extract::{Path, State};
use axum::response::Response;

use super::extract::{Actor, IdPath, JsonBody, TierPath};
use crate::models::{EventUpdate, NewEvent, NewTier, TierUpdate};
use crate::state::AppState;
use crate::store::CapacityStore;
use crate::utils::response::{created, success};
use crate::utils::AppError;

pub async fn availability<S: CapacityStore>(
    State(state): State<AppState<S>>,
    IdPath(event_id): IdPath,
) -> Result<Response, AppError> {
    let availability = state.engine.availability(event_id).await?;
    Ok(success(availability, "Availability fetched successfully"))
}

pub async fn verify_ticket<S: CapacityStore>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let verification = state.engine.verify_ticket(&code).await?;
    Ok(success(verification, "Ticket is valid"))
}

pub async fn attendees<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(event_id): IdPath,
) -> Result<Response, AppError> {
    actor.require_admin()?;
    let attendees = state.engine.attendees(event_id).await?;
    Ok(success(attendees, "Attendees fetched successfully"))
}

pub async fn cancel_event<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(event_id): IdPath,
) -> Result<Response, AppError> {
    actor.require_admin()?;
    let event = state.engine.cancel_event(actor.user_id, event_id).await?;
    Ok(success(event, "Event cancelled"))
}

pub async fn create_event<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    JsonBody(body): JsonBody<NewEvent>,
) -> Result<Response, AppError> {
    actor.require_admin()?;
    let details = state.engine.create_event(actor.user_id, body).await?;
    Ok(created(details, "Event created successfully"))
}

pub async fn update_event<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(event_id): IdPath,
    JsonBody(body): JsonBody<EventUpdate>,
) -> Result<Response, AppError> {
    actor.require_admin()?;
    let event = state
        .engine
        .update_event(actor.user_id, event_id, body)
        .await?;
    Ok(success(event, "Event updated successfully"))
}

pub async fn add_tier<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(event_id): IdPath,
    JsonBody(body): JsonBody<NewTier>,
) -> Result<Response, AppError> {
    actor.require_admin()?;
    let tier = state.engine.add_tier(actor.user_id, event_id, body).await?;
    Ok(created(tier, "Ticket tier created successfully"))
}

pub async fn update_tier<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    path: TierPath,
    JsonBody(body): JsonBody<TierUpdate>,
) -> Result<Response, AppError> {
    actor.require_admin()?;
    let tier = state
        .engine
        .update_tier(actor.user_id, path.event_id, path.tier_id, body)
        .await?;
    Ok(success(tier, "Ticket tier updated successfully"))
}
