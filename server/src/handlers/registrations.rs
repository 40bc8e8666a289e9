use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{Actor, IdPath, JsonBody};
use crate::models::RegistrationStatus;
use crate::state::AppState;
use crate::store::CapacityStore;
use crate::utils::response::{created, success};
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub event_id: Uuid,
    pub ticket_tier_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub recipient_email: String,
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub status: RegistrationStatus,
}

pub async fn allocate<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    JsonBody(body): JsonBody<AllocateRequest>,
) -> Result<Response, AppError> {
    let issued = state
        .engine
        .allocate(actor.user_id, body.event_id, body.ticket_tier_id)
        .await?;
    Ok(created(issued, "Registration confirmed"))
}

pub async fn my_registrations<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
) -> Result<Response, AppError> {
    let registrations = state.engine.my_registrations(actor.user_id).await?;
    Ok(success(registrations, "Registrations fetched successfully"))
}

pub async fn cancel<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(registration_id): IdPath,
) -> Result<Response, AppError> {
    let registration = state.engine.cancel(actor.user_id, registration_id).await?;
    Ok(success(registration, "Registration cancelled"))
}

pub async fn transfer<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(registration_id): IdPath,
    JsonBody(body): JsonBody<TransferRequest>,
) -> Result<Response, AppError> {
    let email = body.recipient_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::ValidationError(
            "recipient_email must be a valid email address".to_string(),
        ));
    }

    let issued = state
        .engine
        .transfer(actor.user_id, registration_id, email)
        .await?;
    Ok(success(issued, "Ticket transferred successfully"))
}

pub async fn update_rsvp<S: CapacityStore>(
    State(state): State<AppState<S>>,
    actor: Actor,
    IdPath(registration_id): IdPath,
    JsonBody(body): JsonBody<RsvpRequest>,
) -> Result<Response, AppError> {
    let registration = state
        .engine
        .update_rsvp(actor.user_id, registration_id, body.status)
        .await?;
    Ok(success(registration, "RSVP status updated successfully"))
}
