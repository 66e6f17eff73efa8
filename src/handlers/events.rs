// src/handlers/events.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
};

// ---
// Payload: CreateEvent
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventPayload {
    #[validate(length(min = 1, message = "O nome do evento é obrigatório."))]
    pub name: String,
}

// ---
// Handler: create_event
// ---
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "Events",
    request_body = CreateEventPayload,
    responses(
        (status = 201, description = "Evento criado", body = crate::models::accreditation::Event),
        (status = 400, description = "Payload inválido"),
    )
)]
pub async fn create_event(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let event = app_state
        .accreditation_repo
        .create_event(app_state.accreditation_repo.pool(), tenant.0, payload.name.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

// ---
// Handler: list_events
// ---
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    responses(
        (status = 200, description = "Eventos do tenant", body = [crate::models::accreditation::Event]),
    )
)]
pub async fn list_events(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let events = app_state
        .accreditation_repo
        .list_events(app_state.accreditation_repo.pool(), tenant.0)
        .await?;
    Ok(Json(events))
}
