// src/handlers/admissions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::accreditation::{Candidate, RegistrationStatus},
    services::admission_service::StatusTransition,
};

// ---
// Payload: AdmitCandidate
// ---
// `organization` vazia/ausente cai no balde implícito dos "sem organização".
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmitCandidatePayload {
    pub organization: Option<String>,

    #[validate(length(min = 1, message = "A categoria (tipo de médio) é obrigatória."))]
    pub category: String,

    pub cargo: Option<String>,

    #[validate(length(min = 1, message = "O nome completo é obrigatório."))]
    pub full_name: String,

    #[validate(email(message = "E-mail inválido."))]
    pub email: Option<String>,
}

impl From<AdmitCandidatePayload> for Candidate {
    fn from(payload: AdmitCandidatePayload) -> Self {
        Candidate {
            organization: payload.organization,
            category: payload.category,
            cargo: payload.cargo,
            full_name: payload.full_name,
            email: payload.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmitBatchPayload {
    #[validate(length(min = 1, message = "O lote não pode ser vazio."), nested)]
    pub candidates: Vec<AdmitCandidatePayload>,
}

// ---
// Payload: UpdateStatus
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: RegistrationStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransitionResponse {
    pub applied: bool,
    pub reason: Option<crate::models::accreditation::DenialReason>,
    pub registration: Option<crate::models::accreditation::Registration>,
}

// ---
// Handler: admit (formulário público e painel)
// ---
// Negação de cota NÃO é erro HTTP: volta 200 com admitted=false e o motivo,
// para a UI mostrar a mensagem certa (global vs. por organização).
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/admissions",
    tag = "Admissions",
    params(("event_id" = Uuid, Path, description = "Evento")),
    request_body = AdmitCandidatePayload,
    responses(
        (status = 200, description = "Decisão de admissão", body = crate::models::accreditation::AdmissionResult),
        (status = 404, description = "Evento não encontrado"),
        (status = 503, description = "Contenção transitória; tente novamente"),
    )
)]
pub async fn admit(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<AdmitCandidatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let result = app_state
        .admission_service
        .admit(event_id, payload.into())
        .await?;
    Ok(Json(result))
}

// ---
// Handler: admit_batch (importação em massa)
// ---
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/admissions/batch",
    tag = "Admissions",
    params(("event_id" = Uuid, Path, description = "Evento")),
    request_body = AdmitBatchPayload,
    responses(
        (status = 200, description = "Uma decisão por candidato, na ordem de entrada", body = [crate::models::accreditation::AdmissionResult]),
        (status = 404, description = "Evento não encontrado"),
    )
)]
pub async fn admit_batch(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<AdmitBatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let candidates: Vec<Candidate> = payload.candidates.into_iter().map(Into::into).collect();
    let results = app_state
        .admission_service
        .admit_batch(event_id, candidates)
        .await?;
    Ok(Json(results))
}

// ---
// Handler: list_registrations (painel do admin)
// ---
#[utoipa::path(
    get,
    path = "/api/events/{event_id}/registrations",
    tag = "Admissions",
    params(("event_id" = Uuid, Path, description = "Evento")),
    responses(
        (status = 200, description = "Solicitações do evento", body = [crate::models::accreditation::Registration]),
    )
)]
pub async fn list_registrations(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let registrations = app_state
        .accreditation_repo
        .list_registrations(app_state.accreditation_repo.pool(), event_id)
        .await?;
    Ok(Json(registrations))
}

// ---
// Handler: update_status (aprovar / rejeitar / reviver)
// ---
#[utoipa::path(
    patch,
    path = "/api/events/{event_id}/registrations/{registration_id}/status",
    tag = "Admissions",
    params(
        ("event_id" = Uuid, Path, description = "Evento"),
        ("registration_id" = Uuid, Path, description = "Solicitação"),
    ),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Transição aplicada ou negada por cota", body = StatusTransitionResponse),
        (status = 404, description = "Solicitação não encontrada"),
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let outcome = app_state
        .admission_service
        .update_status(event_id, registration_id, payload.status)
        .await?;

    let response = match outcome {
        StatusTransition::Applied(registration) => StatusTransitionResponse {
            applied: true,
            reason: None,
            registration: Some(registration),
        },
        StatusTransition::Denied(reason) => StatusTransitionResponse {
            applied: false,
            reason: Some(reason),
            registration: None,
        },
    };
    Ok((StatusCode::OK, Json(response)))
}
