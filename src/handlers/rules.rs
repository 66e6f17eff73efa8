// src/handlers/rules.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::accreditation::ZoneMatchField,
};

// ---
// Payload: CreateQuotaRule
// ---
// Limite ausente (null) significa "sem limite" naquele eixo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotaRulePayload {
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,

    #[validate(range(min = 0, message = "O limite por organização não pode ser negativo."))]
    pub max_per_organization: Option<i32>,

    #[validate(range(min = 0, message = "O limite global não pode ser negativo."))]
    pub max_global: Option<i32>,

    // Menor prioridade é avaliada primeiro; serve para aposentar regras
    // legadas sem apagá-las.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    100
}

// ---
// Payload: CreateZoneRule
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRulePayload {
    pub match_field: ZoneMatchField,

    #[validate(length(min = 1, message = "O valor de comparação é obrigatório."))]
    pub match_value: String,

    #[validate(length(min = 1, message = "A zona é obrigatória."))]
    pub zone: String,
}

// ---
// Handlers: Regras de Cota
// ---
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/quota-rules",
    tag = "Rules",
    params(("event_id" = Uuid, Path, description = "Evento dono da regra")),
    request_body = CreateQuotaRulePayload,
    responses(
        (status = 201, description = "Regra criada", body = crate::models::accreditation::QuotaRule),
        (status = 404, description = "Evento não encontrado"),
    )
)]
pub async fn create_quota_rule(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<CreateQuotaRulePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let rule = app_state
        .accreditation_repo
        .create_quota_rule(
            app_state.accreditation_repo.pool(),
            event_id,
            payload.category.trim(),
            payload.max_per_organization,
            payload.max_global,
            payload.priority,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(rule)))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/quota-rules",
    tag = "Rules",
    params(("event_id" = Uuid, Path, description = "Evento")),
    responses(
        (status = 200, description = "Regras de cota do evento", body = [crate::models::accreditation::QuotaRule]),
    )
)]
pub async fn list_quota_rules(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let rules = app_state
        .accreditation_repo
        .list_quota_rules(app_state.accreditation_repo.pool(), event_id)
        .await?;
    Ok(Json(rules))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/quota-rules/{rule_id}",
    tag = "Rules",
    params(
        ("event_id" = Uuid, Path, description = "Evento"),
        ("rule_id" = Uuid, Path, description = "Regra"),
    ),
    responses(
        (status = 204, description = "Regra removida"),
        (status = 404, description = "Regra não encontrada"),
    )
)]
pub async fn delete_quota_rule(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path((event_id, rule_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    app_state
        .accreditation_repo
        .delete_quota_rule(app_state.accreditation_repo.pool(), event_id, rule_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveRuleQuery {
    pub category: String,
}

// Mostra ao admin qual regra de cota efetivamente vale para uma categoria
// (menor prioridade; empate pela criada mais recentemente). `null` quando a
// categoria não tem regra, ou seja, ilimitada.
#[utoipa::path(
    get,
    path = "/api/events/{event_id}/quota-rules/effective",
    tag = "Rules",
    params(
        ("event_id" = Uuid, Path, description = "Evento"),
        EffectiveRuleQuery,
    ),
    responses(
        (status = 200, description = "Regra efetiva da categoria; null se ilimitada", body = crate::models::accreditation::QuotaRule),
    )
)]
pub async fn get_effective_quota_rule(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
    Query(query): Query<EffectiveRuleQuery>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let rule = app_state
        .accreditation_repo
        .get_quota_rule(
            app_state.accreditation_repo.pool(),
            event_id,
            &crate::services::admission_service::fold_category(&query.category),
        )
        .await?;
    Ok(Json(rule))
}

// ---
// Handlers: Regras de Zona
// ---
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/zone-rules",
    tag = "Rules",
    params(("event_id" = Uuid, Path, description = "Evento dono da regra")),
    request_body = CreateZoneRulePayload,
    responses(
        (status = 201, description = "Regra criada", body = crate::models::accreditation::ZoneRule),
        (status = 409, description = "Regra duplicada para (campo, valor)"),
    )
)]
pub async fn create_zone_rule(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<CreateZoneRulePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let rule = app_state
        .accreditation_repo
        .create_zone_rule(
            app_state.accreditation_repo.pool(),
            event_id,
            payload.match_field,
            payload.match_value.trim(),
            payload.zone.trim(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(rule)))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/zone-rules",
    tag = "Rules",
    params(("event_id" = Uuid, Path, description = "Evento")),
    responses(
        (status = 200, description = "Regras de zona na ordem de avaliação", body = [crate::models::accreditation::ZoneRule]),
    )
)]
pub async fn list_zone_rules(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    let rules = app_state
        .accreditation_repo
        .get_zone_rules(app_state.accreditation_repo.pool(), event_id)
        .await?;
    Ok(Json(rules))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/zone-rules/{rule_id}",
    tag = "Rules",
    params(
        ("event_id" = Uuid, Path, description = "Evento"),
        ("rule_id" = Uuid, Path, description = "Regra"),
    ),
    responses(
        (status = 204, description = "Regra removida"),
        (status = 404, description = "Regra não encontrada"),
    )
)]
pub async fn delete_zone_rule(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path((event_id, rule_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state.admission_service.get_event_for_tenant(tenant.0, event_id).await?;

    app_state
        .accreditation_repo
        .delete_zone_rule(app_state.accreditation_repo.pool(), event_id, rule_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
