// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Events ---
        handlers::events::create_event,
        handlers::events::list_events,

        // --- Rules ---
        handlers::rules::create_quota_rule,
        handlers::rules::list_quota_rules,
        handlers::rules::get_effective_quota_rule,
        handlers::rules::delete_quota_rule,
        handlers::rules::create_zone_rule,
        handlers::rules::list_zone_rules,
        handlers::rules::delete_zone_rule,

        // --- Admissions ---
        handlers::admissions::admit,
        handlers::admissions::admit_batch,
        handlers::admissions::list_registrations,
        handlers::admissions::update_status,
    ),
    components(
        schemas(
            // --- Models ---
            models::accreditation::Event,
            models::accreditation::QuotaRule,
            models::accreditation::ZoneRule,
            models::accreditation::ZoneMatchField,
            models::accreditation::Registration,
            models::accreditation::RegistrationStatus,
            models::accreditation::AdmissionResult,
            models::accreditation::DenialReason,

            // --- Payloads ---
            handlers::events::CreateEventPayload,
            handlers::rules::CreateQuotaRulePayload,
            handlers::rules::CreateZoneRulePayload,
            handlers::admissions::AdmitCandidatePayload,
            handlers::admissions::AdmitBatchPayload,
            handlers::admissions::UpdateStatusPayload,
            handlers::admissions::StatusTransitionResponse,
        )
    ),
    tags(
        (name = "Events", description = "Janelas de acreditação por tenant"),
        (name = "Rules", description = "Regras de cota e de zona por evento"),
        (name = "Admissions", description = "Admissão de credenciais, lote e transições de status")
    )
)]
pub struct ApiDoc;
