// src/models/accreditation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Evento (janela de acreditação) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub accreditation_open: bool,
    pub created_at: DateTime<Utc>,
}

// --- 2. Regra de Cota ---
// `None` em max_per_organization / max_global significa "sem limite".
// A regra efetiva por (evento, categoria) é a de menor `priority`;
// empate resolvido pela linha criada mais recentemente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRule {
    pub id: Uuid,
    pub event_id: Uuid,
    pub category: String,
    pub max_per_organization: Option<i32>,
    pub max_global: Option<i32>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

// --- 3. Regra de Zona ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "zone_match_field", rename_all = "snake_case")] // Banco
#[serde(rename_all = "snake_case")] // JSON
pub enum ZoneMatchField {
    Cargo,
    TipoMedio,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRule {
    pub id: Uuid,
    pub event_id: Uuid,
    pub match_field: ZoneMatchField,
    pub match_value: String,
    pub zone: String,
    pub created_at: DateTime<Utc>,
}

// --- 4. Solicitação de credencial ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub organization: Option<String>,
    pub category: String,
    pub cargo: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    pub status: RegistrationStatus,
    pub zone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 5. Candidato (ainda não persistido) ---
// Normalizado pelo serviço de admissão antes de qualquer decisão:
// categoria com trim; organização com trim e vazio -> None.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub organization: Option<String>,
    pub category: String,
    pub cargo: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
}

// --- 6. Resultado da admissão ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    GlobalQuotaExceeded,
    OrgQuotaExceeded,
    // Emitido apenas pelo serviço de admissão quando o orçamento de
    // retries se esgota; nunca pelo avaliador de cota.
    TransientContention,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResult {
    pub admitted: bool,
    pub reason: Option<DenialReason>,
    pub assigned_zone: Option<String>,
    pub registration_id: Option<Uuid>,
}

impl AdmissionResult {
    pub fn admitted(registration_id: Uuid, assigned_zone: Option<String>) -> Self {
        Self {
            admitted: true,
            reason: None,
            assigned_zone,
            registration_id: Some(registration_id),
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            admitted: false,
            reason: Some(reason),
            assigned_zone: None,
            registration_id: None,
        }
    }
}

// --- 7. Política de contagem ---
// Decide se solicitações rejeitadas continuam consumindo cota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountPolicy {
    #[default]
    IncludeAll,
    ExcludeRejected,
}

impl CountPolicy {
    pub fn from_env_value(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "include_all" => Ok(Self::IncludeAll),
            "exclude_rejected" => Ok(Self::ExcludeRejected),
            other => anyhow::bail!("QUOTA_COUNT_POLICY inválida: '{other}'"),
        }
    }
}
