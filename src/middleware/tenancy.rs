// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

// O nome do nosso cabeçalho HTTP customizado.
// A autenticação em si é responsabilidade do gateway upstream; aqui só
// lemos qual tenant a requisição diz representar. Cada handler ainda
// confere se o evento pertence a esse tenant antes de tocar em dados.
const TENANT_ID_HEADER: &str = "x-tenant-id";

// O nosso extrator. Armazena o UUID do tenant que o utilizador quer aceder.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

pub struct TenantRejection(&'static str);

impl IntoResponse for TenantRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.0 }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = TenantRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        // Tenta ler o cabeçalho X-Tenant-ID
        let header_value = parts
            .headers
            .get(TENANT_ID_HEADER)
            .ok_or(TenantRejection("O cabeçalho X-Tenant-ID é obrigatório."))?;

        let value_str = header_value
            .to_str()
            .map_err(|_| TenantRejection("Cabeçalho X-Tenant-ID contém caracteres inválidos."))?;

        let tenant_id = Uuid::parse_str(value_str)
            .map_err(|_| TenantRejection("Cabeçalho X-Tenant-ID inválido (não é um UUID)."))?;

        Ok(TenantContext(tenant_id))
    }
}
