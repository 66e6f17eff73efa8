// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Negações de cota NÃO moram aqui: são resultado de negócio e voltam
// como dados dentro do AdmissionResult.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Evento não encontrado")]
    UnknownEvent,

    #[error("Solicitação não encontrada")]
    RegistrationNotFound,

    #[error("Regra não encontrada")]
    RuleNotFound,

    #[error("Já existe uma regra de zona para este campo e valor")]
    DuplicateZoneRule,

    // A transação de admissão não serializou dentro do orçamento de
    // retries; o chamador deve repetir a chamada inteira de `admit`.
    #[error("Contenção transitória na admissão")]
    TransientContention,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::UnknownEvent => (StatusCode::NOT_FOUND, "Evento não encontrado."),
            AppError::RegistrationNotFound => (StatusCode::NOT_FOUND, "Solicitação não encontrada."),
            AppError::RuleNotFound => (StatusCode::NOT_FOUND, "Regra não encontrada."),
            AppError::DuplicateZoneRule => (
                StatusCode::CONFLICT,
                "Já existe uma regra de zona para este campo e valor.",
            ),
            AppError::TransientContention => (
                StatusCode::SERVICE_UNAVAILABLE,
                "O sistema está sob contenção. Tente novamente.",
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
