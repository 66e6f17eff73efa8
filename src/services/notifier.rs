// src/services/notifier.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::accreditation::{AdmissionResult, Candidate};

/// Seam para o sistema de notificações/e-mail. Fluxo de dados de mão única:
/// o resultado da admissão (incluindo a zona, que vira a variável {zona}
/// do template) é entregue DEPOIS do commit. Falha aqui nunca desfaz uma
/// admissão já persistida.
#[async_trait]
pub trait AdmissionNotifier: Send + Sync {
    async fn admission_decided(
        &self,
        event_id: Uuid,
        candidate: &Candidate,
        result: &AdmissionResult,
    );
}

/// Implementação padrão: só registra no log. A entrega real de e-mail fica
/// no serviço externo de notificações.
pub struct LogNotifier;

#[async_trait]
impl AdmissionNotifier for LogNotifier {
    async fn admission_decided(
        &self,
        event_id: Uuid,
        candidate: &Candidate,
        result: &AdmissionResult,
    ) {
        tracing::info!(
            %event_id,
            category = %candidate.category,
            organization = candidate.organization.as_deref().unwrap_or("-"),
            admitted = result.admitted,
            reason = ?result.reason,
            zone = result.assigned_zone.as_deref().unwrap_or("Sin zona"),
            "Resultado de admissão"
        );
    }
}
