// src/services/quota.rs

use crate::models::accreditation::{DenialReason, QuotaRule};

/// Decisão pura de cota. Nenhum I/O, nenhum estado escondido: o serviço de
/// admissão lê as contagens dentro da transação e nos entrega os números.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub admitted: bool,
    pub reason: Option<DenialReason>,
}

impl QuotaDecision {
    const ADMITTED: Self = Self { admitted: true, reason: None };

    fn denied(reason: DenialReason) -> Self {
        Self { admitted: false, reason: Some(reason) }
    }
}

/// Avalia um candidato contra a regra de cota efetiva da categoria.
///
/// As contagens são de solicitações JÁ existentes (o candidato ainda não
/// conta). A comparação é `atual >= max`: o máximo é o teto da contagem
/// RESULTANTE. Com `max = 5`, a quinta admissão passa (atual 4) e a sexta
/// é negada (atual 5).
///
/// O teto global é checado antes do teto por organização: quando os dois
/// estourariam, o global é a restrição mais dura e a mensagem mais útil.
pub fn evaluate(
    rule: Option<&QuotaRule>,
    current_org_count: i64,
    current_global_count: i64,
) -> QuotaDecision {
    // Categoria sem regra é ilimitada (sistema aberto).
    let Some(rule) = rule else {
        return QuotaDecision::ADMITTED;
    };

    if let Some(max_global) = rule.max_global {
        if current_global_count >= i64::from(max_global) {
            return QuotaDecision::denied(DenialReason::GlobalQuotaExceeded);
        }
    }

    if let Some(max_org) = rule.max_per_organization {
        if current_org_count >= i64::from(max_org) {
            return QuotaDecision::denied(DenialReason::OrgQuotaExceeded);
        }
    }

    QuotaDecision::ADMITTED
}
