// src/services/admission_service.rs

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AccreditationRepository, OrgBucket},
    models::accreditation::{
        AdmissionResult, Candidate, CountPolicy, DenialReason, Event, Registration,
        RegistrationStatus,
    },
    services::{
        notifier::AdmissionNotifier,
        quota,
        zone::{self, ZoneCandidate},
    },
};

/// Resultado de uma transição de status. A negação de cota é resultado de
/// negócio, não erro: a linha permanece como estava.
#[derive(Debug, Clone)]
pub enum StatusTransition {
    Applied(Registration),
    Denied(DenialReason),
}

/// O único componente com efeitos colaterais: a unidade atômica de trabalho
/// da admissão. Trava da regra, contagens, decisão e insert acontecem dentro
/// de UMA transação, para que duas admissões concorrentes nunca leiam as
/// duas uma contagem abaixo do limite e entrem as duas.
#[derive(Clone)]
pub struct AdmissionService {
    repo: AccreditationRepository,
    count_policy: CountPolicy,
    retry_attempts: u32,
    notifier: Arc<dyn AdmissionNotifier>,
}

impl AdmissionService {
    pub fn new(
        repo: AccreditationRepository,
        count_policy: CountPolicy,
        retry_attempts: u32,
        notifier: Arc<dyn AdmissionNotifier>,
    ) -> Self {
        Self { repo, count_policy, retry_attempts: retry_attempts.max(1), notifier }
    }

    pub fn count_policy(&self) -> CountPolicy {
        self.count_policy
    }

    /// Busca o evento validando que pertence ao tenant do cabeçalho.
    /// Evento de outro tenant responde como inexistente, sem vazar nada.
    pub async fn get_event_for_tenant(
        &self,
        tenant_id: Uuid,
        event_id: Uuid,
    ) -> Result<Event, AppError> {
        let event = self
            .repo
            .get_event(self.repo.pool(), event_id)
            .await?
            .ok_or(AppError::UnknownEvent)?;
        if event.tenant_id != tenant_id {
            return Err(AppError::UnknownEvent);
        }
        Ok(event)
    }

    // ---
    // Admissão
    // ---

    /// Admite (ou nega) um candidato. Negação de cota volta como dado no
    /// AdmissionResult; só falhas de avaliação viram Err.
    pub async fn admit(
        &self,
        event_id: Uuid,
        candidate: Candidate,
    ) -> Result<AdmissionResult, AppError> {
        // UNKNOWN_EVENT é erro duro: indica bug do chamador ou evento
        // apagado, nunca uma negação de cota.
        self.repo
            .get_event(self.repo.pool(), event_id)
            .await?
            .ok_or(AppError::UnknownEvent)?;

        let candidate = normalize_candidate(candidate);
        let result = self.admit_with_retry(event_id, &candidate).await?;
        self.notifier.admission_decided(event_id, &candidate, &result).await;
        Ok(result)
    }

    /// Importação em lote: cada candidato na SUA transação, na ordem de
    /// entrada, para que admissões anteriores do lote já contem na cota das
    /// seguintes. Um candidato que esgota o orçamento de retries vira
    /// `TRANSIENT_CONTENTION` no resultado e o lote continua.
    pub async fn admit_batch(
        &self,
        event_id: Uuid,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<AdmissionResult>, AppError> {
        self.repo
            .get_event(self.repo.pool(), event_id)
            .await?
            .ok_or(AppError::UnknownEvent)?;

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let candidate = normalize_candidate(candidate);
            let result = match self.admit_with_retry(event_id, &candidate).await {
                Ok(result) => result,
                Err(AppError::TransientContention) => {
                    AdmissionResult::denied(DenialReason::TransientContention)
                }
                Err(e) => return Err(e),
            };
            self.notifier.admission_decided(event_id, &candidate, &result).await;
            results.push(result);
        }
        Ok(results)
    }

    /// Transição de status. Reviver uma solicitação rejeitada sob a política
    /// ExcludeRejected re-checa a cota: a linha deixou de contar quando foi
    /// rejeitada e só pode voltar a contar se ainda houver vaga.
    pub async fn update_status(
        &self,
        event_id: Uuid,
        registration_id: Uuid,
        new_status: RegistrationStatus,
    ) -> Result<StatusTransition, AppError> {
        self.repo
            .get_event(self.repo.pool(), event_id)
            .await?
            .ok_or(AppError::UnknownEvent)?;

        let mut attempt = 0;
        loop {
            match self.try_update_status(event_id, registration_id, new_status).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if is_serialization_conflict(&e) => {
                    attempt += 1;
                    if attempt >= self.retry_attempts {
                        return Err(AppError::TransientContention);
                    }
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ---
    // Internos
    // ---

    async fn admit_with_retry(
        &self,
        event_id: Uuid,
        candidate: &Candidate,
    ) -> Result<AdmissionResult, AppError> {
        let mut attempt = 0;
        loop {
            match self.try_admit_once(event_id, candidate).await {
                Ok(result) => return Ok(result),
                Err(e) if is_serialization_conflict(&e) => {
                    attempt += 1;
                    if attempt >= self.retry_attempts {
                        tracing::warn!(
                            %event_id,
                            category = %candidate.category,
                            attempts = attempt,
                            "Admissão esgotou o orçamento de retries"
                        );
                        // Falha fechada: melhor negar do que admitir sem
                        // ter conseguido serializar a contagem.
                        return Err(AppError::TransientContention);
                    }
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_admit_once(
        &self,
        event_id: Uuid,
        candidate: &Candidate,
    ) -> Result<AdmissionResult, AppError> {
        let category_folded = fold_category(&candidate.category);
        let mut tx = self.repo.pool().begin().await?;

        // Ponto de serialização: FOR UPDATE nas linhas da regra enfileira
        // admissões concorrentes da mesma (evento, categoria).
        let rule = self
            .repo
            .get_quota_rule_for_update(&mut *tx, event_id, &category_folded)
            .await?;

        let decision = match &rule {
            Some(rule) => {
                let global_count = self
                    .repo
                    .count_registrations(&mut *tx, event_id, &category_folded, None, self.count_policy)
                    .await?;
                let org_count = self
                    .repo
                    .count_registrations(
                        &mut *tx,
                        event_id,
                        &category_folded,
                        Some(OrgBucket::from_option(candidate.organization.as_deref())),
                        self.count_policy,
                    )
                    .await?;
                quota::evaluate(Some(rule), org_count, global_count)
            }
            // Categoria sem regra: ilimitada, nem precisa contar.
            None => quota::evaluate(None, 0, 0),
        };

        if let Some(reason) = decision.reason {
            tx.rollback().await?;
            return Ok(AdmissionResult::denied(reason));
        }

        let zone_rules = self.repo.get_zone_rules(&mut *tx, event_id).await?;
        let assigned_zone = zone::resolve(
            &zone_rules,
            &ZoneCandidate {
                cargo: candidate.cargo.as_deref(),
                tipo_medio: &candidate.category,
            },
        );

        let registration = self
            .repo
            .insert_registration(
                &mut *tx,
                event_id,
                candidate.organization.as_deref(),
                &candidate.category,
                candidate.cargo.as_deref(),
                &candidate.full_name,
                candidate.email.as_deref(),
                assigned_zone.as_deref(),
            )
            .await?;

        tx.commit().await?;
        Ok(AdmissionResult::admitted(registration.id, assigned_zone))
    }

    async fn try_update_status(
        &self,
        event_id: Uuid,
        registration_id: Uuid,
        new_status: RegistrationStatus,
    ) -> Result<StatusTransition, AppError> {
        let mut tx = self.repo.pool().begin().await?;

        let registration = self
            .repo
            .get_registration_for_update(&mut *tx, event_id, registration_id)
            .await?
            .ok_or(AppError::RegistrationNotFound)?;

        if registration.status == new_status {
            tx.rollback().await?;
            return Ok(StatusTransition::Applied(registration));
        }

        // A linha só volta a consumir cota quando sai de 'rejected' e a
        // política não conta rejeitadas (sob IncludeAll ela nunca parou de
        // contar, então não há o que re-checar).
        let revives = self.count_policy == CountPolicy::ExcludeRejected
            && registration.status == RegistrationStatus::Rejected
            && new_status != RegistrationStatus::Rejected;

        if revives {
            let category_folded = fold_category(&registration.category);
            let rule = self
                .repo
                .get_quota_rule_for_update(&mut *tx, event_id, &category_folded)
                .await?;
            if let Some(rule) = &rule {
                // A própria linha está rejeitada e portanto fora das
                // contagens sob ExcludeRejected.
                let global_count = self
                    .repo
                    .count_registrations(&mut *tx, event_id, &category_folded, None, self.count_policy)
                    .await?;
                let org_count = self
                    .repo
                    .count_registrations(
                        &mut *tx,
                        event_id,
                        &category_folded,
                        Some(OrgBucket::from_option(registration.organization.as_deref())),
                        self.count_policy,
                    )
                    .await?;
                let decision = quota::evaluate(Some(rule), org_count, global_count);
                if let Some(reason) = decision.reason {
                    tx.rollback().await?;
                    return Ok(StatusTransition::Denied(reason));
                }
            }
        }

        let updated = self
            .repo
            .update_registration_status(&mut *tx, event_id, registration_id, new_status)
            .await?;
        tx.commit().await?;
        Ok(StatusTransition::Applied(updated))
    }
}

/// Normalização na fronteira do serviço: categoria com trim; organização e
/// cargo com trim, vazio vira None (o balde implícito dos "sem organização").
pub fn normalize_candidate(candidate: Candidate) -> Candidate {
    let trim_opt = |value: Option<String>| -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Candidate {
        organization: trim_opt(candidate.organization),
        category: candidate.category.trim().to_string(),
        cargo: trim_opt(candidate.cargo),
        full_name: candidate.full_name.trim().to_string(),
        email: trim_opt(candidate.email),
    }
}

/// Chave de busca da categoria: trim + minúsculas.
pub fn fold_category(category: &str) -> String {
    category.trim().to_lowercase()
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(25u64.saturating_mul(1u64 << attempt.min(6)))
}

/// Conflitos que valem retry: falha de serialização (40001) e deadlock
/// detectado (40P01). Qualquer outro erro sobe direto.
fn is_serialization_conflict(error: &AppError) -> bool {
    let AppError::DatabaseError(sqlx::Error::Database(db_err)) = error else {
        return false;
    };
    matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::accreditation::QuotaRule;
    use chrono::Utc;

    fn candidate(organization: Option<&str>, category: &str) -> Candidate {
        Candidate {
            organization: organization.map(str::to_string),
            category: category.to_string(),
            cargo: None,
            full_name: "Ana Pérez".to_string(),
            email: None,
        }
    }

    #[test]
    fn normalizacao_apara_e_esvazia_organizacao() {
        let c = normalize_candidate(Candidate {
            organization: Some("   ".to_string()),
            category: "  Prensa Escrita ".to_string(),
            cargo: Some(" Fotógrafo ".to_string()),
            full_name: " Ana Pérez ".to_string(),
            email: Some("".to_string()),
        });
        assert_eq!(c.organization, None);
        assert_eq!(c.category, "Prensa Escrita");
        assert_eq!(c.cargo.as_deref(), Some("Fotógrafo"));
        assert_eq!(c.full_name, "Ana Pérez");
        assert_eq!(c.email, None);
    }

    #[test]
    fn chave_de_categoria_e_case_insensitive() {
        assert_eq!(fold_category(" Prensa Escrita "), fold_category("PRENSA ESCRITA"));
    }

    #[test]
    fn backoff_cresce_e_tem_teto() {
        assert!(backoff(1) < backoff(2));
        assert!(backoff(2) < backoff(4));
        assert_eq!(backoff(6), backoff(20));
    }

    // Simulação serializada da admissão: o que a transação garante é que as
    // contagens e o insert sejam equivalentes a ESTA sequência. Sob a
    // política ExcludeRejected, rejeitar uma linha devolve a vaga.
    #[test]
    fn rejeitadas_devolvem_vaga_sob_exclude_rejected() {
        let rule = QuotaRule {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            category: "Prensa Escrita".to_string(),
            max_per_organization: None,
            max_global: Some(2),
            priority: 100,
            created_at: Utc::now(),
        };

        let mut active = 0i64;
        // Duas admissões preenchem a cota global.
        for _ in 0..2 {
            assert!(quota::evaluate(Some(&rule), 0, active).admitted);
            active += 1;
        }
        // A terceira é negada.
        assert!(!quota::evaluate(Some(&rule), 0, active).admitted);
        // Uma rejeição tira a linha da contagem...
        active -= 1;
        // ...e a vaga reabre.
        assert!(quota::evaluate(Some(&rule), 0, active).admitted);
    }

    // Sob IncludeAll a rejeição não devolve vaga: a contagem não muda.
    #[test]
    fn rejeitadas_seguem_contando_sob_include_all() {
        let rule = QuotaRule {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            category: "Prensa Escrita".to_string(),
            max_per_organization: None,
            max_global: Some(2),
            priority: 100,
            created_at: Utc::now(),
        };

        let mut total = 0i64;
        for _ in 0..2 {
            assert!(quota::evaluate(Some(&rule), 0, total).admitted);
            total += 1;
        }
        // Rejeitar uma linha não altera a contagem sob IncludeAll.
        assert!(!quota::evaluate(Some(&rule), 0, total).admitted);
    }

    #[test]
    fn candidato_sem_organizacao_cai_no_balde_implicito() {
        let c = normalize_candidate(candidate(None, "TV"));
        assert!(matches!(
            OrgBucket::from_option(c.organization.as_deref()),
            OrgBucket::Ungrouped
        ));
        let c = normalize_candidate(candidate(Some("El Diario"), "TV"));
        assert!(matches!(
            OrgBucket::from_option(c.organization.as_deref()),
            OrgBucket::Named("El Diario")
        ));
    }
}
