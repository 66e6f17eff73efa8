// src/db/accreditation_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::accreditation::{
        CountPolicy, Event, QuotaRule, Registration, RegistrationStatus, ZoneMatchField, ZoneRule,
    },
};

#[derive(Clone)]
pub struct AccreditationRepository {
    pool: PgPool,
}

impl AccreditationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Eventos
    // ---

    pub async fn create_event<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<Event, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (tenant_id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(event)
    }

    pub async fn get_event<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
    ) -> Result<Option<Event>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(executor)
            .await?;
        Ok(event)
    }

    pub async fn list_events<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Event>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(events)
    }

    // ---
    // Regras de Cota
    // ---
    // A categoria chega aqui já normalizada (trim + lowercase) pelo chamador.
    // Linhas duplicadas por (evento, categoria) são toleradas: a efetiva é a
    // de menor `priority`, empate decidido pela criada mais recentemente.

    pub async fn get_quota_rule<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        category_folded: &str,
    ) -> Result<Option<QuotaRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rule = sqlx::query_as::<_, QuotaRule>(
            r#"
            SELECT * FROM quota_rules
            WHERE event_id = $1 AND lower(category) = $2
            ORDER BY priority ASC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .bind(category_folded)
        .fetch_optional(executor)
        .await?;
        Ok(rule)
    }

    /// Mesma seleção de `get_quota_rule`, mas trancando TODAS as linhas da
    /// categoria com FOR UPDATE. Esse é o ponto de serialização da admissão:
    /// duas admissões concorrentes para a mesma (evento, categoria) ficam em
    /// fila aqui, antes do count-and-compare. Categoria sem regra não tranca
    /// nada (sem teto não há corrida que importe).
    pub async fn get_quota_rule_for_update<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        category_folded: &str,
    ) -> Result<Option<QuotaRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut rules = sqlx::query_as::<_, QuotaRule>(
            r#"
            SELECT * FROM quota_rules
            WHERE event_id = $1 AND lower(category) = $2
            ORDER BY priority ASC, created_at DESC
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .bind(category_folded)
        .fetch_all(executor)
        .await?;

        if rules.is_empty() {
            return Ok(None);
        }
        Ok(Some(rules.remove(0)))
    }

    pub async fn create_quota_rule<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        category: &str,
        max_per_organization: Option<i32>,
        max_global: Option<i32>,
        priority: i32,
    ) -> Result<QuotaRule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rule = sqlx::query_as::<_, QuotaRule>(
            r#"
            INSERT INTO quota_rules (event_id, category, max_per_organization, max_global, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(category)
        .bind(max_per_organization)
        .bind(max_global)
        .bind(priority)
        .fetch_one(executor)
        .await?;
        Ok(rule)
    }

    pub async fn list_quota_rules<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
    ) -> Result<Vec<QuotaRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rules = sqlx::query_as::<_, QuotaRule>(
            "SELECT * FROM quota_rules WHERE event_id = $1 ORDER BY priority ASC, created_at DESC",
        )
        .bind(event_id)
        .fetch_all(executor)
        .await?;
        Ok(rules)
    }

    pub async fn delete_quota_rule<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM quota_rules WHERE id = $1 AND event_id = $2")
            .bind(rule_id)
            .bind(event_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RuleNotFound);
        }
        Ok(())
    }

    // ---
    // Regras de Zona
    // ---
    // Ordem de avaliação = ordem de criação (a primeira inserida vence).
    // O desempate por `id` cobre linhas criadas no mesmo microssegundo.

    pub async fn get_zone_rules<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
    ) -> Result<Vec<ZoneRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rules = sqlx::query_as::<_, ZoneRule>(
            "SELECT * FROM zone_rules WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(event_id)
        .fetch_all(executor)
        .await?;
        Ok(rules)
    }

    pub async fn create_zone_rule<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        match_field: ZoneMatchField,
        match_value: &str,
        zone: &str,
    ) -> Result<ZoneRule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ZoneRule>(
            r#"
            INSERT INTO zone_rules (event_id, match_field, match_value, zone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(match_field)
        .bind(match_value)
        .bind(zone)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateZoneRule;
                }
            }
            e.into()
        })
    }

    pub async fn delete_zone_rule<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM zone_rules WHERE id = $1 AND event_id = $2")
            .bind(rule_id)
            .bind(event_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RuleNotFound);
        }
        Ok(())
    }

    // ---
    // Solicitações (registrations)
    // ---

    /// Conta as solicitações existentes que consomem cota.
    ///
    /// Categoria: comparação case-insensitive. `organization = None` é a
    /// contagem global; `Some(bucket)` é a contagem por organização, com
    /// comparação exata e case-sensitive. O balde `Ungrouped` agrupa as
    /// solicitações sem organização (NULL ou string vazia legada).
    pub async fn count_registrations<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        category_folded: &str,
        organization: Option<OrgBucket<'_>>,
        policy: CountPolicy,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut sql = String::from(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND lower(category) = $2",
        );
        if policy == CountPolicy::ExcludeRejected {
            sql.push_str(" AND status <> 'rejected'");
        }
        match organization {
            Some(OrgBucket::Named(_)) => sql.push_str(" AND organization = $3"),
            Some(OrgBucket::Ungrouped) => {
                sql.push_str(" AND (organization IS NULL OR organization = '')")
            }
            None => {}
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql)
            .bind(event_id)
            .bind(category_folded);
        if let Some(OrgBucket::Named(org)) = organization {
            query = query.bind(org);
        }

        let count = query.fetch_one(executor).await?;
        Ok(count)
    }

    pub async fn insert_registration<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        organization: Option<&str>,
        category: &str,
        cargo: Option<&str>,
        full_name: &str,
        email: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Registration, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (event_id, organization, category, cargo, full_name, email, status, zone)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(organization)
        .bind(category)
        .bind(cargo)
        .bind(full_name)
        .bind(email)
        .bind(zone)
        .fetch_one(executor)
        .await?;
        Ok(registration)
    }

    pub async fn get_registration<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT * FROM registrations WHERE id = $1 AND event_id = $2",
        )
        .bind(registration_id)
        .bind(event_id)
        .fetch_optional(executor)
        .await?;
        Ok(registration)
    }

    /// Versão com FOR UPDATE, para a transição de status que re-checa cota.
    pub async fn get_registration_for_update<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT * FROM registrations WHERE id = $1 AND event_id = $2 FOR UPDATE",
        )
        .bind(registration_id)
        .bind(event_id)
        .fetch_optional(executor)
        .await?;
        Ok(registration)
    }

    pub async fn update_registration_status<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
        registration_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<Registration, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET status = $3, updated_at = now()
            WHERE id = $1 AND event_id = $2
            RETURNING *
            "#,
        )
        .bind(registration_id)
        .bind(event_id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::RegistrationNotFound)?;
        Ok(registration)
    }

    pub async fn list_registrations<'e, E>(
        &self,
        executor: E,
        event_id: Uuid,
    ) -> Result<Vec<Registration>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let registrations = sqlx::query_as::<_, Registration>(
            "SELECT * FROM registrations WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(executor)
        .await?;
        Ok(registrations)
    }
}

/// Balde de organização usado na contagem por organização.
#[derive(Debug, Clone, Copy)]
pub enum OrgBucket<'a> {
    Named(&'a str),
    Ungrouped,
}

impl<'a> OrgBucket<'a> {
    pub fn from_option(organization: Option<&'a str>) -> Self {
        match organization {
            Some(org) if !org.is_empty() => Self::Named(org),
            _ => Self::Ungrouped,
        }
    }
}
