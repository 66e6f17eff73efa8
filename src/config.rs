// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::AccreditationRepository,
    models::accreditation::CountPolicy,
    services::{notifier::LogNotifier, AdmissionService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub accreditation_repo: AccreditationRepository,
    pub admission_service: AdmissionService,
    pub bind_addr: String,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // Política de contagem: solicitações rejeitadas seguem consumindo
        // cota (include_all, padrão) ou devolvem a vaga (exclude_rejected).
        let count_policy = match env::var("QUOTA_COUNT_POLICY") {
            Ok(raw) => CountPolicy::from_env_value(&raw)?,
            Err(_) => CountPolicy::default(),
        };

        let retry_attempts: u32 = env::var("ADMIT_RETRY_ATTEMPTS")
            .ok()
            .map(|raw| raw.parse())
            .transpose()?
            .unwrap_or(3);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        // --- Monta o gráfico de dependências ---
        let accreditation_repo = AccreditationRepository::new(db_pool.clone());
        let admission_service = AdmissionService::new(
            accreditation_repo.clone(),
            count_policy,
            retry_attempts,
            Arc::new(LogNotifier),
        );

        Ok(Self {
            db_pool,
            accreditation_repo,
            admission_service,
            bind_addr,
        })
    }
}
