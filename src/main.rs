//src/main.rs

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use acreditaciones_backend::{config::AppState, docs, handlers};

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas por evento: regras, admissões e solicitações.
    // O escopo do tenant vem do cabeçalho X-Tenant-ID (extrator TenantContext).
    let event_routes = Router::new()
        .route("/"
               ,post(handlers::events::create_event)
               .get(handlers::events::list_events)
        )
        .route("/{event_id}/quota-rules"
               ,post(handlers::rules::create_quota_rule)
               .get(handlers::rules::list_quota_rules)
        )
        .route("/{event_id}/quota-rules/effective"
               ,get(handlers::rules::get_effective_quota_rule)
        )
        .route("/{event_id}/quota-rules/{rule_id}"
               ,delete(handlers::rules::delete_quota_rule)
        )
        .route("/{event_id}/zone-rules"
               ,post(handlers::rules::create_zone_rule)
               .get(handlers::rules::list_zone_rules)
        )
        .route("/{event_id}/zone-rules/{rule_id}"
               ,delete(handlers::rules::delete_zone_rule)
        )
        .route("/{event_id}/admissions"
               ,post(handlers::admissions::admit)
        )
        .route("/{event_id}/admissions/batch"
               ,post(handlers::admissions::admit_batch)
        )
        .route("/{event_id}/registrations"
               ,get(handlers::admissions::list_registrations)
        )
        .route("/{event_id}/registrations/{registration_id}/status"
               ,patch(handlers::admissions::update_status)
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/events", event_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
