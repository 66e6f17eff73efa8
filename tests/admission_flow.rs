// tests/admission_flow.rs
//
// Testes de integração contra um Postgres real. Rodam com:
//   DATABASE_URL=postgres://... cargo test -- --ignored
// Cada teste cria seu próprio evento, então podem compartilhar o banco.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use acreditaciones_backend::{
    common::error::AppError,
    db::AccreditationRepository,
    models::accreditation::{
        Candidate, CountPolicy, DenialReason, Event, RegistrationStatus, ZoneMatchField,
    },
    services::{admission_service::StatusTransition, notifier::LogNotifier, AdmissionService},
};

async fn setup(policy: CountPolicy) -> (PgPool, AccreditationRepository, AdmissionService, Event) {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL deve apontar para um Postgres de teste");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("falha ao conectar no banco de teste");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("falha ao rodar migrações");

    let repo = AccreditationRepository::new(pool.clone());
    let service = AdmissionService::new(repo.clone(), policy, 3, Arc::new(LogNotifier));
    let event = repo
        .create_event(&pool, Uuid::new_v4(), "Partido de prueba")
        .await
        .expect("falha ao criar evento");
    (pool, repo, service, event)
}

fn candidate(organization: Option<&str>, category: &str, cargo: Option<&str>) -> Candidate {
    Candidate {
        organization: organization.map(str::to_string),
        category: category.to_string(),
        cargo: cargo.map(str::to_string),
        full_name: "Ana Pérez".to_string(),
        email: None,
    }
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn organizacao_para_no_proprio_limite() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", Some(2), Some(5), 100)
        .await
        .unwrap();

    // "El Diario" envia 3 em sequência: 1 e 2 entram, a 3ª é negada.
    let mut outcomes = Vec::new();
    for _ in 0..3 {
        let r = service
            .admit(event.id, candidate(Some("El Diario"), "Prensa Escrita", None))
            .await
            .unwrap();
        outcomes.push(r);
    }
    assert!(outcomes[0].admitted);
    assert!(outcomes[1].admitted);
    assert!(!outcomes[2].admitted);
    assert_eq!(outcomes[2].reason, Some(DenialReason::OrgQuotaExceeded));
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn global_barra_organizacao_nova() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", Some(2), Some(4), 100)
        .await
        .unwrap();

    // Duas organizações enchem o global.
    for org in ["Diario A", "Diario B"] {
        for _ in 0..2 {
            let r = service
                .admit(event.id, candidate(Some(org), "Prensa Escrita", None))
                .await
                .unwrap();
            assert!(r.admitted);
        }
    }

    // Organização nova, contagem própria zero: negada pelo global.
    let r = service
        .admit(event.id, candidate(Some("Diario C"), "Prensa Escrita", None))
        .await
        .unwrap();
    assert!(!r.admitted);
    assert_eq!(r.reason, Some(DenialReason::GlobalQuotaExceeded));
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn organizacoes_independentes_sob_o_global() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "TV", Some(2), Some(10), 100)
        .await
        .unwrap();

    // Cada organização chega ao próprio teto mesmo com o combinado (4)
    // acima de max_per_organization (2).
    for org in ["Canal 5", "Canal 9"] {
        for _ in 0..2 {
            let r = service.admit(event.id, candidate(Some(org), "TV", None)).await.unwrap();
            assert!(r.admitted);
        }
        let r = service.admit(event.id, candidate(Some(org), "TV", None)).await.unwrap();
        assert_eq!(r.reason, Some(DenialReason::OrgQuotaExceeded));
    }
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn sem_regra_admite_sem_limite() {
    let (_pool, _repo, service, event) = setup(CountPolicy::IncludeAll).await;

    for _ in 0..20 {
        let r = service
            .admit(event.id, candidate(None, "Invitado Especial", None))
            .await
            .unwrap();
        assert!(r.admitted);
    }
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn categoria_e_case_insensitive_na_cota() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", None, Some(1), 100)
        .await
        .unwrap();

    let r = service
        .admit(event.id, candidate(None, "prensa escrita", None))
        .await
        .unwrap();
    assert!(r.admitted);

    let r = service
        .admit(event.id, candidate(None, "PRENSA ESCRITA", None))
        .await
        .unwrap();
    assert_eq!(r.reason, Some(DenialReason::GlobalQuotaExceeded));
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn zona_atribuida_pela_primeira_regra_criada() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_zone_rule(&pool, event.id, ZoneMatchField::Cargo, "Fotógrafo", "Cancha")
        .await
        .unwrap();
    repo.create_zone_rule(&pool, event.id, ZoneMatchField::TipoMedio, "TV", "Mixta")
        .await
        .unwrap();

    // Candidato casa com as duas regras: vence a criada primeiro.
    let r = service
        .admit(event.id, candidate(Some("Canal 5"), "TV", Some("Fotógrafo")))
        .await
        .unwrap();
    assert!(r.admitted);
    assert_eq!(r.assigned_zone.as_deref(), Some("Cancha"));

    // Sem regra casando: fica "Sin zona" (null).
    let r = service
        .admit(event.id, candidate(Some("Radio X"), "Radio", Some("Redactor")))
        .await
        .unwrap();
    assert!(r.admitted);
    assert_eq!(r.assigned_zone, None);
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn lote_respeita_a_cota_no_meio_do_caminho() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", None, Some(5), 100)
        .await
        .unwrap();

    // Um único lote de 7 já estoura a cota na sexta posição: as admissões
    // anteriores do próprio lote precisam contar para as seguintes.
    let batch: Vec<Candidate> = (0..7)
        .map(|i| candidate(Some(&format!("Org {i}")), "Prensa Escrita", None))
        .collect();
    let results = service.admit_batch(event.id, batch).await.unwrap();

    let admitted: Vec<bool> = results.iter().map(|r| r.admitted).collect();
    assert_eq!(admitted, [true, true, true, true, true, false, false]);
    assert_eq!(results[5].reason, Some(DenialReason::GlobalQuotaExceeded));
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn concorrencia_nao_vende_alem_do_global() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", None, Some(10), 100)
        .await
        .unwrap();

    // 50 admissões concorrentes para max_global = 10: exatamente 10 entram.
    let mut handles = Vec::new();
    for i in 0..50 {
        let service = service.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(async move {
            service
                .admit(event_id, candidate(Some(&format!("Org {i}")), "Prensa Escrita", None))
                .await
        }));
    }

    let mut admitted = 0;
    let mut denied = 0;
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        if result.admitted {
            admitted += 1;
        } else {
            assert_eq!(result.reason, Some(DenialReason::GlobalQuotaExceeded));
            denied += 1;
        }
    }
    assert_eq!(admitted, 10);
    assert_eq!(denied, 40);

    // E o banco confirma: nenhuma linha além do teto.
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(event.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 10);
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn regra_duplicada_vale_a_de_menor_prioridade() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    // Linha legada com teto alto e prioridade alta; a nova, mais restrita,
    // tem prioridade menor e deve valer.
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", None, Some(50), 200)
        .await
        .unwrap();
    repo.create_quota_rule(&pool, event.id, "Prensa Escrita", None, Some(1), 10)
        .await
        .unwrap();

    let r = service
        .admit(event.id, candidate(None, "Prensa Escrita", None))
        .await
        .unwrap();
    assert!(r.admitted);
    let r = service
        .admit(event.id, candidate(None, "Prensa Escrita", None))
        .await
        .unwrap();
    assert_eq!(r.reason, Some(DenialReason::GlobalQuotaExceeded));
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn reviver_rejeitada_recheca_cota_sob_exclude_rejected() {
    let (pool, repo, service, event) = setup(CountPolicy::ExcludeRejected).await;
    repo.create_quota_rule(&pool, event.id, "TV", None, Some(2), 100)
        .await
        .unwrap();

    let first = service.admit(event.id, candidate(Some("Canal 5"), "TV", None)).await.unwrap();
    let second = service.admit(event.id, candidate(Some("Canal 9"), "TV", None)).await.unwrap();
    assert!(first.admitted && second.admitted);

    // Cota cheia: a terceira é negada.
    let third = service.admit(event.id, candidate(Some("Canal 13"), "TV", None)).await.unwrap();
    assert!(!third.admitted);

    // Rejeitar a primeira devolve a vaga...
    let first_id = first.registration_id.unwrap();
    let outcome = service
        .update_status(event.id, first_id, RegistrationStatus::Rejected)
        .await
        .unwrap();
    assert!(matches!(outcome, StatusTransition::Applied(_)));

    // ...e agora uma nova admissão entra.
    let fourth = service.admit(event.id, candidate(Some("Canal 13"), "TV", None)).await.unwrap();
    assert!(fourth.admitted);

    // Reviver a rejeitada com a cota cheia de novo é negado por cota,
    // e a linha permanece rejeitada.
    let outcome = service
        .update_status(event.id, first_id, RegistrationStatus::Pending)
        .await
        .unwrap();
    match outcome {
        StatusTransition::Denied(reason) => assert_eq!(reason, DenialReason::GlobalQuotaExceeded),
        StatusTransition::Applied(_) => panic!("revivência deveria ter sido negada por cota"),
    }
    let row = repo.get_registration(&pool, event.id, first_id).await.unwrap().unwrap();
    assert_eq!(row.status, RegistrationStatus::Rejected);
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn sob_include_all_rejeitada_segue_contando() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "TV", None, Some(1), 100)
        .await
        .unwrap();

    let first = service.admit(event.id, candidate(Some("Canal 5"), "TV", None)).await.unwrap();
    assert!(first.admitted);

    service
        .update_status(event.id, first.registration_id.unwrap(), RegistrationStatus::Rejected)
        .await
        .unwrap();

    // A linha rejeitada continua consumindo a vaga.
    let second = service.admit(event.id, candidate(Some("Canal 9"), "TV", None)).await.unwrap();
    assert!(!second.admitted);
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn evento_inexistente_e_erro_duro() {
    let (_pool, _repo, service, _event) = setup(CountPolicy::IncludeAll).await;

    let result = service
        .admit(Uuid::new_v4(), candidate(None, "TV", None))
        .await;
    assert!(matches!(result, Err(AppError::UnknownEvent)));
}

#[tokio::test]
#[ignore = "requer DATABASE_URL apontando para um Postgres de teste"]
async fn solicitacoes_sem_organizacao_dividem_o_mesmo_balde() {
    let (pool, repo, service, event) = setup(CountPolicy::IncludeAll).await;
    repo.create_quota_rule(&pool, event.id, "Radio", Some(2), None, 100)
        .await
        .unwrap();

    // None e string vazia caem no mesmo balde implícito.
    let r = service.admit(event.id, candidate(None, "Radio", None)).await.unwrap();
    assert!(r.admitted);
    let r = service.admit(event.id, candidate(Some("  "), "Radio", None)).await.unwrap();
    assert!(r.admitted);
    let r = service.admit(event.id, candidate(None, "Radio", None)).await.unwrap();
    assert_eq!(r.reason, Some(DenialReason::OrgQuotaExceeded));
}
