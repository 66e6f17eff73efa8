// src/services/zone.rs

use crate::models::accreditation::{ZoneMatchField, ZoneRule};

/// Atributos do candidato que as regras de zona enxergam.
/// `tipo_medio` é a categoria da solicitação; `cargo` é a função declarada.
#[derive(Debug, Clone)]
pub struct ZoneCandidate<'a> {
    pub cargo: Option<&'a str>,
    pub tipo_medio: &'a str,
}

/// Resolve a zona do candidato percorrendo as regras NA ORDEM recebida
/// (ordem de criação; a primeira inserida vence).
///
/// Cada regra compara só o seu próprio match_field, com trim e sem
/// distinção de maiúsculas. Um candidato pode casar com várias regras sob
/// match_fields diferentes: vale a primeira da lista, não a "mais
/// específica". Sem regra casando, `None`: o painel mostra "Sin zona" e o
/// admin atribui manualmente depois.
pub fn resolve(rules: &[ZoneRule], candidate: &ZoneCandidate<'_>) -> Option<String> {
    for rule in rules {
        let attr = match rule.match_field {
            ZoneMatchField::Cargo => candidate.cargo,
            ZoneMatchField::TipoMedio => Some(candidate.tipo_medio),
        };
        let Some(attr) = attr else {
            continue;
        };
        if attr.trim().to_lowercase() == rule.match_value.trim().to_lowercase() {
            return Some(rule.zone.clone());
        }
    }
    None
}
