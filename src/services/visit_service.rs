// src/services/visit_service.rs

use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::CrmStore,
    models::{
        client::{Client, ClientChange, ClientPatch},
        visit::{NewVisit, RecordVisitPayload, RecordedVisit, Visit},
    },
};

#[derive(Clone)]
pub struct VisitService {
    store: Arc<dyn CrmStore>,
}

impl VisitService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn list_visits(&self) -> Result<Vec<Visit>, AppError> {
        self.store.list_visits().await
    }

    /// Grava a visita como veio, sem tocar no cliente.
    pub async fn create_visit(&self, payload: NewVisit) -> Result<Visit, AppError> {
        let visit = payload.into_visit();
        let created = self.store.insert_visit(&visit).await?;
        tracing::info!(visit_id = %created.id, place = %created.place_name, "Visita registrada");
        Ok(created)
    }

    /// Fluxo completo do formulário de visita: encontra (ou cria) o cliente,
    /// junta os dados novos e grava tudo junto.
    ///
    /// A busca do cliente e a reconciliação rodam dentro do store, sob o mesmo
    /// lock (ou transação) da escrita.
    pub async fn record_visit(&self, payload: RecordVisitPayload) -> Result<RecordedVisit, AppError> {
        let visit = payload.visit.into_visit();
        let patch = payload.client_update;

        let recorded = self
            .store
            .record_visit(&visit, &|existing: Option<Client>| {
                reconcile(existing, &visit, patch.clone())
            })
            .await?;

        tracing::info!(
            visit_id = %recorded.visit.id,
            client_id = %recorded.client.id,
            client_created = recorded.client_created,
            "Visita reconciliada"
        );

        Ok(recorded)
    }
}

/// Decide o que gravar no cliente por causa de uma visita.
///
/// Cliente existente: campos escalares do `patch` substituem os atuais,
/// telefones e e-mails são concatenados sem repetir, o id da visita entra em
/// `visit_ids` (uma vez só) e a duração soma no tempo total.
/// Sem cliente: nome, endereço e localização vêm da visita; do `patch` só
/// contato, telefones e e-mails.
pub fn reconcile(
    existing: Option<Client>,
    visit: &Visit,
    patch: Option<ClientPatch>,
) -> Result<ClientChange, AppError> {
    let patch = patch.unwrap_or_default();

    match existing {
        Some(mut client) => {
            let ClientPatch { phones, emails, .. } = patch.clone();
            ClientPatch { phones: None, emails: None, visit_ids: None, total_time_spent_minutes: None, ..patch }
                .apply_to(&mut client);

            client.phones = merge_unique(std::mem::take(&mut client.phones), phones.unwrap_or_default());
            client.emails = merge_unique(std::mem::take(&mut client.emails), emails.unwrap_or_default());

            if !client.visit_ids.contains(&visit.id) {
                client.total_time_spent_minutes = client
                    .total_time_spent_minutes
                    .checked_add(visit.duration_minutes)
                    .ok_or_else(total_time_overflow)?;
                client.visit_ids.push(visit.id);
            }

            Ok(ClientChange::Update(client))
        }
        None => Ok(ClientChange::Create(Client {
            id: visit.client_id.unwrap_or_else(Uuid::new_v4),
            name: visit.place_name.clone(),
            address: visit.place_address.clone(),
            location: visit.location,
            contact_name: patch.contact_name,
            phones: merge_unique(Vec::new(), patch.phones.unwrap_or_default()),
            emails: merge_unique(Vec::new(), patch.emails.unwrap_or_default()),
            total_time_spent_minutes: visit.duration_minutes,
            visit_ids: vec![visit.id],
            expenses: Vec::new(),
            documents: Vec::new(),
            contacts: Vec::new(),
        })),
    }
}

// Soma que não cabe em i32 vira 400, não pânico
fn total_time_overflow() -> AppError {
    let mut error = ValidationError::new("total_time_overflow");
    error.message = Some("total_time_overflow".into());

    let mut errors = ValidationErrors::new();
    errors.add("durationMinutes", error);
    AppError::ValidationError(errors)
}

/// `current ++ incoming`, mantendo a primeira ocorrência e ignorando vazios.
fn merge_unique(current: Vec<String>, incoming: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    current
        .into_iter()
        .chain(incoming)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}
