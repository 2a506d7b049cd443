// src/services/client_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmStore,
    models::{
        attachment::{Document, Expense, NewDocument, NewExpense},
        client::{Client, ClientPatch, Contact, CreateClientPayload, NewContact},
        metrics::ClientFolder,
    },
};

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn CrmStore>,
}

impl ClientService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        self.store.list_clients().await
    }

    pub async fn get_client(&self, id: Uuid) -> Result<Client, AppError> {
        self.store
            .find_client(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("client".into()))
    }

    pub async fn create_client(&self, payload: CreateClientPayload) -> Result<Client, AppError> {
        let client = payload.into_client();
        let created = self.store.insert_client(&client).await?;
        tracing::info!(client_id = %created.id, name = %created.name, "Cliente criado");
        Ok(created)
    }

    /// PUT parcial: lê o registro atual, aplica os campos enviados e grava.
    pub async fn update_client(&self, id: Uuid, patch: ClientPatch) -> Result<Client, AppError> {
        let mut client = self.get_client(id).await?;
        patch.apply_to(&mut client);

        self.store
            .update_client(&client)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("client".into()))
    }

    pub async fn add_contact(&self, client_id: Uuid, payload: NewContact) -> Result<Contact, AppError> {
        self.ensure_exists(client_id).await?;
        self.store.add_contact(&payload.into_contact(client_id)).await
    }

    pub async fn add_expense(&self, client_id: Uuid, payload: NewExpense) -> Result<Expense, AppError> {
        self.ensure_exists(client_id).await?;
        self.store
            .add_client_expense(&payload.into_expense(Some(client_id), None))
            .await
    }

    pub async fn add_document(&self, client_id: Uuid, payload: NewDocument) -> Result<Document, AppError> {
        self.ensure_exists(client_id).await?;
        self.store
            .add_client_document(&payload.into_document(Some(client_id), None))
            .await
    }

    /// Pasta do cliente: dados, visitas e todos os anexos juntos.
    pub async fn folder(&self, client_id: Uuid) -> Result<ClientFolder, AppError> {
        let client = self.get_client(client_id).await?;
        let visits = self.store.list_client_visits(client_id).await?;
        Ok(ClientFolder::assemble(client, visits))
    }

    async fn ensure_exists(&self, client_id: Uuid) -> Result<(), AppError> {
        self.get_client(client_id).await.map(|_| ())
    }
}
