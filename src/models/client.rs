// src/models/client.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

use crate::models::attachment::{Document, Expense};

// Coordenadas. No banco são as colunas `lat` / `lng`; no JSON é o objeto `location`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 40.4168)]
    pub lat: f64,
    #[schema(example = -3.7038)]
    pub lng: f64,
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub address: String,

    #[sqlx(flatten)]
    pub location: GeoPoint,

    pub contact_name: Option<String>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,

    pub total_time_spent_minutes: i32,
    pub visit_ids: Vec<Uuid>,

    // Preenchidos pelo store depois da consulta principal
    #[sqlx(skip)]
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[sqlx(skip)]
    #[serde(default)]
    pub documents: Vec<Document>,
    #[sqlx(skip)]
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

/// Resultado da reconciliação de uma visita: o cliente a gravar e se ele é novo.
#[derive(Debug, Clone)]
pub enum ClientChange {
    Create(Client),
    Update(Client),
}

impl ClientChange {
    pub fn client(&self) -> &Client {
        match self {
            ClientChange::Create(c) | ClientChange::Update(c) => c,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, ClientChange::Create(_))
    }
}

// --- CONTATO ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    /// O app gera o id no dispositivo; se vier, é respeitado.
    pub id: Option<Uuid>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Bar Manolo")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Calle Mayor 1, Madrid")]
    pub address: String,

    #[serde(default)]
    pub location: GeoPoint,

    pub contact_name: Option<String>,

    #[serde(default)]
    pub phones: Vec<String>,

    #[serde(default)]
    pub emails: Vec<String>,

    #[serde(default)]
    #[validate(range(min = 0, message = "negative_duration"))]
    pub total_time_spent_minutes: i32,

    #[serde(default)]
    pub visit_ids: Vec<Uuid>,
}

impl CreateClientPayload {
    pub fn into_client(self) -> Client {
        Client {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name,
            address: self.address,
            location: self.location,
            contact_name: self.contact_name,
            phones: self.phones,
            emails: self.emails,
            total_time_spent_minutes: self.total_time_spent_minutes,
            visit_ids: self.visit_ids,
            expenses: Vec::new(),
            documents: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

/// Atualização parcial: só os campos presentes no corpo mudam.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
    pub contact_name: Option<String>,
    pub phones: Option<Vec<String>>,
    pub emails: Option<Vec<String>>,
    #[validate(range(min = 0, message = "negative_duration"))]
    pub total_time_spent_minutes: Option<i32>,
    pub visit_ids: Option<Vec<Uuid>>,
}

impl ClientPatch {
    /// Substitui os campos presentes (semântica de PUT parcial).
    pub fn apply_to(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(address) = self.address {
            client.address = address;
        }
        if let Some(location) = self.location {
            client.location = location;
        }
        if let Some(contact_name) = self.contact_name {
            client.contact_name = Some(contact_name);
        }
        if let Some(phones) = self.phones {
            client.phones = phones;
        }
        if let Some(emails) = self.emails {
            client.emails = emails;
        }
        if let Some(total) = self.total_time_spent_minutes {
            client.total_time_spent_minutes = total;
        }
        if let Some(visit_ids) = self.visit_ids {
            client.visit_ids = visit_ids;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Lucía Fernández")]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Gerente")]
    pub role: String,

    pub phone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
}

impl NewContact {
    /// O formulário do app manda "" para campos não preenchidos.
    /// Deve rodar antes do `validate()`, senão o e-mail vazio é rejeitado.
    pub fn normalized(self) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            ..self
        }
    }

    pub fn into_contact(self, client_id: Uuid) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            client_id,
            name: self.name,
            role: self.role,
            phone: self.phone,
            email: self.email,
        }
    }
}
