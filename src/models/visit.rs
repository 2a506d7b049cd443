// src/models/visit.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use utoipa::ToSchema;

use crate::models::{
    attachment::{Document, DocumentKind, Expense, NewDocument, NewExpense},
    client::{Client, ClientPatch, GeoPoint},
};

// Mapeia o CREATE TYPE visit_status do banco.
// Os valores em espanhol são o contrato com o app, não mudar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "visit_status")]
pub enum VisitStatus {
    #[sqlx(rename = "aceptado")]
    #[serde(rename = "aceptado")]
    Accepted,
    #[sqlx(rename = "rechazado")]
    #[serde(rename = "rechazado")]
    Rejected,
    #[sqlx(rename = "propuesta")]
    #[serde(rename = "propuesta")]
    Proposal,
}

// --- VISITA ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub client_id: Option<Uuid>,

    pub place_id: String,
    pub place_name: String,
    pub place_address: String,

    /// Epoch em milissegundos.
    pub timestamp: i64,
    pub feedback: String,
    pub status: VisitStatus,
    pub tags: Vec<String>,

    #[sqlx(flatten)]
    pub location: GeoPoint,

    pub duration_minutes: i32,

    #[sqlx(skip)]
    #[serde(default)]
    pub expenses_added: Vec<Expense>,
    #[sqlx(skip)]
    #[serde(default)]
    pub documents_added: Vec<Document>,
    #[sqlx(skip)]
    #[serde(default)]
    pub voice_notes: Vec<Document>,
}

impl Visit {
    /// Distribui os documentos da visita: áudio vai para `voice_notes`.
    pub fn attach_documents(&mut self, documents: impl IntoIterator<Item = Document>) {
        for doc in documents {
            if doc.kind == DocumentKind::Audio {
                self.voice_notes.push(doc);
            } else {
                self.documents_added.push(doc);
            }
        }
    }

    /// Vincula a visita e todos os anexos dela ao cliente.
    pub fn assign_client(&mut self, client_id: Uuid) {
        self.client_id = Some(client_id);
        for e in &mut self.expenses_added {
            e.client_id = Some(client_id);
        }
        for d in self.documents_added.iter_mut().chain(self.voice_notes.iter_mut()) {
            d.client_id = Some(client_id);
        }
    }

    pub fn all_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents_added.iter().chain(self.voice_notes.iter())
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub id: Option<Uuid>,
    pub client_id: Option<Uuid>,

    #[serde(default)]
    #[schema(example = "ChIJ...")]
    pub place_id: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Bar Manolo")]
    pub place_name: String,

    #[serde(default)]
    pub place_address: String,

    pub timestamp: i64,

    #[serde(default)]
    pub feedback: String,

    pub status: VisitStatus,

    #[serde(default)]
    #[schema(example = json!(["hostelería", "zona-centro"]))]
    pub tags: Vec<String>,

    #[serde(default)]
    pub location: GeoPoint,

    #[serde(default)]
    #[validate(range(min = 0, message = "negative_duration"))]
    pub duration_minutes: i32,

    #[serde(default)]
    #[validate(nested)]
    pub expenses_added: Vec<NewExpense>,

    #[serde(default)]
    #[validate(nested)]
    pub documents_added: Vec<NewDocument>,

    #[serde(default)]
    #[validate(nested)]
    pub voice_notes: Vec<NewDocument>,
}

impl NewVisit {
    /// Monta a visita final. Despesas e documentos herdam o vínculo com a
    /// visita e com o cliente.
    pub fn into_visit(self) -> Visit {
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        let client_id = self.client_id;

        let mut visit = Visit {
            id,
            client_id,
            place_id: self.place_id,
            place_name: self.place_name,
            place_address: self.place_address,
            timestamp: self.timestamp,
            feedback: self.feedback,
            status: self.status,
            tags: self.tags,
            location: self.location,
            duration_minutes: self.duration_minutes,
            expenses_added: self
                .expenses_added
                .into_iter()
                .map(|e| e.into_expense(client_id, Some(id)))
                .collect(),
            documents_added: Vec::new(),
            voice_notes: Vec::new(),
        };

        let documents = self
            .documents_added
            .into_iter()
            .chain(self.voice_notes)
            .map(|d| d.into_document(client_id, Some(id)))
            .collect::<Vec<_>>();
        visit.attach_documents(documents);

        visit
    }
}

/// Corpo de `POST /api/visits/record`: a visita e, opcionalmente, dados do
/// cliente coletados no formulário.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitPayload {
    #[validate(nested)]
    pub visit: NewVisit,

    #[validate(nested)]
    pub client_update: Option<ClientPatch>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordedVisit {
    pub client: Client,
    pub visit: Visit,
    /// `true` quando a visita gerou um cliente novo.
    pub client_created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visit_payload_accepts_app_shape() {
        let payload: NewVisit = serde_json::from_value(json!({
            "id": "6f1c1d9e-8f5c-4a43-9a0c-9b1f7e2d1a10",
            "placeId": "p-1",
            "placeName": "Bar Manolo",
            "placeAddress": "Calle Mayor 1",
            "timestamp": 1_700_000_000_000i64,
            "feedback": "Interesados en la carta de vinos",
            "status": "propuesta",
            "tags": ["vinos"],
            "location": { "lat": 40.4, "lng": -3.7 },
            "durationMinutes": 25,
            "expensesAdded": [{ "amount": 12.5, "concept": "Café", "date": 1 }],
            "voiceNotes": [{ "name": "nota", "type": "audio", "date": 1, "data": "AAAA" }]
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        let visit = payload.into_visit();

        assert_eq!(visit.status, VisitStatus::Proposal);
        assert_eq!(visit.expenses_added.len(), 1);
        assert_eq!(visit.expenses_added[0].visit_id, Some(visit.id));
        assert_eq!(visit.voice_notes.len(), 1);
        assert!(visit.documents_added.is_empty());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = serde_json::from_value::<NewVisit>(json!({
            "placeName": "Bar",
            "timestamp": 1,
            "status": "ganado"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn audio_documents_are_split_from_the_rest() {
        let payload: NewVisit = serde_json::from_value(json!({
            "placeName": "Bar",
            "timestamp": 1,
            "status": "aceptado",
            "documentsAdded": [
                { "name": "catálogo", "type": "pdf", "date": 1 },
                { "name": "audio suelto", "type": "audio", "date": 2 }
            ]
        }))
        .unwrap();

        let visit = payload.into_visit();
        assert_eq!(visit.documents_added.len(), 1);
        assert_eq!(visit.voice_notes.len(), 1);
        assert_eq!(visit.all_documents().count(), 2);
    }
}
