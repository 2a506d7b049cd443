// src/models/attachment.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};
use utoipa::ToSchema;

// Mapeia o CREATE TYPE document_kind do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "document_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Img,
    Doc,
    Audio,
}

// --- DESPESA ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<Uuid>,

    #[schema(value_type = f64, example = 12.5)]
    pub amount: Decimal,
    pub concept: String,
    /// Epoch em milissegundos, como o app mobile envia.
    pub date: i64,
}

// --- DOCUMENTO (PDF, imagem, áudio...) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<Uuid>,

    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub date: i64,

    // Base64 (áudio ou preview pequeno)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub id: Option<Uuid>,

    #[validate(custom(function = "non_negative_amount"))]
    #[schema(value_type = f64, example = 12.5)]
    pub amount: Decimal,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Comida con cliente")]
    pub concept: String,

    pub date: i64,
}

impl NewExpense {
    pub fn into_expense(self, client_id: Option<Uuid>, visit_id: Option<Uuid>) -> Expense {
        Expense {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            client_id,
            visit_id,
            amount: self.amount,
            concept: self.concept,
            date: self.date,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub id: Option<Uuid>,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Presupuesto 2025")]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: DocumentKind,

    pub date: i64,

    pub data: Option<String>,
}

impl NewDocument {
    pub fn into_document(self, client_id: Option<Uuid>, visit_id: Option<Uuid>) -> Document {
        Document {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            client_id,
            visit_id,
            name: self.name,
            kind: self.kind,
            date: self.date,
            data: self.data,
        }
    }
}

fn non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        let mut err = ValidationError::new("negative_amount");
        err.message = Some("negative_amount".into());
        return Err(err);
    }
    Ok(())
}
