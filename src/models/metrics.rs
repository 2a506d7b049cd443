// src/models/metrics.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{
    attachment::{Document, Expense},
    client::Client,
    visit::Visit,
};

// Números crus que o store agrega (COUNT / SUM)
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct PipelineTotals {
    pub total_clients: i64,
    pub total_visits: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub proposals: i64,
    pub visit_expenses: Decimal,
    pub total_minutes: i64,
}

// 1. Painel do admin (os cards do topo + barras do pipeline)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetrics {
    pub total_clients: i64,
    pub total_visits: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub proposals: i64,
    /// Percentual arredondado de visitas aceitas.
    pub close_rate: i64,
    #[schema(value_type = f64)]
    pub total_expenses: Decimal,
    pub total_minutes: i64,
}

impl From<PipelineTotals> for PipelineMetrics {
    fn from(t: PipelineTotals) -> Self {
        let close_rate = if t.total_visits > 0 {
            ((t.accepted as f64 / t.total_visits as f64) * 100.0).round() as i64
        } else {
            0
        };

        Self {
            total_clients: t.total_clients,
            total_visits: t.total_visits,
            accepted: t.accepted,
            rejected: t.rejected,
            proposals: t.proposals,
            close_rate,
            total_expenses: t.visit_expenses,
            total_minutes: t.total_minutes,
        }
    }
}

// 2. Pasta do cliente
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientFolder {
    pub client: Client,
    pub visits: Vec<Visit>,
    /// Despesas do cliente + das visitas, mais recentes primeiro.
    pub expenses: Vec<Expense>,
    /// Documentos do cliente + das visitas (inclui notas de voz), mais recentes primeiro.
    pub documents: Vec<Document>,
    #[schema(value_type = f64)]
    pub total_expenses: Decimal,
}

impl ClientFolder {
    pub fn assemble(client: Client, mut visits: Vec<Visit>) -> Self {
        visits.retain(|v| v.client_id == Some(client.id));
        visits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut expenses: Vec<Expense> = client
            .expenses
            .iter()
            .cloned()
            .chain(visits.iter().flat_map(|v| v.expenses_added.iter().cloned()))
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));

        let mut documents: Vec<Document> = client
            .documents
            .iter()
            .cloned()
            .chain(visits.iter().flat_map(|v| v.all_documents().cloned()))
            .collect();
        documents.sort_by(|a, b| b.date.cmp(&a.date));

        let total_expenses = expenses.iter().map(|e| e.amount).sum();

        Self {
            client,
            visits,
            expenses,
            documents,
            total_expenses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        attachment::NewExpense,
        client::CreateClientPayload,
        visit::VisitStatus,
    };
    use uuid::Uuid;

    #[test]
    fn close_rate_is_rounded_percentage() {
        let metrics = PipelineMetrics::from(PipelineTotals {
            total_visits: 3,
            accepted: 2,
            ..Default::default()
        });
        assert_eq!(metrics.close_rate, 67);
    }

    #[test]
    fn close_rate_without_visits_is_zero() {
        let metrics = PipelineMetrics::from(PipelineTotals::default());
        assert_eq!(metrics.close_rate, 0);
        assert_eq!(metrics.total_expenses, Decimal::ZERO);
    }

    fn visit_for(client_id: Uuid, timestamp: i64, amount: i64) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            client_id: Some(client_id),
            place_id: String::new(),
            place_name: "Bar".into(),
            place_address: String::new(),
            timestamp,
            feedback: String::new(),
            status: VisitStatus::Accepted,
            tags: vec![],
            location: Default::default(),
            duration_minutes: 10,
            expenses_added: vec![
                NewExpense {
                    id: None,
                    amount: Decimal::from(amount),
                    concept: "Comida".into(),
                    date: timestamp,
                }
                .into_expense(Some(client_id), None),
            ],
            documents_added: vec![],
            voice_notes: vec![],
        }
    }

    #[test]
    fn folder_sums_client_and_visit_expenses_newest_first() {
        let mut client = CreateClientPayload {
            id: None,
            name: "Bar".into(),
            address: String::new(),
            location: Default::default(),
            contact_name: None,
            phones: vec![],
            emails: vec![],
            total_time_spent_minutes: 0,
            visit_ids: vec![],
        }
        .into_client();
        client.expenses.push(
            NewExpense {
                id: None,
                amount: Decimal::new(550, 2),
                concept: "Parking".into(),
                date: 5,
            }
            .into_expense(Some(client.id), None),
        );

        let other = visit_for(Uuid::new_v4(), 100, 999);
        let old = visit_for(client.id, 10, 20);
        let new = visit_for(client.id, 20, 30);

        let folder = ClientFolder::assemble(client, vec![old, other, new]);

        assert_eq!(folder.visits.len(), 2);
        assert_eq!(folder.visits[0].timestamp, 20);
        assert_eq!(folder.total_expenses, Decimal::new(5550, 2));
        let dates: Vec<i64> = folder.expenses.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![20, 10, 5]);
    }
}
