// src/db/memory_store.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmStore, Reconciler},
    models::{
        attachment::{Document, Expense},
        auth::User,
        client::{Client, ClientChange, Contact},
        metrics::PipelineTotals,
        visit::{RecordedVisit, Visit, VisitStatus},
    },
};

// Registros "crus", como estariam nas tabelas. Anexos ficam em listas próprias.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    clients: Vec<Client>,
    contacts: Vec<Contact>,
    visits: Vec<Visit>,
    expenses: Vec<Expense>,
    documents: Vec<Document>,
}

impl Tables {
    fn client_exists(&self, id: Uuid) -> bool {
        self.clients.iter().any(|c| c.id == id)
    }

    fn hydrate_client(&self, client: &Client) -> Client {
        let mut c = bare_client(client);
        c.expenses = self
            .expenses
            .iter()
            .filter(|e| e.client_id == Some(c.id) && e.visit_id.is_none())
            .cloned()
            .collect();
        c.documents = self
            .documents
            .iter()
            .filter(|d| d.client_id == Some(c.id) && d.visit_id.is_none())
            .cloned()
            .collect();
        c.contacts = self
            .contacts
            .iter()
            .filter(|ct| ct.client_id == c.id)
            .cloned()
            .collect();
        c.expenses.sort_by(|a, b| b.date.cmp(&a.date));
        c.documents.sort_by(|a, b| b.date.cmp(&a.date));
        c
    }

    fn hydrate_visit(&self, visit: &Visit) -> Visit {
        let mut v = bare_visit(visit);
        v.expenses_added = self
            .expenses
            .iter()
            .filter(|e| e.visit_id == Some(v.id))
            .cloned()
            .collect();
        v.expenses_added.sort_by(|a, b| b.date.cmp(&a.date));

        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .filter(|d| d.visit_id == Some(v.id))
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.date.cmp(&a.date));
        v.attach_documents(docs);
        v
    }

    fn check_attachment_refs(&self, client_id: Option<Uuid>, visit_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = client_id {
            if !self.client_exists(id) {
                return Err(AppError::ResourceNotFound(format!("client {id}")));
            }
        }
        if let Some(id) = visit_id {
            if !self.visits.iter().any(|v| v.id == id) {
                return Err(AppError::ResourceNotFound(format!("visit {id}")));
            }
        }
        Ok(())
    }

    // Pelo id; senão o cadastro mais antigo com o nome do local
    fn locate_client(&self, visit: &Visit) -> Option<Client> {
        visit
            .client_id
            .and_then(|id| self.clients.iter().find(|c| c.id == id))
            .or_else(|| self.clients.iter().find(|c| c.name == visit.place_name))
            .map(|c| self.hydrate_client(c))
    }

    fn push_client(&mut self, client: &Client) -> Result<(), AppError> {
        if self.client_exists(client.id) {
            return Err(AppError::UniqueConstraintViolation(format!("client {}", client.id)));
        }
        self.clients.push(bare_client(client));
        Ok(())
    }

    fn replace_client(&mut self, client: &Client) -> bool {
        match self.clients.iter_mut().find(|c| c.id == client.id) {
            Some(slot) => {
                *slot = bare_client(client);
                true
            }
            None => false,
        }
    }

    // Mesmas regras do banco: id único e FK de cliente válida
    fn check_visit(&self, visit: &Visit) -> Result<(), AppError> {
        if self.visits.iter().any(|v| v.id == visit.id) {
            return Err(AppError::UniqueConstraintViolation(format!("visit {}", visit.id)));
        }
        if let Some(client_id) = visit.client_id {
            if !self.client_exists(client_id) {
                return Err(AppError::ResourceNotFound(format!("client {client_id}")));
            }
        }
        Ok(())
    }

    fn push_visit(&mut self, visit: &Visit) {
        self.visits.push(bare_visit(visit));
        self.expenses.extend(visit.expenses_added.iter().cloned());
        self.documents.extend(visit.all_documents().cloned());
    }
}

fn bare_client(client: &Client) -> Client {
    Client {
        expenses: Vec::new(),
        documents: Vec::new(),
        contacts: Vec::new(),
        ..client.clone()
    }
}

fn bare_visit(visit: &Visit) -> Visit {
    Visit {
        expenses_added: Vec::new(),
        documents_added: Vec::new(),
        voice_notes: Vec::new(),
        ..visit.clone()
    }
}

/// Store em memória para o modo demo e para os testes.
/// Os dados vivem enquanto o processo viver.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let t = self.tables.read().await;
        let mut users = t.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create_user(&self, user: &User) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        t.users.push(user.clone());
        Ok(user.clone())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let t = self.tables.read().await;
        Ok(t.clients.iter().rev().map(|c| t.hydrate_client(c)).collect())
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let t = self.tables.read().await;
        Ok(t.clients.iter().find(|c| c.id == id).map(|c| t.hydrate_client(c)))
    }

    async fn insert_client(&self, client: &Client) -> Result<Client, AppError> {
        let mut t = self.tables.write().await;
        t.push_client(client)?;
        Ok(t.hydrate_client(client))
    }

    async fn update_client(&self, client: &Client) -> Result<Option<Client>, AppError> {
        let mut t = self.tables.write().await;
        if !t.replace_client(client) {
            return Ok(None);
        }
        Ok(Some(t.hydrate_client(client)))
    }

    async fn add_contact(&self, contact: &Contact) -> Result<Contact, AppError> {
        let mut t = self.tables.write().await;
        t.check_attachment_refs(Some(contact.client_id), None)?;
        t.contacts.push(contact.clone());
        Ok(contact.clone())
    }

    async fn add_client_expense(&self, expense: &Expense) -> Result<Expense, AppError> {
        let mut t = self.tables.write().await;
        t.check_attachment_refs(expense.client_id, expense.visit_id)?;
        t.expenses.push(expense.clone());
        Ok(expense.clone())
    }

    async fn add_client_document(&self, document: &Document) -> Result<Document, AppError> {
        let mut t = self.tables.write().await;
        t.check_attachment_refs(document.client_id, document.visit_id)?;
        t.documents.push(document.clone());
        Ok(document.clone())
    }

    async fn list_visits(&self) -> Result<Vec<Visit>, AppError> {
        let t = self.tables.read().await;
        let mut visits: Vec<Visit> = t.visits.iter().map(|v| t.hydrate_visit(v)).collect();
        visits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(visits)
    }

    async fn list_client_visits(&self, client_id: Uuid) -> Result<Vec<Visit>, AppError> {
        let t = self.tables.read().await;
        let mut visits: Vec<Visit> = t
            .visits
            .iter()
            .filter(|v| v.client_id == Some(client_id))
            .map(|v| t.hydrate_visit(v))
            .collect();
        visits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(visits)
    }

    async fn insert_visit(&self, visit: &Visit) -> Result<Visit, AppError> {
        let mut t = self.tables.write().await;
        t.check_visit(visit)?;
        t.push_visit(visit);
        Ok(t.hydrate_visit(visit))
    }

    async fn record_visit(
        &self,
        visit: &Visit,
        reconcile: &Reconciler<'_>,
    ) -> Result<RecordedVisit, AppError> {
        // O write lock cobre busca, reconciliação e escrita
        let mut t = self.tables.write().await;

        if t.visits.iter().any(|v| v.id == visit.id) {
            return Err(AppError::UniqueConstraintViolation(format!("visit {}", visit.id)));
        }

        let change = reconcile(t.locate_client(visit))?;
        let client = change.client();
        let mut visit = visit.clone();
        visit.assign_client(client.id);

        // Validações feitas antes de qualquer escrita: não há rollback a fazer
        match &change {
            ClientChange::Create(c) => t.push_client(c)?,
            ClientChange::Update(c) => {
                if !t.replace_client(c) {
                    return Err(AppError::ResourceNotFound(format!("client {}", c.id)));
                }
            }
        }
        t.push_visit(&visit);

        Ok(RecordedVisit {
            client: t.hydrate_client(client),
            visit: t.hydrate_visit(&visit),
            client_created: change.is_new(),
        })
    }

    async fn pipeline_totals(&self) -> Result<PipelineTotals, AppError> {
        let t = self.tables.read().await;
        let count = |status: VisitStatus| t.visits.iter().filter(|v| v.status == status).count() as i64;

        let visit_expenses: Decimal = t
            .expenses
            .iter()
            .filter(|e| e.visit_id.is_some())
            .map(|e| e.amount)
            .sum();

        Ok(PipelineTotals {
            total_clients: t.clients.len() as i64,
            total_visits: t.visits.len() as i64,
            accepted: count(VisitStatus::Accepted),
            rejected: count(VisitStatus::Rejected),
            proposals: count(VisitStatus::Proposal),
            visit_expenses,
            total_minutes: t.visits.iter().map(|v| v.duration_minutes as i64).sum(),
        })
    }
}
