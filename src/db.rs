pub mod pg_store;
pub use pg_store::PgStore;
pub mod memory_store;
pub use memory_store::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        attachment::{Document, Expense},
        auth::User,
        client::{Client, ClientChange, Contact},
        metrics::PipelineTotals,
        visit::{RecordedVisit, Visit},
    },
};

/// Recebe o cliente atual (se houver) e decide o que gravar nele.
pub type Reconciler<'a> = dyn Fn(Option<Client>) -> Result<ClientChange, AppError> + Send + Sync + 'a;

/// Persistência do CRM.
///
/// `PgStore` é a implementação de produção; `MemoryStore` atende o modo demo
/// (sem banco) e os testes. Clientes e visitas sempre voltam com os anexos
/// (despesas, documentos, contatos) já carregados.
#[async_trait]
pub trait CrmStore: Send + Sync {
    // --- Usuários ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    /// Falha com `UsernameAlreadyExists` se o username já existir.
    async fn create_user(&self, user: &User) -> Result<User, AppError>;

    // --- Clientes ---
    /// Mais recentes primeiro.
    async fn list_clients(&self) -> Result<Vec<Client>, AppError>;
    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError>;
    async fn insert_client(&self, client: &Client) -> Result<Client, AppError>;
    /// `None` se o cliente não existir.
    async fn update_client(&self, client: &Client) -> Result<Option<Client>, AppError>;
    async fn add_contact(&self, contact: &Contact) -> Result<Contact, AppError>;
    async fn add_client_expense(&self, expense: &Expense) -> Result<Expense, AppError>;
    async fn add_client_document(&self, document: &Document) -> Result<Document, AppError>;

    // --- Visitas ---
    /// Ordenadas por `timestamp` decrescente.
    async fn list_visits(&self) -> Result<Vec<Visit>, AppError>;
    async fn list_client_visits(&self, client_id: Uuid) -> Result<Vec<Visit>, AppError>;
    /// Grava a visita com as despesas e documentos dela.
    async fn insert_visit(&self, visit: &Visit) -> Result<Visit, AppError>;
    /// Localiza o cliente da visita (pelo `client_id`, senão pelo `place_name`
    /// mais antigo), aplica `reconcile` e grava cliente e visita de forma
    /// atômica. Busca e escrita ficam sob o mesmo lock: duas visitas ao mesmo
    /// cliente não se sobrescrevem.
    async fn record_visit(
        &self,
        visit: &Visit,
        reconcile: &Reconciler<'_>,
    ) -> Result<RecordedVisit, AppError>;

    // --- Métricas ---
    async fn pipeline_totals(&self) -> Result<PipelineTotals, AppError>;
}
