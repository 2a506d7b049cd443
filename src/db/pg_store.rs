// src/db/pg_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmStore, Reconciler},
    models::{
        attachment::{Document, Expense},
        auth::User,
        client::{Client, ClientChange, Contact},
        metrics::PipelineTotals,
        visit::{RecordedVisit, Visit},
    },
};

const USER_COLUMNS: &str = "id, username, role, name, password_hash, created_at";
const CLIENT_COLUMNS: &str = "id, name, address, lat, lng, contact_name, phones, emails, \
     total_time_spent_minutes, visit_ids";
const VISIT_COLUMNS: &str = r#"id, client_id, place_id, place_name, place_address, "timestamp",
     feedback, status, tags, lat, lng, duration_minutes"#;
const EXPENSE_COLUMNS: &str = "id, client_id, visit_id, amount, concept, date";
const DOCUMENT_COLUMNS: &str = "id, client_id, visit_id, name, kind, date, data";
const CONTACT_COLUMNS: &str = "id, client_id, name, role, phone, email";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Carrega despesas/documentos "soltos" (sem visita) e contatos de cada cliente
    async fn hydrate_clients(&self, mut clients: Vec<Client>) -> Result<Vec<Client>, AppError> {
        if clients.is_empty() {
            return Ok(clients);
        }
        let ids: Vec<Uuid> = clients.iter().map(|c| c.id).collect();

        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE client_id = ANY($1) AND visit_id IS NULL
             ORDER BY date DESC"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE client_id = ANY($1) AND visit_id IS NULL
             ORDER BY date DESC"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             WHERE client_id = ANY($1)
             ORDER BY created_at ASC"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut expenses = group_by(expenses, |e| e.client_id);
        let mut documents = group_by(documents, |d| d.client_id);
        let mut contacts = group_by(contacts, |c| Some(c.client_id));

        for client in &mut clients {
            client.expenses = expenses.remove(&client.id).unwrap_or_default();
            client.documents = documents.remove(&client.id).unwrap_or_default();
            client.contacts = contacts.remove(&client.id).unwrap_or_default();
        }
        Ok(clients)
    }

    async fn hydrate_client(&self, client: Client) -> Result<Client, AppError> {
        self.hydrate_clients(vec![client])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("cliente sumiu durante a hidratação").into())
    }

    async fn hydrate_visits(&self, mut visits: Vec<Visit>) -> Result<Vec<Visit>, AppError> {
        if visits.is_empty() {
            return Ok(visits);
        }
        let ids: Vec<Uuid> = visits.iter().map(|v| v.id).collect();

        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE visit_id = ANY($1) ORDER BY date DESC"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE visit_id = ANY($1) ORDER BY date DESC"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut expenses = group_by(expenses, |e| e.visit_id);
        let mut documents = group_by(documents, |d| d.visit_id);

        for visit in &mut visits {
            visit.expenses_added = expenses.remove(&visit.id).unwrap_or_default();
            visit.attach_documents(documents.remove(&visit.id).unwrap_or_default());
        }
        Ok(visits)
    }
}

#[async_trait]
impl CrmStore for PgStore {
    // =========================================================================
    //  USUÁRIOS
    // =========================================================================

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, role, name, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(user.role)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UsernameAlreadyExists;
                }
            }
            e.into()
        })
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_clients(clients).await
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match client {
            Some(c) => Ok(Some(self.hydrate_client(c).await?)),
            None => Ok(None),
        }
    }

    async fn insert_client(&self, client: &Client) -> Result<Client, AppError> {
        let saved = insert_client_row(&self.pool, client).await?;
        Ok(saved)
    }

    async fn update_client(&self, client: &Client) -> Result<Option<Client>, AppError> {
        match update_client_row(&self.pool, client).await? {
            Some(c) => Ok(Some(self.hydrate_client(c).await?)),
            None => Ok(None),
        }
    }

    async fn add_contact(&self, contact: &Contact) -> Result<Contact, AppError> {
        sqlx::query_as::<_, Contact>(&format!(
            "INSERT INTO contacts (id, client_id, name, role, phone, email)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(contact.id)
        .bind(contact.client_id)
        .bind(&contact.name)
        .bind(&contact.role)
        .bind(contact.phone.as_deref())
        .bind(contact.email.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, format!("client {}", contact.client_id)))
    }

    async fn add_client_expense(&self, expense: &Expense) -> Result<Expense, AppError> {
        insert_expense(&self.pool, expense).await
    }

    async fn add_client_document(&self, document: &Document) -> Result<Document, AppError> {
        insert_document(&self.pool, document).await
    }

    // =========================================================================
    //  VISITAS
    // =========================================================================

    async fn list_visits(&self) -> Result<Vec<Visit>, AppError> {
        let visits = sqlx::query_as::<_, Visit>(&format!(
            r#"SELECT {VISIT_COLUMNS} FROM visits ORDER BY "timestamp" DESC"#
        ))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_visits(visits).await
    }

    async fn list_client_visits(&self, client_id: Uuid) -> Result<Vec<Visit>, AppError> {
        let visits = sqlx::query_as::<_, Visit>(&format!(
            r#"SELECT {VISIT_COLUMNS} FROM visits WHERE client_id = $1 ORDER BY "timestamp" DESC"#
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_visits(visits).await
    }

    async fn insert_visit(&self, visit: &Visit) -> Result<Visit, AppError> {
        // Visita + anexos: tudo ou nada
        let mut tx = self.pool.begin().await?;
        let saved = write_visit(&mut tx, visit).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn record_visit(
        &self,
        visit: &Visit,
        reconcile: &Reconciler<'_>,
    ) -> Result<RecordedVisit, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // Linha do cliente travada até o commit: reconciliação concorrente espera
        let existing = lock_visit_client(&mut tx, visit).await?;
        let change = reconcile(existing)?;

        let mut visit = visit.clone();
        visit.assign_client(change.client().id);

        let client = match &change {
            ClientChange::Create(c) => insert_client_row(&mut *tx, c).await?,
            ClientChange::Update(c) => update_client_row(&mut *tx, c)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("client {}", c.id)))?,
        };

        // Se falhar aqui, o cliente gravado acima é desfeito no drop do tx
        let saved_visit = write_visit(&mut tx, &visit).await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(RecordedVisit {
            client: self.hydrate_client(client).await?,
            visit: saved_visit,
            client_created: change.is_new(),
        })
    }

    // =========================================================================
    //  MÉTRICAS
    // =========================================================================

    async fn pipeline_totals(&self) -> Result<PipelineTotals, AppError> {
        let totals = sqlx::query_as::<_, PipelineTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM clients) AS total_clients,
                COUNT(*) AS total_visits,
                COUNT(*) FILTER (WHERE status = 'aceptado') AS accepted,
                COUNT(*) FILTER (WHERE status = 'rechazado') AS rejected,
                COUNT(*) FILTER (WHERE status = 'propuesta') AS proposals,
                (SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE visit_id IS NOT NULL)
                    AS visit_expenses,
                COALESCE(SUM(duration_minutes), 0)::BIGINT AS total_minutes
            FROM visits
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}

// -----------------------------------------------------------------------------
//  Escritas que rodam tanto no pool quanto dentro de uma transação
// -----------------------------------------------------------------------------

async fn insert_client_row<'e, E>(executor: E, client: &Client) -> Result<Client, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Client>(&format!(
        "INSERT INTO clients (
            id, name, address, lat, lng, contact_name,
            phones, emails, total_time_spent_minutes, visit_ids
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {CLIENT_COLUMNS}"
    ))
    .bind(client.id)
    .bind(&client.name)
    .bind(&client.address)
    .bind(client.location.lat)
    .bind(client.location.lng)
    .bind(client.contact_name.as_deref())
    .bind(client.phones.as_slice())
    .bind(client.emails.as_slice())
    .bind(client.total_time_spent_minutes)
    .bind(client.visit_ids.as_slice())
    .fetch_one(executor)
    .await
    .map_err(|e| write_error(e, format!("client {}", client.id)))
}

async fn update_client_row<'e, E>(executor: E, client: &Client) -> Result<Option<Client>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let updated = sqlx::query_as::<_, Client>(&format!(
        "UPDATE clients SET
            name = $2, address = $3, lat = $4, lng = $5, contact_name = $6,
            phones = $7, emails = $8, total_time_spent_minutes = $9, visit_ids = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CLIENT_COLUMNS}"
    ))
    .bind(client.id)
    .bind(&client.name)
    .bind(&client.address)
    .bind(client.location.lat)
    .bind(client.location.lng)
    .bind(client.contact_name.as_deref())
    .bind(client.phones.as_slice())
    .bind(client.emails.as_slice())
    .bind(client.total_time_spent_minutes)
    .bind(client.visit_ids.as_slice())
    .fetch_optional(executor)
    .await?;

    Ok(updated)
}

async fn insert_expense<'e, E>(executor: E, expense: &Expense) -> Result<Expense, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Expense>(&format!(
        "INSERT INTO expenses (id, client_id, visit_id, amount, concept, date)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(expense.id)
    .bind(expense.client_id)
    .bind(expense.visit_id)
    .bind(expense.amount)
    .bind(&expense.concept)
    .bind(expense.date)
    .fetch_one(executor)
    .await
    .map_err(|e| write_error(e, format!("expense {}", expense.id)))
}

async fn insert_document<'e, E>(executor: E, document: &Document) -> Result<Document, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Document>(&format!(
        "INSERT INTO documents (id, client_id, visit_id, name, kind, date, data)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {DOCUMENT_COLUMNS}"
    ))
    .bind(document.id)
    .bind(document.client_id)
    .bind(document.visit_id)
    .bind(&document.name)
    .bind(document.kind)
    .bind(document.date)
    .bind(document.data.as_deref())
    .fetch_one(executor)
    .await
    .map_err(|e| write_error(e, format!("document {}", document.id)))
}

// Busca o cliente da visita com `FOR UPDATE`. Na busca por nome, um advisory
// lock no nome do local serializa quem ainda vai criar o cliente.
async fn lock_visit_client(conn: &mut PgConnection, visit: &Visit) -> Result<Option<Client>, AppError> {
    if let Some(id) = visit.client_id {
        let by_id = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        if by_id.is_some() {
            return Ok(by_id);
        }
    }

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&visit.place_name)
        .execute(&mut *conn)
        .await?;

    // Nome não é único: fica com o cadastro mais antigo
    let by_name = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients
         WHERE name = $1
         ORDER BY created_at ASC
         LIMIT 1
         FOR UPDATE"
    ))
    .bind(&visit.place_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(by_name)
}

// Visita com despesas e documentos, na conexão (transação) recebida
async fn write_visit(conn: &mut PgConnection, visit: &Visit) -> Result<Visit, AppError> {
    let mut saved = sqlx::query_as::<_, Visit>(&format!(
        r#"INSERT INTO visits (
            id, client_id, place_id, place_name, place_address, "timestamp",
            feedback, status, tags, lat, lng, duration_minutes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {VISIT_COLUMNS}"#
    ))
    .bind(visit.id)
    .bind(visit.client_id)
    .bind(&visit.place_id)
    .bind(&visit.place_name)
    .bind(&visit.place_address)
    .bind(visit.timestamp)
    .bind(&visit.feedback)
    .bind(visit.status)
    .bind(visit.tags.as_slice())
    .bind(visit.location.lat)
    .bind(visit.location.lng)
    .bind(visit.duration_minutes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| write_error(e, format!("visit {}", visit.id)))?;

    for expense in &visit.expenses_added {
        let e = insert_expense(&mut *conn, expense).await?;
        saved.expenses_added.push(e);
    }

    let mut documents = Vec::new();
    for document in visit.all_documents() {
        documents.push(insert_document(&mut *conn, document).await?);
    }
    saved.attach_documents(documents);

    Ok(saved)
}

// Chave duplicada -> 409; FK inexistente (cliente/visita) -> 404
fn write_error(e: sqlx::Error, what: String) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what);
        }
        if db_err.is_foreign_key_violation() {
            let target = db_err.constraint().unwrap_or("referência").to_string();
            return AppError::ResourceNotFound(target);
        }
    }
    e.into()
}

fn group_by<T>(items: Vec<T>, key: impl Fn(&T) -> Option<Uuid>) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for item in items {
        if let Some(k) = key(&item) {
            grouped.entry(k).or_default().push(item);
        }
    }
    grouped
}
