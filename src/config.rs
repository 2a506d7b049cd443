// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{CrmStore, MemoryStore, PgStore},
    services::{
        auth::AuthService, client_service::ClientService, metrics_service::MetricsService,
        visit_service::VisitService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Modo demo: tudo em memória, sem banco.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "demo" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE_BACKEND desconhecido: '{other}' (use postgres ou memory)"),
        }
    }
}

/// Configuração carregada das variáveis de ambiente (e do `.env`).
///
/// | Variável              | Padrão                  |
/// |-----------------------|-------------------------|
/// | `HOST`                | `0.0.0.0`               |
/// | `PORT`                | `3000`                  |
/// | `STORAGE_BACKEND`     | `postgres`              |
/// | `DATABASE_URL`        | obrigatória se postgres |
/// | `DB_MAX_CONNECTIONS`  | `5`                     |
/// | `JWT_SECRET`          | obrigatória             |
/// | `JWT_EXPIRATION_DAYS` | `7`                     |
/// | `BCRYPT_COST`         | `bcrypt::DEFAULT_COST`  |
/// | `CORS_ORIGINS`        | `*`                     |
/// | `STATIC_DIR`          | (sem SPA)               |
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage: StorageBackend = env_or("STORAGE_BACKEND", StorageBackend::Postgres)?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida (ou use STORAGE_BACKEND=memory)");
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000)?,
            storage,
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_expiration_days: env_or("JWT_EXPIRATION_DAYS", 7)?,
            bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_origins,
            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_demo(&self) -> bool {
        self.storage == StorageBackend::Memory
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} inválida ('{raw}'): {e}")),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn CrmStore>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub client_service: ClientService,
    pub visit_service: VisitService,
    pub metrics_service: MetricsService,
}

impl AppState {
    /// Conecta no armazenamento configurado e monta o gráfico de dependências.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn CrmStore> = match settings.storage {
            StorageBackend::Postgres => {
                let database_url = settings
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;

                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgStore::new(db_pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Modo demo: dados em memória, serão perdidos ao reiniciar");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(settings, store))
    }

    pub fn with_store(settings: Settings, store: Arc<dyn CrmStore>) -> Self {
        let auth_service = AuthService::new(
            store.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_expiration_days,
            settings.bcrypt_cost,
        );
        let client_service = ClientService::new(store.clone());
        let visit_service = VisitService::new(store.clone());
        let metrics_service = MetricsService::new(store.clone());

        Self {
            settings: Arc::new(settings),
            store,
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            client_service,
            visit_service,
            metrics_service,
        }
    }
}
