// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CrmStore,
    models::auth::{AuthResponse, Claims, CreateUserPayload, Role, User},
};

// Usuários padrão criados na inicialização (usuário, senha, papel, nome)
const DEFAULT_USERS: &[(&str, &str, Role, &str)] = &[
    ("admin", "adminpassword", Role::Admin, "Admin User"),
    ("comercial", "password", Role::Commercial, "Comercial User"),
];

const DEMO_USER: (&str, &str, Role, &str) = ("demo", "demo", Role::Commercial, "Usuario Demo");

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CrmStore>,
    jwt_secret: String,
    token_ttl_days: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CrmStore>,
        jwt_secret: String,
        token_ttl_days: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self { store, jwt_secret, token_ttl_days, bcrypt_cost }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.store
            .find_user_by_username(username)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            tracing::warn!(username, "Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        tracing::info!(user_id = %user.id, "Login efetuado");

        Ok(AuthResponse { user, token })
    }

    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<User, AppError> {
        let hashed_password = self.hash_password(&payload.password).await?;

        let user = User {
            id: Uuid::new_v4(),
            username: payload.username,
            role: payload.role,
            name: payload.name,
            password_hash: hashed_password,
            created_at: Utc::now(),
        };

        let created = self.store.create_user(&user).await?;
        tracing::info!(user_id = %created.id, username = %created.username, "Usuário criado");
        Ok(created)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.store.list_users().await
    }

    /// Cria os usuários padrão que ainda não existem. No modo demo também o `demo`.
    pub async fn seed_default_users(&self, include_demo: bool) -> Result<(), AppError> {
        let demo = include_demo.then_some(&DEMO_USER);

        for (username, password, role, name) in DEFAULT_USERS.iter().chain(demo) {
            if self.store.find_user_by_username(username).await?.is_some() {
                continue;
            }

            let payload = CreateUserPayload {
                username: username.to_string(),
                password: password.to_string(),
                role: *role,
                name: name.to_string(),
            };
            match self.create_user(payload).await {
                Ok(_) => tracing::info!("Usuário padrão criado: {}", username),
                // Outra instância criou no meio do caminho
                Err(AppError::UsernameAlreadyExists) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Usuário apagado depois da emissão do token não passa
        self.store
            .find_user_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;

        // Hashing é CPU-bound: fora do runtime async
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
            ?;
        Ok(hashed)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
