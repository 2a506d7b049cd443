//! Helpers compartilhados pelos testes de integração.
//!
//! O app é montado com o mesmo `build_router` do binário, mas sobre o
//! `MemoryStore`, então nenhum teste precisa de PostgreSQL.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use comercial_backend::build_router;
use comercial_backend::config::{AppState, Settings, StorageBackend};
use comercial_backend::db::MemoryStore;

pub fn test_settings() -> Settings {
    Settings {
        host: "127.0.0.1".to_string(),
        port: 0,
        storage: StorageBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        jwt_secret: "segredo-dos-testes".to_string(),
        jwt_expiration_days: 7,
        // Custo mínimo: os testes não devem gastar tempo com bcrypt
        bcrypt_cost: 4,
        cors_origins: vec!["*".to_string()],
        static_dir: None,
    }
}

/// App pronto, com os usuários padrão (e o `demo`) já criados.
pub async fn build_test_app() -> Router {
    build_test_app_with(test_settings()).await
}

pub async fn build_test_app_with(settings: Settings) -> Router {
    let state = AppState::with_store(settings, Arc::new(MemoryStore::new()));
    state
        .auth_service
        .seed_default_users(true)
        .await
        .expect("seed dos usuários padrão");
    build_router(state)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

/// Faz login e devolve o token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login de {username}");

    let json = body_json(response).await;
    json["token"].as_str().expect("token na resposta").to_string()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("corpo da resposta")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("corpo JSON")
}
