//! Login, guarda de token e rotas de admin.

mod common;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use common::{body_json, build_test_app, get, login, post_json, send};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn login_returns_user_fields_and_token() {
    let app = build_test_app().await;

    let response = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "admin", "password": "adminpassword" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["username"], "admin");
    assert_eq!(json["role"], "admin");
    assert_eq!(json["name"], "Admin User");
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn unknown_user_is_404_and_wrong_password_is_401() {
    let app = build_test_app().await;

    let unknown = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "nadie", "password": "x" })),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let wrong = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": "comercial", "password": "errada" })),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn error_message_follows_accept_language() {
    let app = build_test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "es-ES,es;q=0.9")
        .body(Body::from(json!({ "username": "nadie", "password": "x" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Usuario no encontrado.");
}

#[tokio::test]
async fn api_routes_require_a_token() {
    let app = build_test_app().await;

    let missing = send(&app, Method::GET, "/api/clients", None, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = get(&app, "/api/clients", "nao-e-um-jwt").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app, "comercial", "password").await;
    let ok = get(&app, "/api/clients", &token).await;
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_public() {
    let app = build_test_app().await;

    for uri in ["/health", "/api/health"] {
        let response = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_string());
    }
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_test_app().await;

    let response = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/api/visits/record"].is_object());
}

#[tokio::test]
async fn commercial_cannot_use_admin_routes() {
    let app = build_test_app().await;
    let token = login(&app, "comercial", "password").await;

    let users = get(&app, "/api/users", &token).await;
    assert_eq!(users.status(), StatusCode::FORBIDDEN);

    let metrics = get(&app, "/api/metrics", &token).await;
    assert_eq!(metrics.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_creates_users_and_duplicates_conflict() {
    let app = build_test_app().await;
    let token = login(&app, "admin", "adminpassword").await;

    let new_user = json!({
        "username": "lucia",
        "password": "secreta123",
        "role": "commercial",
        "name": "Lucía Fernández"
    });

    let created = post_json(&app, "/api/users", &token, new_user.clone()).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let json = body_json(created).await;
    assert_eq!(json["username"], "lucia");

    let duplicate = post_json(&app, "/api/users", &token, new_user).await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    // O novo usuário consegue entrar
    login(&app, "lucia", "secreta123").await;

    let list = body_json(get(&app, "/api/users", &token).await).await;
    assert_eq!(list.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn short_password_is_a_validation_error() {
    let app = build_test_app().await;
    let token = login(&app, "admin", "adminpassword").await;

    let response = post_json(
        &app,
        "/api/users",
        &token,
        json!({ "username": "lu", "password": "123", "role": "commercial", "name": "Lu" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["details"]["username"].is_array());
    assert!(json["details"]["password"].is_array());
}

#[tokio::test]
async fn demo_user_exists_in_memory_mode() {
    let app = build_test_app().await;
    login(&app, "demo", "demo").await;
}
