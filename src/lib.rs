//src/lib.rs

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{
    common::error::AppError,
    config::{AppState, Settings},
    docs::ApiDoc,
    middleware::auth::auth_guard,
};

// Fotos e áudios chegam em base64 dentro do JSON
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Monta o router completo. Usado pelo `main` e pelos testes de integração.
pub fn build_router(app_state: AppState) -> Router {
    let settings = app_state.settings.clone();

    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/health", get(handlers::health::health))
        .route("/api/login", post(handlers::auth::login))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    // Tudo o mais em /api exige token
    let protected_routes = Router::new()
        .route("/users"
               ,get(handlers::users::list_users)
               .post(handlers::users::create_user)
        )
        .route("/clients"
               ,get(handlers::clients::list_clients)
               .post(handlers::clients::create_client)
        )
        .route("/clients/{id}"
               ,get(handlers::clients::get_client)
               .put(handlers::clients::update_client)
        )
        .route("/clients/{id}/folder", get(handlers::clients::get_client_folder))
        .route("/clients/{id}/contacts", post(handlers::clients::add_contact))
        .route("/clients/{id}/expenses", post(handlers::clients::add_expense))
        .route("/clients/{id}/documents", post(handlers::clients::add_document))
        .route("/visits"
               ,get(handlers::visits::list_visits)
               .post(handlers::visits::create_visit)
        )
        .route("/visits/record", post(handlers::visits::record_visit))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Rota de API desconhecida não cai no SPA
        .fallback(|| async { AppError::ResourceNotFound("route".into()) })
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let mut app = Router::new()
        .merge(public_routes)
        .nest("/api", protected_routes);

    // SPA compilado: qualquer caminho fora da API devolve o index.html
    if let Some(static_dir) = &settings.static_dir {
        tracing::info!("Servindo arquivos estáticos de {}", static_dir.display());
        let spa = ServeDir::new(static_dir)
            .fallback(ServeFile::new(static_dir.join("index.html")));
        app = app.fallback_service(spa);
    }

    app.layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&settings))
        .with_state(app_state)
}

/// `CORS_ORIGINS=*` libera qualquer origem; senão só as listadas.
pub fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT_LANGUAGE]);

    if settings.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!("Origem CORS inválida ignorada: {}", o);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
