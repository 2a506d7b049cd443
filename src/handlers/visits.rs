// src/handlers/visits.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::visit::{NewVisit, RecordVisitPayload, RecordedVisit, Visit},
};

// GET /api/visits
#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "Visitas",
    responses(
        (status = 200, description = "Visitas, mais recentes primeiro", body = Vec<Visit>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let visits = app_state
        .visit_service
        .list_visits()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(visits)))
}

// POST /api/visits
#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "Visitas",
    request_body = NewVisit,
    responses(
        (status = 201, description = "Visita gravada com despesas, documentos e notas de voz", body = Visit),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente da visita não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<NewVisit>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let visit = app_state
        .visit_service
        .create_visit(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(visit)))
}

// POST /api/visits/record
#[utoipa::path(
    post,
    path = "/api/visits/record",
    tag = "Visitas",
    request_body = RecordVisitPayload,
    responses(
        (status = 201, description = "Visita gravada e cliente criado ou atualizado", body = RecordedVisit),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Visita já registrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RecordVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.id, place = %payload.visit.place_name, "Registrando visita");

    let recorded = app_state
        .visit_service
        .record_visit(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(recorded)))
}
