// src/handlers/metrics.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::RequireAdmin, i18n::Locale},
    models::metrics::PipelineMetrics,
};

// GET /api/metrics
#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "Métricas",
    responses(
        (status = 200, description = "Indicadores do pipeline comercial", body = PipelineMetrics),
        (status = 403, description = "Apenas admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_metrics(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = app_state
        .metrics_service
        .pipeline()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(metrics)))
}
