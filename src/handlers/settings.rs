// src/handlers/settings.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::settings::{UpdateSettingsRequest, WorkshopSettings},
};

#[utoipa::path(
    get,
    path = "/api/configuracoes",
    tag = "Configurações",
    responses((status = 200, description = "Dados da oficina e parâmetros", body = WorkshopSettings))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state
        .settings_repo
        .get_settings(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(settings)))
}

#[utoipa::path(
    put,
    path = "/api/configuracoes",
    tag = "Configurações",
    request_body = UpdateSettingsRequest,
    responses((status = 200, description = "Configurações atualizadas", body = WorkshopSettings))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .settings_repo
        .update_settings(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("⚙️ Configurações da oficina atualizadas");

    Ok((StatusCode::OK, Json(updated)))
}

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "OK")]
    pub status: &'static str,
    pub database: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Sistema",
    responses((status = 200, description = "Serviço no ar", body = HealthStatus))
)]
pub async fn health(State(app_state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1").execute(&app_state.db_pool).await.is_ok();
    if !database {
        tracing::warn!("⚠️ Health check sem acesso ao banco");
    }

    (StatusCode::OK, Json(HealthStatus { status: "OK", database }))
}
