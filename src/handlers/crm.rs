// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::crm::{
        CrmDashboard, CustomerHistory, CustomerPreferences, CustomerProfile, HistoryEntry, HistoryEntryPayload,
        HistoryFilter, RetentionFilter, RetentionReport, RiskAssessment, UpdatePreferencesPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/crm/clientes/{id}/perfil",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Perfil 360° do cliente", body = CustomerProfile),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn profile(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .crm_service
        .profile(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/api/crm/clientes/{id}/historico",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente"), HistoryFilter),
    responses((status = 200, description = "Linha do tempo do cliente", body = CustomerHistory))
)]
pub async fn history(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Query(filter): Query<HistoryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .crm_service
        .history(&app_state.db_pool, id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(history)))
}

#[utoipa::path(
    post,
    path = "/api/crm/clientes/{id}/historico",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = HistoryEntryPayload,
    responses((status = 201, description = "Interação registrada", body = HistoryEntry))
)]
pub async fn add_history(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<HistoryEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .crm_service
        .add_history(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/crm/retencao",
    tag = "CRM",
    params(RetentionFilter),
    responses((status = 200, description = "Clientes por status de retenção", body = RetentionReport))
)]
pub async fn retention(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RetentionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .crm_service
        .retention(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/crm/clientes/{id}/risco",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Pontuação de risco de perda", body = RiskAssessment))
)]
pub async fn risk(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assessment = app_state
        .crm_service
        .risk(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(assessment)))
}

#[utoipa::path(
    get,
    path = "/api/crm/clientes/{id}/preferencias",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Preferências de contato", body = CustomerPreferences))
)]
pub async fn preferences(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let prefs = app_state
        .crm_service
        .preferences(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(prefs)))
}

#[utoipa::path(
    put,
    path = "/api/crm/clientes/{id}/preferencias",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = UpdatePreferencesPayload,
    responses((status = 200, description = "Preferências atualizadas", body = CustomerPreferences))
)]
pub async fn update_preferences(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePreferencesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let prefs = app_state
        .crm_service
        .update_preferences(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(prefs)))
}

#[utoipa::path(
    get,
    path = "/api/crm/dashboard",
    tag = "CRM",
    responses((status = 200, description = "Painel de relacionamento", body = CrmDashboard))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .crm_service
        .dashboard(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(dashboard)))
}
