// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::reports::{
        CategoryPerformance, CustomerAbcEntry, DashboardQuery, MechanicPerformance, PartAbcEntry,
        ProfitabilityReport, ReportDashboard, ReportPeriod,
    },
};

#[utoipa::path(
    get,
    path = "/api/relatorios/rentabilidade",
    tag = "Relatórios",
    params(ReportPeriod),
    responses((status = 200, description = "Lucro por OS finalizada", body = ProfitabilityReport))
)]
pub async fn profitability(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .profitability(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/relatorios/categorias",
    tag = "Relatórios",
    params(ReportPeriod),
    responses((status = 200, description = "Desempenho por categoria de serviço", body = Vec<CategoryPerformance>))
)]
pub async fn categories(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .categories(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    get,
    path = "/api/relatorios/mecanicos",
    tag = "Relatórios",
    params(ReportPeriod),
    responses((status = 200, description = "Produtividade dos mecânicos", body = Vec<MechanicPerformance>))
)]
pub async fn mechanics(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .mechanics(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    get,
    path = "/api/relatorios/abc/clientes",
    tag = "Relatórios",
    params(ReportPeriod),
    responses((status = 200, description = "Curva ABC de clientes", body = Vec<CustomerAbcEntry>))
)]
pub async fn abc_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .abc_customers(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    get,
    path = "/api/relatorios/abc/pecas",
    tag = "Relatórios",
    params(ReportPeriod),
    responses((status = 200, description = "Curva ABC de peças", body = Vec<PartAbcEntry>))
)]
pub async fn abc_parts(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = app_state
        .report_service
        .abc_parts(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rows)))
}

#[utoipa::path(
    get,
    path = "/api/relatorios/dashboard",
    tag = "Relatórios",
    params(DashboardQuery),
    responses((status = 200, description = "Indicadores dos últimos N dias", body = ReportDashboard))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .report_service
        .dashboard(&app_state.db_pool, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(dashboard)))
}
