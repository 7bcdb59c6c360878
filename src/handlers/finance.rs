// src/handlers/finance.rs

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
    models::finance::{
        Account, CashFlowDay, CashFlowFilter, CreatePayablePayload, CreateReceivablePayload, FinanceSummary,
        Payable, PayableFilter, Receivable, ReceivableFilter, SettlementPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/financeiro/contas",
    tag = "Financeiro",
    responses((status = 200, description = "Plano de contas", body = Vec<Account>))
)]
pub async fn list_accounts(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = app_state
        .finance_service
        .accounts(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(accounts)))
}

// =============================================================================
//  CONTAS A RECEBER
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/financeiro/receber",
    tag = "Financeiro",
    params(ReceivableFilter),
    responses((status = 200, description = "Contas a receber", body = Vec<Receivable>))
)]
pub async fn list_receivables(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<ReceivableFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let receivables = app_state
        .finance_service
        .list_receivables(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(receivables)))
}

#[utoipa::path(
    post,
    path = "/api/financeiro/receber",
    tag = "Financeiro",
    request_body = CreateReceivablePayload,
    responses((status = 201, description = "Título a receber criado", body = Receivable))
)]
pub async fn create_receivable(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateReceivablePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let receivable = app_state
        .finance_service
        .create_receivable(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receivable)))
}

#[utoipa::path(
    patch,
    path = "/api/financeiro/receber/{id}/receber",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do título")),
    request_body = SettlementPayload,
    responses(
        (status = 200, description = "Título baixado e lançado no fluxo de caixa", body = Receivable),
        (status = 400, description = "Título já baixado ou cancelado")
    )
)]
pub async fn receive(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let receivable = app_state
        .finance_service
        .receive(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(receivable)))
}

// =============================================================================
//  CONTAS A PAGAR
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/financeiro/pagar",
    tag = "Financeiro",
    params(PayableFilter),
    responses((status = 200, description = "Contas a pagar", body = Vec<Payable>))
)]
pub async fn list_payables(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<PayableFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let payables = app_state
        .finance_service
        .list_payables(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(payables)))
}

#[utoipa::path(
    post,
    path = "/api/financeiro/pagar",
    tag = "Financeiro",
    request_body = CreatePayablePayload,
    responses((status = 201, description = "Título a pagar criado", body = Payable))
)]
pub async fn create_payable(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreatePayablePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let payable = app_state
        .finance_service
        .create_payable(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payable)))
}

#[utoipa::path(
    patch,
    path = "/api/financeiro/pagar/{id}/pagar",
    tag = "Financeiro",
    params(("id" = Uuid, Path, description = "ID do título")),
    request_body = SettlementPayload,
    responses(
        (status = 200, description = "Título pago e lançado no fluxo de caixa", body = Payable),
        (status = 400, description = "Título já baixado ou cancelado")
    )
)]
pub async fn pay(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettlementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let payable = app_state
        .finance_service
        .pay(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(payable)))
}

// =============================================================================
//  FLUXO DE CAIXA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/financeiro/fluxo-caixa",
    tag = "Financeiro",
    params(CashFlowFilter),
    responses((status = 200, description = "Entradas e saídas por dia com saldo acumulado", body = Vec<CashFlowDay>))
)]
pub async fn cash_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<CashFlowFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let days = app_state
        .finance_service
        .cash_flow(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(days)))
}

#[utoipa::path(
    get,
    path = "/api/financeiro/resumo",
    tag = "Financeiro",
    responses((status = 200, description = "Totais em aberto e movimento do mês", body = FinanceSummary))
)]
pub async fn summary(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .finance_service
        .summary(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
