// src/handlers/inventory.rs

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
    models::inventory::{
        ChangePurchaseOrderStatusPayload, CreatePurchaseOrderPayload, MovementFilter, PeriodQuery, PurchaseOrder,
        PurchaseOrderDetail, PurchaseOrderFilter, StockAdjustmentPayload, StockAdjustmentResult, StockMovement,
        StockStatistics, TurnoverReport,
    },
};

// =============================================================================
//  1. MOVIMENTAÇÕES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/estoque/movimentacoes",
    tag = "Estoque",
    params(MovementFilter),
    responses((status = 200, description = "Movimentações de estoque", body = Vec<StockMovement>))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .list_movements(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

#[utoipa::path(
    get,
    path = "/api/estoque/pecas/{id}/historico",
    tag = "Estoque",
    params(("id" = Uuid, Path, description = "ID da peça")),
    responses((status = 200, description = "Histórico da peça", body = Vec<StockMovement>))
)]
pub async fn part_history(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .part_history(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

#[utoipa::path(
    post,
    path = "/api/estoque/ajuste",
    tag = "Estoque",
    request_body = StockAdjustmentPayload,
    responses(
        (status = 200, description = "Estoque ajustado", body = StockAdjustmentResult),
        (status = 400, description = "Ajuste deixaria o estoque negativo")
    )
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<StockAdjustmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .inventory_service
        .adjust_stock(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

// =============================================================================
//  2. INDICADORES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/estoque/estatisticas",
    tag = "Estoque",
    params(PeriodQuery),
    responses((status = 200, description = "Estatísticas de movimentação", body = StockStatistics))
)]
pub async fn statistics(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .inventory_service
        .statistics(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/estoque/giro",
    tag = "Estoque",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Giro de estoque no período", body = TurnoverReport),
        (status = 400, description = "Período obrigatório")
    )
)]
pub async fn turnover(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .inventory_service
        .turnover(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

// =============================================================================
//  3. ORDENS DE COMPRA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/estoque/compras",
    tag = "Estoque",
    params(PurchaseOrderFilter),
    responses((status = 200, description = "Ordens de compra", body = Vec<PurchaseOrder>))
)]
pub async fn list_purchase_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<PurchaseOrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .inventory_service
        .list_purchase_orders(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    get,
    path = "/api/estoque/compras/{id}",
    tag = "Estoque",
    params(("id" = Uuid, Path, description = "ID da ordem de compra")),
    responses((status = 200, description = "Ordem de compra com itens", body = PurchaseOrderDetail))
)]
pub async fn get_purchase_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .inventory_service
        .purchase_order_detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/api/estoque/compras",
    tag = "Estoque",
    request_body = CreatePurchaseOrderPayload,
    responses((status = 201, description = "Ordem de compra criada", body = PurchaseOrderDetail))
)]
pub async fn create_purchase_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreatePurchaseOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .inventory_service
        .create_purchase_order(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    patch,
    path = "/api/estoque/compras/{id}/status",
    tag = "Estoque",
    params(("id" = Uuid, Path, description = "ID da ordem de compra")),
    request_body = ChangePurchaseOrderStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = PurchaseOrder),
        (status = 409, description = "Transição não permitida")
    )
)]
pub async fn change_purchase_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePurchaseOrderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .inventory_service
        .change_purchase_status(&app_state.db_pool, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    post,
    path = "/api/estoque/compras/{id}/receber",
    tag = "Estoque",
    params(("id" = Uuid, Path, description = "ID da ordem de compra")),
    responses((status = 200, description = "Mercadoria recebida e lançada no estoque", body = PurchaseOrder))
)]
pub async fn receive_purchase_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .inventory_service
        .receive_purchase_order(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}
