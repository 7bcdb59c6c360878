// src/handlers/quotes.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        operations::{AddPartLinePayload, AddServiceLinePayload, PartLine, ServiceLine},
        quotes::{
            ChangeQuoteStatusPayload, ConversionResult, CreateQuotePayload, Quote, QuoteDetail, QuoteFilter,
            QuoteStatistics, QuoteSummary, UpdateQuotePayload,
        },
    },
};

#[utoipa::path(
    get,
    path = "/api/orcamentos",
    tag = "Orçamentos",
    params(QuoteFilter),
    responses((status = 200, description = "Orçamentos", body = Vec<QuoteSummary>))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<QuoteFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let quotes = app_state
        .quote_service
        .list(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quotes)))
}

#[utoipa::path(
    get,
    path = "/api/orcamentos/estatisticas",
    tag = "Orçamentos",
    responses((status = 200, description = "Totais por status e taxa de conversão", body = QuoteStatistics))
)]
pub async fn quote_statistics(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .quote_service
        .statistics(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/orcamentos/{id}",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Orçamento com itens", body = QuoteDetail),
        (status = 404, description = "Orçamento não encontrado")
    )
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .quote_service
        .detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/api/orcamentos",
    tag = "Orçamentos",
    request_body = CreateQuotePayload,
    responses((status = 201, description = "Orçamento criado", body = Quote))
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let quote = app_state
        .quote_service
        .create(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(quote)))
}

#[utoipa::path(
    put,
    path = "/api/orcamentos/{id}",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = UpdateQuotePayload,
    responses((status = 200, description = "Orçamento atualizado", body = Quote))
)]
pub async fn update_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuotePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let quote = app_state
        .quote_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quote)))
}

#[utoipa::path(
    patch,
    path = "/api/orcamentos/{id}/status",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = ChangeQuoteStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Quote),
        (status = 409, description = "Transição não permitida")
    )
)]
pub async fn change_quote_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeQuoteStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = app_state
        .quote_service
        .change_status(&app_state.db_pool, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(quote)))
}

#[utoipa::path(
    post,
    path = "/api/orcamentos/{id}/servicos",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = AddServiceLinePayload,
    responses((status = 201, description = "Serviço adicionado", body = ServiceLine))
)]
pub async fn add_quote_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddServiceLinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let line = app_state
        .quote_service
        .add_service_line(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    delete,
    path = "/api/orcamentos/{id}/servicos/{line_id}",
    tag = "Orçamentos",
    params(
        ("id" = Uuid, Path, description = "ID do orçamento"),
        ("line_id" = Uuid, Path, description = "ID do item de serviço")
    ),
    responses((status = 204, description = "Serviço removido"))
)]
pub async fn remove_quote_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .quote_service
        .remove_service_line(&app_state.db_pool, id, line_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// Peça em orçamento não mexe no estoque
#[utoipa::path(
    post,
    path = "/api/orcamentos/{id}/pecas",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    request_body = AddPartLinePayload,
    responses((status = 201, description = "Peça adicionada", body = PartLine))
)]
pub async fn add_quote_part(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPartLinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let line = app_state
        .quote_service
        .add_part_line(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    delete,
    path = "/api/orcamentos/{id}/pecas/{line_id}",
    tag = "Orçamentos",
    params(
        ("id" = Uuid, Path, description = "ID do orçamento"),
        ("line_id" = Uuid, Path, description = "ID do item de peça")
    ),
    responses((status = 204, description = "Peça removida"))
)]
pub async fn remove_quote_part(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .quote_service
        .remove_part_line(&app_state.db_pool, id, line_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/orcamentos/{id}/converter",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 201, description = "OS criada a partir do orçamento", body = ConversionResult),
        (status = 400, description = "Orçamento não aprovado ou já convertido")
    )
)]
pub async fn convert_quote(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .quote_service
        .convert(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    get,
    path = "/api/orcamentos/{id}/pdf",
    tag = "Orçamentos",
    params(("id" = Uuid, Path, description = "ID do orçamento")),
    responses(
        (status = 200, description = "Arquivo PDF do orçamento", content_type = "application/pdf"),
        (status = 404, description = "Orçamento não encontrado")
    )
)]
pub async fn quote_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = app_state
        .document_service
        .quote_pdf(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", pdf.file_name)),
    ];

    Ok((headers, pdf.bytes).into_response())
}
