// src/handlers/operations.rs

use axum::{
    extract::{Multipart, Path, Query, State},
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
    models::operations::{
        AddPartLinePayload, AddServiceLinePayload, ChangeStatusPayload, ChecklistItem, ChecklistStatus,
        Communication, CommunicationPayload, CreateServiceOrderPayload, KanbanColumn, PartLine, ServiceLine,
        ServiceOrder, ServiceOrderDetail, ServiceOrderFilter, ServiceOrderPage, UpdateServiceOrderPayload,
    },
    services::operation_service::{ChecklistInput, PhotoUpload},
};

// =============================================================================
//  1. ORDENS DE SERVIÇO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/ordens-servico",
    tag = "Ordens de Serviço",
    params(ServiceOrderFilter),
    responses((status = 200, description = "Página de ordens de serviço", body = ServiceOrderPage))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<ServiceOrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .operations_service
        .list(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    get,
    path = "/api/ordens-servico/kanban",
    tag = "Ordens de Serviço",
    responses((status = 200, description = "Ordens agrupadas por status", body = Vec<KanbanColumn>))
)]
pub async fn kanban(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let columns = app_state
        .operations_service
        .kanban(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(columns)))
}

#[utoipa::path(
    get,
    path = "/api/ordens-servico/{id}",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    responses(
        (status = 200, description = "OS completa", body = ServiceOrderDetail),
        (status = 404, description = "OS não encontrada")
    )
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .operations_service
        .detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/api/ordens-servico",
    tag = "Ordens de Serviço",
    request_body = CreateServiceOrderPayload,
    responses((status = 201, description = "OS aberta", body = ServiceOrder))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateServiceOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operations_service
        .create(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    put,
    path = "/api/ordens-servico/{id}",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    request_body = UpdateServiceOrderPayload,
    responses((status = 200, description = "OS atualizada", body = ServiceOrder))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operations_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

/// Transição de status. Ao finalizar dispara os efeitos de fechamento
/// (conta a receber, pesquisa, lembretes e histórico).
#[utoipa::path(
    patch,
    path = "/api/ordens-servico/{id}/status",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    request_body = ChangeStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = ServiceOrder),
        (status = 409, description = "Transição não permitida")
    )
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .operations_service
        .change_status(&app_state.db_pool, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}

// =============================================================================
//  2. ITENS DA OS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/ordens-servico/{id}/servicos",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    request_body = AddServiceLinePayload,
    responses((status = 201, description = "Serviço adicionado", body = ServiceLine))
)]
pub async fn add_service_line(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddServiceLinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let line = app_state
        .operations_service
        .add_service_line(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    delete,
    path = "/api/ordens-servico/{id}/servicos/{line_id}",
    tag = "Ordens de Serviço",
    params(
        ("id" = Uuid, Path, description = "ID da OS"),
        ("line_id" = Uuid, Path, description = "ID do item de serviço")
    ),
    responses((status = 204, description = "Serviço removido"))
)]
pub async fn remove_service_line(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .operations_service
        .remove_service_line(&app_state.db_pool, id, line_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/ordens-servico/{id}/pecas",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    request_body = AddPartLinePayload,
    responses(
        (status = 201, description = "Peça adicionada e baixada do estoque", body = PartLine),
        (status = 400, description = "Estoque insuficiente")
    )
)]
pub async fn add_part_line(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPartLinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let line = app_state
        .operations_service
        .add_part_line(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    delete,
    path = "/api/ordens-servico/{id}/pecas/{line_id}",
    tag = "Ordens de Serviço",
    params(
        ("id" = Uuid, Path, description = "ID da OS"),
        ("line_id" = Uuid, Path, description = "ID do item de peça")
    ),
    responses((status = 204, description = "Peça removida e devolvida ao estoque"))
)]
pub async fn remove_part_line(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .operations_service
        .remove_part_line(&app_state.db_pool, id, line_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  3. CHECKLIST & COMUNICAÇÃO
// =============================================================================

// Campos de texto do multipart chegam como string
async fn read_checklist_form(mut multipart: Multipart) -> Result<ChecklistInput, AppError> {
    let mut item = None;
    let mut status = None;
    let mut notes = None;
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "foto" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| AppError::InvalidUpload(e.to_string()))?;
                if !bytes.is_empty() {
                    photo = Some(PhotoUpload { file_name, bytes: bytes.to_vec() });
                }
            }
            "item" | "status" | "notes" => {
                let value = field.text().await.map_err(|e| AppError::InvalidUpload(e.to_string()))?;
                match name.as_str() {
                    "item" => item = Some(value),
                    "status" => status = Some(value),
                    _ => notes = Some(value).filter(|v| !v.trim().is_empty()),
                }
            }
            _ => {}
        }
    }

    let status = match status {
        Some(raw) => ChecklistStatus::parse(&raw)
            .ok_or_else(|| AppError::BadRequest(format!("Status de checklist inválido: {raw}")))?,
        None => ChecklistStatus::NotChecked,
    };

    Ok(ChecklistInput {
        item: item.ok_or(AppError::MissingField("item"))?,
        status,
        notes,
        photo,
    })
}

#[utoipa::path(
    post,
    path = "/api/ordens-servico/{id}/checklist",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    request_body(content_type = "multipart/form-data", description = "Campos item, status, notes e foto"),
    responses(
        (status = 201, description = "Item de checklist registrado", body = ChecklistItem),
        (status = 400, description = "Arquivo inválido")
    )
)]
pub async fn add_checklist_item(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let input = read_checklist_form(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let item = app_state
        .operations_service
        .add_checklist_item(&app_state.db_pool, id, input)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    post,
    path = "/api/ordens-servico/{id}/comunicacoes",
    tag = "Ordens de Serviço",
    params(("id" = Uuid, Path, description = "ID da OS")),
    request_body = CommunicationPayload,
    responses((status = 201, description = "Comunicação registrada", body = Communication))
)]
pub async fn add_communication(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommunicationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let communication = app_state
        .operations_service
        .add_communication(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(communication)))
}
