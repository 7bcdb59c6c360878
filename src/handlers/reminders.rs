// src/handlers/reminders.rs

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
    models::reminders::{
        AutoCreatePayload, AutoCreateResult, ChangeReminderStatusPayload, CreateReminderPayload, ReminderFilter,
        ReminderList, ReminderView, SendReminderPayload, SendReminderResult, UpdateReminderPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/lembretes",
    tag = "Lembretes",
    params(ReminderFilter),
    responses((status = 200, description = "Lembretes com urgência calculada", body = ReminderList))
)]
pub async fn list_reminders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<ReminderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let list = app_state
        .reminder_service
        .list(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(list)))
}

#[utoipa::path(
    get,
    path = "/api/lembretes/vencidos",
    tag = "Lembretes",
    responses((status = 200, description = "Lembretes pendentes já vencidos", body = ReminderList))
)]
pub async fn overdue_reminders(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let list = app_state
        .reminder_service
        .overdue(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(list)))
}

#[utoipa::path(
    get,
    path = "/api/lembretes/{id}",
    tag = "Lembretes",
    params(("id" = Uuid, Path, description = "ID do lembrete")),
    responses((status = 200, description = "Lembrete", body = ReminderView))
)]
pub async fn get_reminder(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reminder = app_state
        .reminder_service
        .detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reminder)))
}

#[utoipa::path(
    post,
    path = "/api/lembretes",
    tag = "Lembretes",
    request_body = CreateReminderPayload,
    responses((status = 201, description = "Lembrete criado", body = ReminderView))
)]
pub async fn create_reminder(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateReminderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let reminder = app_state
        .reminder_service
        .create(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

#[utoipa::path(
    post,
    path = "/api/lembretes/auto-criar",
    tag = "Lembretes",
    request_body = AutoCreatePayload,
    responses((status = 201, description = "Lembretes gerados a partir dos serviços da OS", body = AutoCreateResult))
)]
pub async fn auto_create(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<AutoCreatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .reminder_service
        .auto_create(&app_state.db_pool, payload.os_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    put,
    path = "/api/lembretes/{id}",
    tag = "Lembretes",
    params(("id" = Uuid, Path, description = "ID do lembrete")),
    request_body = UpdateReminderPayload,
    responses((status = 200, description = "Lembrete atualizado", body = ReminderView))
)]
pub async fn update_reminder(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReminderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let reminder = app_state
        .reminder_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reminder)))
}

#[utoipa::path(
    patch,
    path = "/api/lembretes/{id}/status",
    tag = "Lembretes",
    params(("id" = Uuid, Path, description = "ID do lembrete")),
    request_body = ChangeReminderStatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = ReminderView),
        (status = 409, description = "Transição não permitida")
    )
)]
pub async fn change_reminder_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeReminderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let reminder = app_state
        .reminder_service
        .change_status(&app_state.db_pool, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(reminder)))
}

// Corpo opcional: sem canal, usa o preferido do cliente
#[utoipa::path(
    post,
    path = "/api/lembretes/{id}/enviar",
    tag = "Lembretes",
    params(("id" = Uuid, Path, description = "ID do lembrete")),
    request_body(content = Option<SendReminderPayload>),
    responses(
        (status = 200, description = "Lembrete enviado", body = SendReminderResult),
        (status = 400, description = "Cliente sem contato ou já enviado")
    )
)]
pub async fn send_reminder(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    payload: Option<Json<SendReminderPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let result = app_state
        .reminder_service
        .send(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

#[utoipa::path(
    delete,
    path = "/api/lembretes/{id}",
    tag = "Lembretes",
    params(("id" = Uuid, Path, description = "ID do lembrete")),
    responses((status = 204, description = "Lembrete excluído"))
)]
pub async fn delete_reminder(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .reminder_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
