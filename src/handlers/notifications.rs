// src/handlers/notifications.rs

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
    models::notifications::{
        BatchNotificationPayload, BatchResult, DispatchResult, Notification, NotificationFilter,
        NotificationPeriod, NotificationStatistics, SendNotificationPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/notificacoes",
    tag = "Notificações",
    params(NotificationFilter),
    responses((status = 200, description = "Notificações", body = Vec<Notification>))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<NotificationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = app_state
        .notification_service
        .list(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(notifications)))
}

#[utoipa::path(
    get,
    path = "/api/notificacoes/pendentes",
    tag = "Notificações",
    responses((status = 200, description = "Notificações pendentes ou com falha", body = Vec<Notification>))
)]
pub async fn pending_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = app_state
        .notification_service
        .pending(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(notifications)))
}

#[utoipa::path(
    get,
    path = "/api/notificacoes/estatisticas",
    tag = "Notificações",
    params(NotificationPeriod),
    responses((status = 200, description = "Totais por status, tipo e canal", body = NotificationStatistics))
)]
pub async fn notification_statistics(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<NotificationPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .notification_service
        .statistics(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/notificacoes/{id}",
    tag = "Notificações",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses((status = 200, description = "Notificação", body = Notification))
)]
pub async fn get_notification(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = app_state
        .notification_service
        .detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(notification)))
}

#[utoipa::path(
    post,
    path = "/api/notificacoes/enviar",
    tag = "Notificações",
    request_body = SendNotificationPayload,
    responses(
        (status = 200, description = "Notificação registrada e despachada", body = DispatchResult),
        (status = 400, description = "Cliente sem contato ou sem consentimento")
    )
)]
pub async fn send_notification(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SendNotificationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .notification_service
        .send(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/notificacoes/enviar-lote",
    tag = "Notificações",
    request_body = BatchNotificationPayload,
    responses((status = 200, description = "Resultado por cliente", body = BatchResult))
)]
pub async fn send_batch(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<BatchNotificationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .notification_service
        .send_batch(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/notificacoes/{id}/reenviar",
    tag = "Notificações",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Nova tentativa de envio", body = DispatchResult),
        (status = 400, description = "Já enviada ou limite de tentativas atingido")
    )
)]
pub async fn resend_notification(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .notification_service
        .resend(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}
