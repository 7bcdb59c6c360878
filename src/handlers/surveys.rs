// src/handlers/surveys.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::surveys::{
        NpsResult, PublicSurvey, SendSurveyPayload, SendSurveyResult, Survey, SurveyAnswerPayload,
        SurveyAnswerResult, SurveyFilter, SurveyPeriod, SurveyStatistics,
    },
};

// =============================================================================
//  1. GESTÃO (INTERNO)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/pesquisas",
    tag = "Pesquisas",
    params(SurveyFilter),
    responses((status = 200, description = "Pesquisas de satisfação", body = Vec<Survey>))
)]
pub async fn list_surveys(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<SurveyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let surveys = app_state
        .survey_service
        .list(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(surveys)))
}

#[utoipa::path(
    get,
    path = "/api/pesquisas/pendentes",
    tag = "Pesquisas",
    responses((status = 200, description = "Pesquisas ainda não enviadas", body = Vec<Survey>))
)]
pub async fn pending_surveys(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let surveys = app_state
        .survey_service
        .pending(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(surveys)))
}

#[utoipa::path(
    get,
    path = "/api/pesquisas/estatisticas",
    tag = "Pesquisas",
    params(SurveyPeriod),
    responses((status = 200, description = "Médias, distribuição e comentários", body = SurveyStatistics))
)]
pub async fn survey_statistics(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<SurveyPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .survey_service
        .statistics(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/pesquisas/nps",
    tag = "Pesquisas",
    params(SurveyPeriod),
    responses((status = 200, description = "Net Promoter Score do período", body = NpsResult))
)]
pub async fn nps(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(period): Query<SurveyPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let nps = app_state
        .survey_service
        .nps(&app_state.db_pool, &period)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(nps)))
}

#[utoipa::path(
    get,
    path = "/api/pesquisas/{id}",
    tag = "Pesquisas",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses((status = 200, description = "Pesquisa", body = Survey))
)]
pub async fn get_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(survey)))
}

#[utoipa::path(
    post,
    path = "/api/pesquisas/{id}/enviar",
    tag = "Pesquisas",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    request_body(content = Option<SendSurveyPayload>),
    responses(
        (status = 200, description = "Link enviado ao cliente", body = SendSurveyResult),
        (status = 400, description = "Pesquisa já respondida ou cliente sem contato")
    )
)]
pub async fn send_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    payload: Option<Json<SendSurveyPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let result = app_state
        .survey_service
        .send(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}

#[utoipa::path(
    delete,
    path = "/api/pesquisas/{id}",
    tag = "Pesquisas",
    params(("id" = Uuid, Path, description = "ID da pesquisa")),
    responses(
        (status = 204, description = "Pesquisa excluída"),
        (status = 400, description = "Pesquisa respondida não pode ser excluída")
    )
)]
pub async fn delete_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .survey_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. ACESSO PÚBLICO POR TOKEN
// =============================================================================

#[utoipa::path(
    get,
    path = "/pesquisa/{token}",
    tag = "Pesquisas",
    params(("token" = String, Path, description = "Token público da pesquisa")),
    responses(
        (status = 200, description = "Dados da pesquisa para o formulário", body = PublicSurvey),
        (status = 400, description = "Pesquisa respondida ou expirada")
    )
)]
pub async fn public_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let survey = app_state
        .survey_service
        .public_read(&app_state.db_pool, &token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(survey)))
}

// A ordem das checagens (notas, status, validade) fica no serviço
#[utoipa::path(
    post,
    path = "/pesquisa/{token}",
    tag = "Pesquisas",
    params(("token" = String, Path, description = "Token público da pesquisa")),
    request_body = SurveyAnswerPayload,
    responses(
        (status = 200, description = "Resposta registrada", body = SurveyAnswerResult),
        (status = 400, description = "Notas ausentes, pesquisa respondida ou expirada")
    )
)]
pub async fn answer_survey(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
    Json(payload): Json<SurveyAnswerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .survey_service
        .answer(&app_state.db_pool, &token, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(result)))
}
