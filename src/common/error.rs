// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio. Cada variante sabe o seu status HTTP e a chave de mensagem
// no I18nStore; o texto final só é montado no handler, com o idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    // `entity` é a chave da entidade (customer, vehicle, part, ...)
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("Estoque insuficiente para {part}. Disponível: {available}")]
    InsufficientStock { part: String, available: i32 },

    #[error("Estoque não pode ficar negativo. Disponível: {available}")]
    NegativeStock { available: i32 },

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Orçamento já foi convertido")]
    AlreadyConverted,

    #[error("Documento encerrado não aceita alterações")]
    DocumentClosed,

    // Chave do conflito (tax_id, plate, part_code, ...)
    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(&'static str),

    #[error("Veículo possui ordens de serviço vinculadas")]
    VehicleHasOrders,

    #[error("Pesquisa já respondida")]
    SurveyAlreadyAnswered,

    #[error("Pesquisa expirada")]
    SurveyExpired,

    #[error("Pesquisa respondida não pode ser excluída")]
    SurveyLocked,

    #[error("Cliente sem contato para o meio {0}")]
    MissingContact(String),

    #[error("Cliente optou por não receber {0}")]
    NotificationOptOut(String),

    #[error("Notificação já enviada")]
    AlreadySent,

    #[error("Limite de tentativas atingido")]
    RetryLimitReached,

    #[error("Upload inválido: {0}")]
    InvalidUpload(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingField(_)
            | AppError::BadRequest(_)
            | AppError::InsufficientStock { .. }
            | AppError::NegativeStock { .. }
            | AppError::AlreadyConverted
            | AppError::DocumentClosed
            | AppError::SurveyAlreadyAnswered
            | AppError::SurveyExpired
            | AppError::SurveyLocked
            | AppError::MissingContact(_)
            | AppError::NotificationOptOut(_)
            | AppError::AlreadySent
            | AppError::RetryLimitReached
            | AppError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_)
            | AppError::VehicleHasOrders
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::IoError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();
        let lang = locale.0.as_str();

        let message = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            Value::String(store.translate(lang, &format!("validation.{code}"), &[]))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                return ApiError {
                    status,
                    message: store.translate(lang, "error.validation", &[]),
                    details: Some(Value::Object(details)),
                };
            }
            AppError::MissingField(field) => {
                store.translate(lang, "error.missing_field", &[("field", field.to_string())])
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(entity) => store.translate(lang, &format!("not_found.{entity}"), &[]),
            AppError::InsufficientStock { part, available } => store.translate(
                lang,
                "error.insufficient_stock",
                &[("part", part.clone()), ("available", available.to_string())],
            ),
            AppError::NegativeStock { available } => store.translate(
                lang,
                "error.negative_stock",
                &[("available", available.to_string())],
            ),
            AppError::InvalidTransition { from, to } => store.translate(
                lang,
                "error.invalid_transition",
                &[("from", from.clone()), ("to", to.clone())],
            ),
            AppError::AlreadyConverted => store.translate(lang, "error.already_converted", &[]),
            AppError::DocumentClosed => store.translate(lang, "error.document_closed", &[]),
            AppError::UniqueConstraintViolation(key) => {
                store.translate(lang, &format!("conflict.{key}"), &[])
            }
            AppError::VehicleHasOrders => store.translate(lang, "error.vehicle_has_orders", &[]),
            AppError::SurveyAlreadyAnswered => store.translate(lang, "error.survey_answered", &[]),
            AppError::SurveyExpired => store.translate(lang, "error.survey_expired", &[]),
            AppError::SurveyLocked => store.translate(lang, "error.survey_locked", &[]),
            AppError::MissingContact(channel) => store.translate(
                lang,
                "error.missing_contact",
                &[("channel", channel.clone())],
            ),
            AppError::NotificationOptOut(kind) => {
                store.translate(lang, "error.opt_out", &[("kind", kind.clone())])
            }
            AppError::AlreadySent => store.translate(lang, "error.already_sent", &[]),
            AppError::RetryLimitReached => store.translate(lang, "error.retry_limit", &[]),
            AppError::InvalidUpload(reason) => {
                store.translate(lang, "error.invalid_upload", &[("reason", reason.clone())])
            }
            // Todos os outros erros viram 500. O detalhe vai para o log, não para o cliente.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                store.translate(lang, "error.internal", &[])
            }
        };

        ApiError { status, message, details: None }
    }
}

// Resposta de erro já traduzida, pronta para sair pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn business_errors_map_to_expected_status() {
        assert_eq!(
            AppError::InsufficientStock { part: "Filtro".into(), available: 1 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("part").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UniqueConstraintViolation("plate").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidTransition { from: "FINALIZED".into(), to: "IN_REPAIR".into() }
                .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_stock_message_carries_available_quantity() {
        let store = I18nStore::new();
        let api = AppError::InsufficientStock { part: "Pastilha".into(), available: 3 }
            .to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.contains("Pastilha"));
        assert!(api.message.contains("Disponível: 3"));
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::new();
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco"))
            .to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("senha"));
    }
}
