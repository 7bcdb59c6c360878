// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Linha única de configuração da oficina (cabeçalho do PDF e parâmetros de negócio)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopSettings {
    #[schema(example = "tGest - Oficina Mecânica")]
    pub company_name: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,

    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub address: Option<String>,

    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,

    #[schema(example = "contato@oficina.com")]
    pub email: Option<String>,

    #[schema(example = 15)]
    pub quote_validity_days: i32,

    #[schema(example = 30)]
    pub stock_alert_days: i32,

    #[schema(example = 30)]
    pub receivable_due_days: i32,

    #[schema(example = 30)]
    pub survey_expiry_days: i32,

    #[schema(example = "http://localhost:3000/pesquisa")]
    pub survey_base_url: String,

    pub updated_at: DateTime<Utc>,
}

impl WorkshopSettings {
    pub fn survey_link(&self, token: &str) -> String {
        format!("{}/{}", self.survey_base_url.trim_end_matches('/'), token)
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(example = "Minha Oficina")]
    pub company_name: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,

    pub address: Option<String>,

    pub phone: Option<String>,

    #[validate(email(message = "email"))]
    pub email: Option<String>,

    #[validate(range(min = 1, message = "positive"))]
    pub quote_validity_days: Option<i32>,

    #[validate(range(min = 1, message = "positive"))]
    pub stock_alert_days: Option<i32>,

    #[validate(range(min = 0, message = "positive"))]
    pub receivable_due_days: Option<i32>,

    #[validate(range(min = 1, message = "positive"))]
    pub survey_expiry_days: Option<i32>,

    #[validate(url(message = "url"))]
    pub survey_base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base: &str) -> WorkshopSettings {
        WorkshopSettings {
            company_name: None,
            document_number: None,
            address: None,
            phone: None,
            email: None,
            quote_validity_days: 15,
            stock_alert_days: 30,
            receivable_due_days: 30,
            survey_expiry_days: 30,
            survey_base_url: base.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn survey_link_joins_base_and_token() {
        assert_eq!(settings("http://x/pesquisa").survey_link("abc"), "http://x/pesquisa/abc");
        assert_eq!(settings("http://x/pesquisa/").survey_link("abc"), "http://x/pesquisa/abc");
    }

    #[test]
    fn zero_validity_is_rejected() {
        let req = UpdateSettingsRequest { quote_validity_days: Some(0), ..Default::default() };
        assert!(req.validate().is_err());
    }
}
