// src/models/surveys.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::notifications::NotificationChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "survey_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStatus {
    Pending,
    Sent,
    Responded,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub service_order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015")]
    pub token: String,
    pub status: SurveyStatus,
    pub rating_service: Option<i16>,
    pub rating_quality: Option<i16>,
    pub rating_deadline: Option<i16>,
    pub rating_price: Option<i16>,
    pub comment: Option<String>,
    pub would_recommend: Option<bool>,
    pub channel: Option<NotificationChannel>,
    pub sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Visão pública (link com token): só o necessário para o cliente responder
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurvey {
    pub id: Uuid,
    pub token: String,
    pub status: SurveyStatus,
    pub customer_name: String,
    pub service_order_number: String,
    pub service_order_closed_at: Option<DateTime<Utc>>,
    pub service_order_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SurveyFilter {
    pub status: Option<SurveyStatus>,
    pub cliente_id: Option<Uuid>,
    pub limite: Option<i64>,
}

impl SurveyFilter {
    pub fn limit(&self) -> i64 {
        self.limite.filter(|l| *l > 0).unwrap_or(50).min(500)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SurveyPeriod {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendSurveyPayload {
    pub channel: Option<NotificationChannel>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendSurveyResult {
    pub survey: Survey,
    pub channel: NotificationChannel,
    pub link: String,
    pub delivered: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswerPayload {
    #[validate(required(message = "required"), range(min = 1, max = 5, message = "rating"))]
    pub rating_service: Option<i16>,
    #[validate(required(message = "required"), range(min = 1, max = 5, message = "rating"))]
    pub rating_quality: Option<i16>,
    #[validate(required(message = "required"), range(min = 1, max = 5, message = "rating"))]
    pub rating_deadline: Option<i16>,
    #[validate(required(message = "required"), range(min = 1, max = 5, message = "rating"))]
    pub rating_price: Option<i16>,
    pub comment: Option<String>,
    pub would_recommend: Option<bool>,
}

// Notas já validadas (1 a 5), prontas para gravar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratings {
    pub service: i16,
    pub quality: i16,
    pub deadline: i16,
    pub price: i16,
}

impl Ratings {
    pub fn average(&self) -> Decimal {
        let sum = self.service + self.quality + self.deadline + self.price;
        (Decimal::from(sum) / Decimal::from(4)).round_dp(2)
    }
}

impl SurveyAnswerPayload {
    /// Devolve as notas quando as quatro estão presentes e em 1..=5.
    pub fn ratings(&self) -> Option<Ratings> {
        let valid = |r: Option<i16>| r.filter(|n| (1..=5).contains(n));
        Some(Ratings {
            service: valid(self.rating_service)?,
            quality: valid(self.rating_quality)?,
            deadline: valid(self.rating_deadline)?,
            price: valid(self.rating_price)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswerResult {
    pub message: String,
    pub survey: Survey,
    #[schema(example = "4.25")]
    pub average: Decimal,
}

// --- Estatísticas ---

#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAverages {
    pub total_surveys: i64,
    pub total_responded: i64,
    pub avg_service: Option<Decimal>,
    pub avg_quality: Option<Decimal>,
    pub avg_deadline: Option<Decimal>,
    pub avg_price: Option<Decimal>,
    pub avg_overall: Option<Decimal>,
    pub recommend_percent: Option<Decimal>,
    pub response_rate: Option<Decimal>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingDistribution {
    #[schema(example = "Atendimento")]
    pub criterion: String,
    pub rating_5: i64,
    pub rating_4: i64,
    pub rating_3: i64,
    pub rating_2: i64,
    pub rating_1: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyComment {
    pub survey_id: Uuid,
    pub customer_name: String,
    pub service_order_number: String,
    pub comment: Option<String>,
    pub average: Decimal,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStatistics {
    pub averages: SurveyAverages,
    pub distribution: Vec<RatingDistribution>,
    pub recent_comments: Vec<SurveyComment>,
    pub worst: Vec<SurveyComment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NpsBand {
    Critical,
    Improvement,
    Reasonable,
    VeryGood,
    Excellent,
}

impl NpsBand {
    pub fn label(self) -> &'static str {
        match self {
            NpsBand::Critical => "Crítico",
            NpsBand::Improvement => "Aperfeiçoamento",
            NpsBand::Reasonable => "Razoável",
            NpsBand::VeryGood => "Muito Bom",
            NpsBand::Excellent => "Excelente",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, FromRow)]
pub struct NpsCounts {
    pub promoters: i64,
    pub detractors: i64,
    pub responses: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NpsResult {
    #[schema(example = "50.00")]
    pub score: Decimal,
    pub band: NpsBand,
    pub label: String,
    pub promoters: i64,
    pub detractors: i64,
    pub responses: i64,
    pub promoter_percent: Decimal,
    pub detractor_percent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn answer(ratings: [Option<i16>; 4]) -> SurveyAnswerPayload {
        SurveyAnswerPayload {
            rating_service: ratings[0],
            rating_quality: ratings[1],
            rating_deadline: ratings[2],
            rating_price: ratings[3],
            comment: None,
            would_recommend: Some(true),
        }
    }

    #[test]
    fn all_four_ratings_are_required() {
        let payload = answer([Some(5), Some(4), None, Some(3)]);
        assert!(payload.validate().is_err());
        assert!(payload.ratings().is_none());
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        for bad in [0, 6] {
            let payload = answer([Some(bad), Some(4), Some(4), Some(4)]);
            assert!(payload.validate().is_err());
            assert!(payload.ratings().is_none());
        }
    }

    #[test]
    fn average_of_valid_answer() {
        let payload = answer([Some(5), Some(4), Some(4), Some(4)]);
        assert!(payload.validate().is_ok());
        let ratings = payload.ratings().unwrap();
        assert_eq!(ratings.average(), dec!(4.25));
    }
}
