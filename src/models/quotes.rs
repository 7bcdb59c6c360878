// src/models/quotes.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    lifecycle::StatusMachine,
    operations::{AddPartLinePayload, AddServiceLinePayload, PartLine, PartyInfo, ServiceLine, ServiceOrder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quote_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Pending,
    Sent,
    Approved,
    Rejected,
    Expired,
    Converted,
}

impl QuoteStatus {
    /// A conversão aceita qualquer estado exceto o próprio CONVERTED.
    pub fn can_convert(self) -> bool {
        self != QuoteStatus::Converted
    }

    // Expiração é só derivada na leitura: nada altera o status gravado.
    pub fn is_expired_on(self, valid_until: NaiveDate, today: NaiveDate) -> bool {
        matches!(self, QuoteStatus::Pending | QuoteStatus::Sent) && valid_until < today
    }
}

// Transições via PATCH. CONVERTED fica de fora: só a operação de conversão chega lá.
impl StatusMachine for QuoteStatus {
    fn allowed_transitions(self) -> &'static [Self] {
        use QuoteStatus::*;
        match self {
            Pending => &[Sent, Approved, Rejected, Expired],
            Sent => &[Approved, Rejected, Expired],
            Approved | Rejected | Expired | Converted => &[],
        }
    }

    fn code(self) -> &'static str {
        match self {
            QuoteStatus::Pending => "PENDING",
            QuoteStatus::Sent => "SENT",
            QuoteStatus::Approved => "APPROVED",
            QuoteStatus::Rejected => "REJECTED",
            QuoteStatus::Expired => "EXPIRED",
            QuoteStatus::Converted => "CONVERTED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    #[schema(example = "ORC2026-0007")]
    pub number: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: QuoteStatus,
    pub problem_description: Option<String>,
    pub notes: Option<String>,
    pub valid_until: NaiveDate,
    pub services_total: Decimal,
    pub parts_total: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub service_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub id: Uuid,
    pub number: String,
    pub status: QuoteStatus,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub vehicle_id: Uuid,
    pub plate: String,
    pub vehicle_description: String,
    pub total: Decimal,
    pub valid_until: NaiveDate,
    pub service_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expired: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub quote: Quote,
    #[serde(flatten)]
    pub party: PartyInfo,
    pub expired: bool,
    pub services: Vec<ServiceLine>,
    pub parts: Vec<PartLine>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatusStat {
    pub status: QuoteStatus,
    pub count: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatistics {
    pub total: i64,
    pub total_value: Decimal,
    pub by_status: Vec<QuoteStatusStat>,
    #[schema(example = "42.50")]
    pub conversion_rate: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub message: String,
    pub order: ServiceOrder,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub cliente_id: Option<Uuid>,
    pub expirados: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotePayload {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub problem_description: Option<String>,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub discount: Option<Decimal>,
    #[serde(default)]
    #[validate(nested)]
    pub services: Vec<AddServiceLinePayload>,
    #[serde(default)]
    #[validate(nested)]
    pub parts: Vec<AddPartLinePayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotePayload {
    pub problem_description: Option<String>,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeQuoteStatusPayload {
    pub status: QuoteStatus,
}

/// Taxa de conversão = aprovados / total * 100, com duas casas.
pub fn conversion_rate(approved: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(approved) * Decimal::from(100) / Decimal::from(total)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use QuoteStatus::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn converted_quotes_cannot_be_converted_again() {
        assert!(!Converted.can_convert());
        for status in [Pending, Sent, Approved, Rejected, Expired] {
            assert!(status.can_convert());
        }
    }

    #[test]
    fn patch_never_reaches_converted() {
        for status in [Pending, Sent, Approved, Rejected, Expired, Converted] {
            assert!(!status.can_transition_to(Converted));
        }
    }

    #[test]
    fn decisions_are_terminal_for_patch() {
        assert!(Approved.ensure_transition(Sent).is_err());
        assert!(Rejected.ensure_transition(Approved).is_err());
        assert!(Pending.ensure_transition(Sent).is_ok());
        assert!(Sent.ensure_transition(Approved).is_ok());
    }

    #[test]
    fn expiry_is_derived_only_for_open_quotes() {
        let today = day("2026-03-10");
        assert!(Pending.is_expired_on(day("2026-03-09"), today));
        assert!(Sent.is_expired_on(day("2026-03-01"), today));
        assert!(!Pending.is_expired_on(day("2026-03-10"), today));
        assert!(!Approved.is_expired_on(day("2026-01-01"), today));
    }

    #[test]
    fn conversion_rate_handles_empty_and_rounds() {
        assert_eq!(conversion_rate(0, 0), Decimal::ZERO);
        assert_eq!(conversion_rate(1, 3), dec!(33.33));
        assert_eq!(conversion_rate(2, 4), dec!(50));
    }
}
