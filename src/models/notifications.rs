// src/models/notifications.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Reminder,
    Quote,
    OrderReady,
    Survey,
    Campaign,
}

impl NotificationKind {
    pub fn code(self) -> &'static str {
        match self {
            NotificationKind::Reminder => "REMINDER",
            NotificationKind::Quote => "QUOTE",
            NotificationKind::OrderReady => "ORDER_READY",
            NotificationKind::Survey => "SURVEY",
            NotificationKind::Campaign => "CAMPAIGN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_channel", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    #[default]
    Whatsapp,
    Sms,
    Email,
}

impl NotificationChannel {
    pub fn code(self) -> &'static str {
        match self {
            NotificationChannel::Whatsapp => "WHATSAPP",
            NotificationChannel::Sms => "SMS",
            NotificationChannel::Email => "EMAIL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Delivered,
    Read,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    #[schema(example = "555-0100")]
    pub recipient: String,
    pub message: String,
    pub status: NotificationStatus,
    pub reference_id: Option<Uuid>,
    pub attempts: i32,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Dados de contato usados para resolver o destinatário
#[derive(Debug, Clone, FromRow)]
pub struct ContactInfo {
    pub customer_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationFilter {
    pub status: Option<NotificationStatus>,
    pub tipo: Option<NotificationKind>,
    pub meio: Option<NotificationChannel>,
    pub cliente_id: Option<Uuid>,
    pub limite: Option<i64>,
}

impl NotificationFilter {
    pub fn limit(&self) -> i64 {
        self.limite.filter(|l| *l > 0).unwrap_or(50).min(500)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationPeriod {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationPayload {
    pub customer_id: Uuid,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    #[validate(length(min = 1, message = "required"))]
    pub message: String,
    pub reference_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchNotificationPayload {
    #[validate(length(min = 1, message = "required"))]
    pub customer_ids: Vec<Uuid>,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    #[validate(length(min = 1, message = "required"))]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub notification: Notification,
    pub delivered: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub customer_id: Uuid,
    pub sent: bool,
    pub notification_id: Option<Uuid>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub details: Vec<BatchItemResult>,
}

impl BatchResult {
    pub fn push(&mut self, item: BatchItemResult) {
        if item.sent {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.details.push(item);
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatusCount {
    pub status: NotificationStatus,
    pub total: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationKindCount {
    pub kind: NotificationKind,
    pub total: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChannelCount {
    pub channel: NotificationChannel,
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatistics {
    pub by_status: Vec<NotificationStatusCount>,
    pub by_kind: Vec<NotificationKindCount>,
    pub by_channel: Vec<NotificationChannelCount>,
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
    #[schema(example = "90.00")]
    pub success_rate: Decimal,
}

/// Percentual de envios bem-sucedidos, com duas casas (0 sem envios).
pub fn success_rate(sent: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(sent) * Decimal::from(100) / Decimal::from(total)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(sent: bool) -> BatchItemResult {
        BatchItemResult {
            customer_id: Uuid::new_v4(),
            sent,
            notification_id: None,
            error: (!sent).then(|| "falha".to_string()),
        }
    }

    #[test]
    fn batch_result_counts_outcomes() {
        let mut result = BatchResult { total: 3, ..Default::default() };
        result.push(item(true));
        result.push(item(false));
        result.push(item(true));

        assert_eq!(result.sent, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.details.len(), 3);
    }

    #[test]
    fn success_rate_rounds_and_handles_zero() {
        assert_eq!(success_rate(0, 0), Decimal::ZERO);
        assert_eq!(success_rate(9, 10), dec!(90));
        assert_eq!(success_rate(2, 3), dec!(66.67));
    }

    #[test]
    fn default_channel_is_whatsapp() {
        assert_eq!(NotificationChannel::default(), NotificationChannel::Whatsapp);
        assert_eq!(NotificationChannel::Email.code(), "EMAIL");
    }
}
