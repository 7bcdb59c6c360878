// src/models/reminders.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::notifications::NotificationChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reminder_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderKind {
    OilChange,  // Troca de óleo
    Inspection, // Revisão
    Alignment,  // Alinhamento e balanceamento
    Brakes,     // Freios
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reminder_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Scheduled,
    Done,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reminder_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

// Urgência derivada da data alvo (não é gravada)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderUrgency {
    Overdue,
    Upcoming,
    Future,
}

impl ReminderUrgency {
    pub const UPCOMING_WINDOW_DAYS: i64 = 7;

    pub fn code(self) -> &'static str {
        match self {
            ReminderUrgency::Overdue => "OVERDUE",
            ReminderUrgency::Upcoming => "UPCOMING",
            ReminderUrgency::Future => "FUTURE",
        }
    }

    /// Sem data alvo (só quilometragem) o lembrete conta como futuro.
    pub fn classify(due_on: Option<NaiveDate>, today: NaiveDate) -> Self {
        match due_on {
            Some(due) if due < today => ReminderUrgency::Overdue,
            Some(due) if (due - today).num_days() <= Self::UPCOMING_WINDOW_DAYS => {
                ReminderUrgency::Upcoming
            }
            _ => ReminderUrgency::Future,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub plate: String,
    pub vehicle_description: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub service_order_id: Option<Uuid>,
    pub kind: ReminderKind,
    #[schema(example = "Troca de óleo e filtro")]
    pub description: String,
    pub current_odometer: Option<i32>,
    pub due_odometer: Option<i32>,
    pub due_on: Option<NaiveDate>,
    pub status: ReminderStatus,
    pub priority: ReminderPriority,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub send_count: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderView {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub urgency: ReminderUrgency,
    pub days_remaining: Option<i64>,
}

impl ReminderView {
    pub fn new(reminder: Reminder, today: NaiveDate) -> Self {
        let urgency = ReminderUrgency::classify(reminder.due_on, today);
        let days_remaining = reminder.due_on.map(|d| (d - today).num_days());
        Self { reminder, urgency, days_remaining }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReminderList {
    pub total: usize,
    pub reminders: Vec<ReminderView>,
}

impl From<Vec<ReminderView>> for ReminderList {
    fn from(reminders: Vec<ReminderView>) -> Self {
        Self { total: reminders.len(), reminders }
    }
}

// Lembrete a gravar, vindo do cadastro manual ou das regras automáticas
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub service_order_id: Option<Uuid>,
    pub kind: ReminderKind,
    pub description: String,
    pub current_odometer: Option<i32>,
    pub due_odometer: Option<i32>,
    pub due_on: Option<NaiveDate>,
    pub priority: ReminderPriority,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReminderFilter {
    pub status: Option<ReminderStatus>,
    pub tipo: Option<ReminderKind>,
    pub prioridade: Option<ReminderPriority>,
    pub urgencia: Option<ReminderUrgency>,
    pub cliente_id: Option<Uuid>,
    pub veiculo_id: Option<Uuid>,
    pub limite: Option<i64>,
}

impl ReminderFilter {
    pub fn limit(&self) -> i64 {
        self.limite.filter(|l| *l > 0).unwrap_or(50).min(500)
    }
}

fn validate_target(payload: &CreateReminderPayload) -> Result<(), ValidationError> {
    if payload.due_on.is_none() && payload.due_odometer.is_none() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_target"))]
pub struct CreateReminderPayload {
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub kind: ReminderKind,
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    #[validate(range(min = 0, message = "positive"))]
    pub current_odometer: Option<i32>,
    #[validate(range(min = 0, message = "positive"))]
    pub due_odometer: Option<i32>,
    pub due_on: Option<NaiveDate>,
    pub priority: Option<ReminderPriority>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderPayload {
    pub kind: Option<ReminderKind>,
    #[validate(length(min = 1, message = "required"))]
    pub description: Option<String>,
    pub current_odometer: Option<i32>,
    pub due_odometer: Option<i32>,
    pub due_on: Option<NaiveDate>,
    pub priority: Option<ReminderPriority>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReminderStatusPayload {
    pub status: ReminderStatus,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderPayload {
    pub channel: Option<NotificationChannel>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderResult {
    pub reminder: ReminderView,
    pub channel: NotificationChannel,
    pub delivered: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AutoCreatePayload {
    pub os_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoCreateResult {
    pub created: usize,
    pub reminders: Vec<ReminderView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn urgency_buckets() {
        let today = day("2026-05-10");
        assert_eq!(ReminderUrgency::classify(Some(day("2026-05-09")), today), ReminderUrgency::Overdue);
        assert_eq!(ReminderUrgency::classify(Some(day("2026-05-10")), today), ReminderUrgency::Upcoming);
        assert_eq!(ReminderUrgency::classify(Some(day("2026-05-17")), today), ReminderUrgency::Upcoming);
        assert_eq!(ReminderUrgency::classify(Some(day("2026-05-18")), today), ReminderUrgency::Future);
    }

    #[test]
    fn odometer_only_reminders_are_future() {
        assert_eq!(ReminderUrgency::classify(None, day("2026-05-10")), ReminderUrgency::Future);
    }

    #[test]
    fn create_requires_date_or_odometer() {
        let payload = CreateReminderPayload {
            vehicle_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            kind: ReminderKind::OilChange,
            description: "Troca de óleo".into(),
            current_odometer: None,
            due_odometer: None,
            due_on: None,
            priority: None,
            notes: None,
        };
        assert!(payload.validate().is_err());

        let payload = CreateReminderPayload { due_odometer: Some(60_000), ..payload };
        assert!(payload.validate().is_ok());
    }
}
