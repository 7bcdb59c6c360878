// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    notifications::{NotificationChannel, NotificationStatus, NotificationKind},
    operations::ServiceOrderStatus,
    registry::{Customer, Vehicle},
    reminders::ReminderView,
    surveys::{NpsResult, Survey, SurveyAverages},
};

// --- Histórico ---

// Tipos gravados em `customer_history.kind`. Texto livre para aceitar
// também os lançamentos manuais.
pub mod history_kind {
    pub const ORDER_CREATED: &str = "ORDER_CREATED";
    pub const ORDER_FINALIZED: &str = "ORDER_FINALIZED";
    pub const QUOTE_CONVERTED: &str = "QUOTE_CONVERTED";
    pub const REMINDER_CREATED: &str = "REMINDER_CREATED";
    pub const REMINDER_SENT: &str = "REMINDER_SENT";
    pub const REMINDER_DONE: &str = "REMINDER_DONE";
    pub const SURVEY_RESPONDED: &str = "SURVEY_RESPONDED";
}

pub const SYSTEM_USER: &str = "Sistema";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "ORDER_FINALIZED")]
    pub kind: String,
    #[schema(example = "OS OS2026-0042 finalizada")]
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub performed_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Entrada a gravar (automática ou manual)
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub customer_id: Uuid,
    pub kind: String,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub performed_by: String,
    pub notes: Option<String>,
}

impl NewHistoryEntry {
    pub fn system(customer_id: Uuid, kind: &str, description: String, reference_id: Option<Uuid>) -> Self {
        Self {
            customer_id,
            kind: kind.to_string(),
            description,
            reference_id,
            performed_by: SYSTEM_USER.to_string(),
            notes: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryFilter {
    pub tipo: Option<String>,
    pub limite: Option<i64>,
}

impl HistoryFilter {
    pub fn limit(&self) -> i64 {
        self.limite.filter(|l| *l > 0).unwrap_or(50).min(500)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "PHONE_CALL")]
    pub kind: String,
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    pub performed_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub customer_id: Uuid,
    pub total: usize,
    pub history: Vec<HistoryEntry>,
}

// --- Preferências ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPreferences {
    pub customer_id: Uuid,
    pub receive_reminders: bool,
    pub receive_promotions: bool,
    pub receive_surveys: bool,
    pub preferred_channel: NotificationChannel,
    #[schema(example = "Manhã")]
    pub best_time: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerPreferences {
    /// Consentimento do cliente para o tipo de mensagem. Tipos sem
    /// preferência própria (orçamento, OS pronta) são sempre aceitos.
    pub fn accepts(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Reminder => self.receive_reminders,
            NotificationKind::Survey => self.receive_surveys,
            NotificationKind::Campaign => self.receive_promotions,
            NotificationKind::Quote | NotificationKind::OrderReady => true,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesPayload {
    pub receive_reminders: Option<bool>,
    pub receive_promotions: Option<bool>,
    pub receive_surveys: Option<bool>,
    pub preferred_channel: Option<NotificationChannel>,
    pub best_time: Option<String>,
}

// --- Retenção e risco ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetentionStatus {
    Active,
    AtRisk,
    Inactive,
    Lost,
    NoHistory,
}

impl RetentionStatus {
    pub const ALL: [RetentionStatus; 5] = [
        RetentionStatus::Active,
        RetentionStatus::AtRisk,
        RetentionStatus::Inactive,
        RetentionStatus::Lost,
        RetentionStatus::NoHistory,
    ];

    /// Classifica pelos dias desde a última OS finalizada.
    pub fn classify(days_since_visit: Option<i32>) -> Self {
        match days_since_visit {
            None => RetentionStatus::NoHistory,
            Some(d) if d <= 90 => RetentionStatus::Active,
            Some(d) if d <= 180 => RetentionStatus::AtRisk,
            Some(d) if d <= 365 => RetentionStatus::Inactive,
            Some(_) => RetentionStatus::Lost,
        }
    }
}

// Linha agregada por cliente (só OS finalizadas entram na conta)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRow {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_visits: i64,
    pub last_visit: Option<DateTime<Utc>>,
    pub days_since_visit: Option<i32>,
    pub total_value: Decimal,
    pub average_ticket: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRetention {
    #[serde(flatten)]
    pub row: RetentionRow,
    pub status: RetentionStatus,
}

impl From<RetentionRow> for CustomerRetention {
    fn from(row: RetentionRow) -> Self {
        let status = RetentionStatus::classify(row.days_since_visit);
        Self { row, status }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionGroup {
    pub status: RetentionStatus,
    pub customers: i64,
    pub total_value: Decimal,
    pub average_ticket: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RetentionFilter {
    pub status: Option<RetentionStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetentionReport {
    pub customers: Vec<CustomerRetention>,
    pub groups: Vec<RetentionGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 70 => RiskLevel::Critical,
            s if s >= 50 => RiskLevel::High,
            s if s >= 30 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskLevel::Critical => {
                "Ação urgente necessária! Entre em contato imediatamente e ofereça promoções."
            }
            RiskLevel::High => "Cliente em risco. Envie lembretes e ofertas personalizadas.",
            RiskLevel::Medium => "Monitorar cliente e manter engajamento.",
            RiskLevel::Low => "Cliente com bom relacionamento. Manter comunicação regular.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    #[schema(example = "Mais de 6 meses sem visita")]
    pub factor: String,
    pub weight: u32,
    pub critical: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub customer_id: Uuid,
    pub retention_status: RetentionStatus,
    pub score: u32,
    pub level: RiskLevel,
    pub recommendation: String,
    pub factors: Vec<RiskFactor>,
    pub days_since_visit: Option<i32>,
    pub total_visits: i64,
    pub average_ticket: Option<Decimal>,
    pub total_value: Decimal,
}

// --- Perfil 360° ---

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_orders: i64,
    pub total_billed: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
    pub total_vehicles: i64,
    pub satisfaction_average: Option<Decimal>,
    pub pending_reminders: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderBrief {
    pub id: Uuid,
    pub number: String,
    pub status: ServiceOrderStatus,
    pub total: Decimal,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub customer: Customer,
    pub stats: ProfileStats,
    pub retention: RetentionStatus,
    pub vehicles: Vec<Vehicle>,
    pub recent_orders: Vec<OrderBrief>,
    pub surveys: Vec<Survey>,
    pub pending_reminders: Vec<ReminderView>,
    pub preferences: CustomerPreferences,
}

// --- Dashboard de CRM ---

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReminderCounters {
    pub total: usize,
    pub overdue: usize,
    pub upcoming: usize,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub customer_id: Uuid,
    pub name: String,
    pub total_billed: Decimal,
    pub total_orders: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationActivity {
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub status: NotificationStatus,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrmDashboard {
    pub retention: Vec<RetentionGroup>,
    pub reminders: ReminderCounters,
    pub surveys: SurveyAverages,
    pub nps: NpsResult,
    pub top_customers: Vec<TopCustomer>,
    pub notifications_last_30_days: Vec<NotificationActivity>,
}

// Data de referência para "lembrete não atendido": enviado e vencido há mais de 30 dias
pub fn stale_reminder_cutoff(today: NaiveDate) -> NaiveDate {
    today - chrono::Duration::days(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_buckets_use_inclusive_limits() {
        assert_eq!(RetentionStatus::classify(None), RetentionStatus::NoHistory);
        assert_eq!(RetentionStatus::classify(Some(0)), RetentionStatus::Active);
        assert_eq!(RetentionStatus::classify(Some(90)), RetentionStatus::Active);
        assert_eq!(RetentionStatus::classify(Some(91)), RetentionStatus::AtRisk);
        assert_eq!(RetentionStatus::classify(Some(180)), RetentionStatus::AtRisk);
        assert_eq!(RetentionStatus::classify(Some(200)), RetentionStatus::Inactive);
        assert_eq!(RetentionStatus::classify(Some(365)), RetentionStatus::Inactive);
        assert_eq!(RetentionStatus::classify(Some(366)), RetentionStatus::Lost);
    }

    #[test]
    fn risk_levels_follow_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Critical);
    }

    #[test]
    fn preferences_gate_each_kind() {
        let prefs = CustomerPreferences {
            customer_id: Uuid::new_v4(),
            receive_reminders: false,
            receive_promotions: true,
            receive_surveys: false,
            preferred_channel: NotificationChannel::Sms,
            best_time: None,
            updated_at: Utc::now(),
        };
        assert!(!prefs.accepts(NotificationKind::Reminder));
        assert!(!prefs.accepts(NotificationKind::Survey));
        assert!(prefs.accepts(NotificationKind::Campaign));
        assert!(prefs.accepts(NotificationKind::OrderReady));
    }
}
