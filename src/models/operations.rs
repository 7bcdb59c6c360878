// src/models/operations.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::lifecycle::StatusMachine;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceOrderStatus {
    AwaitingDiagnosis,
    AwaitingApproval,
    InRepair,
    ReadyForPickup,
    Finalized,
    Cancelled,
}

impl ServiceOrderStatus {
    // Colunas do Kanban, na ordem do fluxo
    pub const OPEN: [ServiceOrderStatus; 4] = [
        ServiceOrderStatus::AwaitingDiagnosis,
        ServiceOrderStatus::AwaitingApproval,
        ServiceOrderStatus::InRepair,
        ServiceOrderStatus::ReadyForPickup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ServiceOrderStatus::AwaitingDiagnosis => "Aguardando Diagnóstico",
            ServiceOrderStatus::AwaitingApproval => "Aguardando Aprovação",
            ServiceOrderStatus::InRepair => "Em Reparo",
            ServiceOrderStatus::ReadyForPickup => "Pronto para Retirada",
            ServiceOrderStatus::Finalized => "Finalizada",
            ServiceOrderStatus::Cancelled => "Cancelada",
        }
    }
}

impl StatusMachine for ServiceOrderStatus {
    fn allowed_transitions(self) -> &'static [Self] {
        use ServiceOrderStatus::*;
        match self {
            AwaitingDiagnosis => &[AwaitingApproval, Cancelled],
            AwaitingApproval => &[InRepair, Cancelled],
            InRepair => &[ReadyForPickup, Cancelled],
            ReadyForPickup => &[Finalized, Cancelled],
            Finalized | Cancelled => &[],
        }
    }

    fn code(self) -> &'static str {
        match self {
            ServiceOrderStatus::AwaitingDiagnosis => "AWAITING_DIAGNOSIS",
            ServiceOrderStatus::AwaitingApproval => "AWAITING_APPROVAL",
            ServiceOrderStatus::InRepair => "IN_REPAIR",
            ServiceOrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            ServiceOrderStatus::Finalized => "FINALIZED",
            ServiceOrderStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "checklist_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChecklistStatus {
    Ok,
    Damaged,
    NotChecked,
}

impl ChecklistStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "OK" => Some(ChecklistStatus::Ok),
            "DAMAGED" => Some(ChecklistStatus::Damaged),
            "NOT_CHECKED" => Some(ChecklistStatus::NotChecked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "communication_channel", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommunicationChannel {
    Email,
    Sms,
    Whatsapp,
    Phone,
    System,
}

// --- Ordem de Serviço ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: Uuid,
    #[schema(example = "OS2026-0042")]
    pub number: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub quote_id: Option<Uuid>,
    pub status: ServiceOrderStatus,
    pub problem_reported: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub odometer_in: Option<i32>,
    #[schema(example = "150.00")]
    pub services_total: Decimal,
    #[schema(example = "20.00")]
    pub parts_total: Decimal,
    #[schema(example = "0.00")]
    pub discount: Decimal,
    #[schema(example = "170.00")]
    pub total: Decimal,
    pub opened_at: DateTime<Utc>,
    pub expected_on: Option<NaiveDate>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha de listagem (com nomes do cliente, veículo e mecânico)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderSummary {
    pub id: Uuid,
    pub number: String,
    pub status: ServiceOrderStatus,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub vehicle_id: Uuid,
    pub plate: String,
    pub vehicle_description: String,
    pub mechanic_name: Option<String>,
    pub total: Decimal,
    pub opened_at: DateTime<Utc>,
    pub expected_on: Option<NaiveDate>,
    pub closed_at: Option<DateTime<Utc>>,
    pub days_open: i32,
}

// Linhas de serviço/peça são compartilhadas entre OS e orçamento;
// `document_id` aponta para a OS ou para o orçamento dono da linha.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub id: Uuid,
    pub document_id: Uuid,
    pub service_type_id: Uuid,
    pub service_name: String,
    pub category_name: Option<String>,
    pub mechanic_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartLine {
    pub id: Uuid,
    pub document_id: Uuid,
    pub part_id: Uuid,
    pub part_code: String,
    pub part_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub service_order_id: Uuid,
    #[schema(example = "Para-choque dianteiro")]
    pub item: String,
    pub status: ChecklistStatus,
    pub notes: Option<String>,
    #[schema(example = "/uploads/checklist-1767225600000-123456789.jpg")]
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub channel: CommunicationChannel,
    pub message: String,
    pub sent_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Dados de cabeçalho para detalhe e PDF
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub plate: String,
    pub make: String,
    pub model: String,
    pub vehicle_year: Option<i32>,
    pub mechanic_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderDetail {
    #[serde(flatten)]
    pub order: ServiceOrder,
    #[serde(flatten)]
    pub party: PartyInfo,
    pub services: Vec<ServiceLine>,
    pub parts: Vec<PartLine>,
    pub checklist: Vec<ChecklistItem>,
    pub history: Vec<Communication>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KanbanColumn {
    pub status: ServiceOrderStatus,
    pub label: String,
    pub orders: Vec<ServiceOrderSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { page, limit, total, pages }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceOrderPage {
    pub data: Vec<ServiceOrderSummary>,
    pub pagination: Pagination,
}

// --- Filtros e Payloads ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "snake_case")]
#[into_params(parameter_in = Query)]
pub struct ServiceOrderFilter {
    pub status: Option<ServiceOrderStatus>,
    pub cliente_id: Option<Uuid>,
    pub veiculo_id: Option<Uuid>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ServiceOrderFilter {
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.filter(|l| *l > 0).unwrap_or(Self::DEFAULT_LIMIT).min(500)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceOrderPayload {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub expected_on: Option<NaiveDate>,
    #[validate(range(min = 0, message = "positive"))]
    pub odometer_in: Option<i32>,
    #[schema(example = "Barulho ao frear")]
    pub problem_reported: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceOrderPayload {
    pub mechanic_id: Option<Uuid>,
    pub expected_on: Option<NaiveDate>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusPayload {
    pub status: ServiceOrderStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddServiceLinePayload {
    pub service_type_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "positive"))]
    pub quantity: Option<i32>,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPartLinePayload {
    pub part_id: Uuid,
    #[validate(range(min = 1, message = "positive"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationPayload {
    pub channel: CommunicationChannel,
    #[validate(length(min = 1, message = "required"))]
    pub message: String,
    pub sent_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ServiceOrderStatus::*;

    #[test]
    fn happy_path_is_linear() {
        let path = [AwaitingDiagnosis, AwaitingApproval, InRepair, ReadyForPickup, Finalized];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn steps_cannot_be_skipped() {
        assert!(!AwaitingDiagnosis.can_transition_to(InRepair));
        assert!(!AwaitingDiagnosis.can_transition_to(Finalized));
        assert!(!InRepair.can_transition_to(Finalized));
    }

    #[test]
    fn cancel_is_reachable_from_every_open_state() {
        for status in ServiceOrderStatus::OPEN {
            assert!(status.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for next in [AwaitingDiagnosis, AwaitingApproval, InRepair, ReadyForPickup, Finalized, Cancelled] {
            assert!(Finalized.ensure_transition(next).is_err());
            assert!(Cancelled.ensure_transition(next).is_err());
        }
        assert!(Finalized.is_terminal());
        assert!(!InRepair.is_terminal());
    }

    #[test]
    fn same_state_is_not_a_transition() {
        assert!(InRepair.ensure_transition(InRepair).is_err());
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(1, 50, 101);
        assert_eq!(p.pages, 3);
        assert_eq!(Pagination::new(1, 50, 0).pages, 0);
    }

    #[test]
    fn filter_defaults() {
        let filter = ServiceOrderFilter::default();
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), 50);
        assert_eq!(filter.offset(), 0);
    }
}
