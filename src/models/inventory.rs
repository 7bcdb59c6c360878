// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::lifecycle::StatusMachine;

// --- Movimentações de Estoque ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_kind", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum StockMovementKind {
    In,         // Entrada (compra, ajuste positivo)
    Out,        // Saída (uso em OS, ajuste negativo)
    Adjustment, // Correção de inventário
    Return,     // Devolução (peça removida da OS, OS cancelada)
}

impl StockMovementKind {
    /// Sentido do ajuste manual: delta positivo entra, negativo sai.
    pub fn for_delta(delta: i32) -> Self {
        if delta > 0 { StockMovementKind::In } else { StockMovementKind::Out }
    }
}

// Referência de origem da movimentação
pub mod reference {
    pub const SERVICE_ORDER: &str = "OS";
    pub const PURCHASE_ORDER: &str = "OC";
    pub const ADJUSTMENT: &str = "AJUSTE";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub part_id: Uuid,
    pub part_code: String,
    pub part_name: String,
    pub kind: StockMovementKind,
    pub quantity: i32,
    pub stock_before: i32,
    pub stock_after: i32,
    pub reason: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Resultado de uma alteração de saldo (antes/depois), usado para gravar o histórico
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StockChange {
    pub stock_before: i32,
    pub stock_after: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementFilter {
    pub peca_id: Option<Uuid>,
    pub tipo: Option<StockMovementKind>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentPayload {
    pub part_id: Uuid,
    // Delta com sinal: +5 entra, -3 sai
    #[schema(example = -2)]
    pub quantity: i32,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Inventário mensal")]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentResult {
    pub part_id: Uuid,
    pub stock_before: i32,
    pub stock_after: i32,
    pub movement: StockMovement,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementKindStat {
    pub kind: StockMovementKind,
    pub movements: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartMovementStat {
    pub part_id: Uuid,
    pub code: String,
    pub name: String,
    pub stock_quantity: i32,
    pub movements: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdlePart {
    pub part_id: Uuid,
    pub code: String,
    pub name: String,
    pub stock_quantity: i32,
    pub last_movement_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockStatistics {
    pub by_kind: Vec<MovementKindStat>,
    pub most_moved: Vec<PartMovementStat>,
    pub idle_parts: Vec<IdlePart>,
    pub idle_days: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverEntry {
    pub part_id: Uuid,
    pub code: String,
    pub name: String,
    pub stock_quantity: i32,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub out_movements: i64,
    pub quantity_out: i64,
    pub quantity_in: i64,
    pub revenue: Decimal,
    pub cost_sold: Decimal,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverTotals {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub quantity_out: i64,
}

impl TurnoverTotals {
    pub fn from_entries(entries: &[TurnoverEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, e| {
            acc.revenue += e.revenue;
            acc.cost += e.cost_sold;
            acc.profit += e.revenue - e.cost_sold;
            acc.quantity_out += e.quantity_out;
            acc
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub items: Vec<TurnoverEntry>,
    pub totals: TurnoverTotals,
}

// --- Ordens de Compra ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Received,
    Cancelled,
}

impl StatusMachine for PurchaseOrderStatus {
    fn allowed_transitions(self) -> &'static [Self] {
        use PurchaseOrderStatus::*;
        match self {
            Pending => &[Approved, Cancelled],
            Approved => &[Received, Cancelled],
            Received | Cancelled => &[],
        }
    }

    fn code(self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "PENDING",
            PurchaseOrderStatus::Approved => "APPROVED",
            PurchaseOrderStatus::Received => "RECEIVED",
            PurchaseOrderStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(example = "OC2026-0003")]
    pub number: String,
    pub supplier_id: Uuid,
    pub status: PurchaseOrderStatus,
    pub total: Decimal,
    pub expected_on: Option<NaiveDate>,
    pub received_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub part_id: Uuid,
    pub part_name: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub supplier_name: String,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItemPayload {
    pub part_id: Uuid,
    #[validate(range(min = 1, message = "positive"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderPayload {
    pub supplier_id: Uuid,
    pub expected_on: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "required"), nested)]
    pub items: Vec<PurchaseOrderItemPayload>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderFilter {
    pub status: Option<PurchaseOrderStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePurchaseOrderStatusPayload {
    pub status: PurchaseOrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn adjustment_direction_follows_sign() {
        assert_eq!(StockMovementKind::for_delta(5), StockMovementKind::In);
        assert_eq!(StockMovementKind::for_delta(-5), StockMovementKind::Out);
    }

    #[test]
    fn purchase_orders_are_received_only_after_approval() {
        use PurchaseOrderStatus::*;
        assert!(Pending.ensure_transition(Received).is_err());
        assert!(Approved.ensure_transition(Received).is_ok());
        assert!(Received.ensure_transition(Cancelled).is_err());
    }

    #[test]
    fn turnover_totals_sum_profit() {
        let entry = |revenue: Decimal, cost: Decimal, qty: i64| TurnoverEntry {
            part_id: Uuid::new_v4(),
            code: "P".into(),
            name: "Peça".into(),
            stock_quantity: 0,
            cost_price: Decimal::ZERO,
            sale_price: Decimal::ZERO,
            out_movements: 1,
            quantity_out: qty,
            quantity_in: 0,
            revenue,
            cost_sold: cost,
        };
        let totals = TurnoverTotals::from_entries(&[
            entry(dec!(100), dec!(60), 2),
            entry(dec!(50), dec!(20), 1),
        ]);
        assert_eq!(totals.revenue, dec!(150));
        assert_eq!(totals.cost, dec!(80));
        assert_eq!(totals.profit, dec!(70));
        assert_eq!(totals.quantity_out, 3);
    }

    fn purchase_order(items: Vec<PurchaseOrderItemPayload>) -> CreatePurchaseOrderPayload {
        CreatePurchaseOrderPayload { supplier_id: Uuid::new_v4(), expected_on: None, notes: None, items }
    }

    #[test]
    fn purchase_order_checks_items_one_by_one() {
        let item = |quantity| PurchaseOrderItemPayload { part_id: Uuid::new_v4(), quantity, unit_cost: dec!(6) };

        assert!(purchase_order(vec![item(3)]).validate().is_ok());

        let empty = purchase_order(Vec::new()).validate().unwrap_err();
        assert!(empty.errors().contains_key("items"));

        let zero = purchase_order(vec![item(3), item(0)]).validate().unwrap_err();
        assert!(zero.errors().contains_key("items"));
    }
}
