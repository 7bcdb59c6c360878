// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "account_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Revenue, // Receita
    Expense, // Despesa
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "receivable_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceivableStatus {
    Open,
    Received,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payable_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayableStatus {
    Open,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cash_flow_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowKind {
    Inflow,  // Entrada
    Outflow, // Saída
}

// Códigos fixos do plano de contas usados pelos lançamentos automáticos
pub mod account_codes {
    pub const SERVICE_REVENUE: &str = "1.01";
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    #[schema(example = "1.01")]
    pub code: String,
    #[schema(example = "Receita de Serviços")]
    pub name: String,
    pub kind: AccountKind,
    pub is_active: bool,
}

// `overdue` e `days_overdue` são derivados na consulta: nada grava OVERDUE sozinho.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id: Uuid,
    #[schema(example = "OS2026-0042 - Jane Doe")]
    pub description: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub service_order_id: Option<Uuid>,
    pub service_order_number: Option<String>,
    pub account_id: Option<Uuid>,
    pub account_name: Option<String>,
    #[schema(example = "350.00")]
    pub amount: Decimal,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub received_on: Option<NaiveDate>,
    pub status: ReceivableStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub overdue: bool,
    pub days_overdue: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payable {
    pub id: Uuid,
    pub description: String,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub purchase_order_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub account_name: Option<String>,
    pub amount: Decimal,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub paid_on: Option<NaiveDate>,
    pub status: PayableStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub overdue: bool,
    pub days_overdue: i32,
}

// Totais de um dia do fluxo de caixa (vem agregado do banco)
#[derive(Debug, Clone, FromRow)]
pub struct CashFlowDayTotals {
    pub entry_date: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowDay {
    pub date: NaiveDate,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub day_balance: Decimal,
    pub running_balance: Decimal,
}

/// Acumula o saldo dia a dia, na ordem recebida (datas crescentes).
pub fn with_running_balance(days: Vec<CashFlowDayTotals>) -> Vec<CashFlowDay> {
    let mut running = Decimal::ZERO;
    days.into_iter()
        .map(|d| {
            let day_balance = d.inflow - d.outflow;
            running += day_balance;
            CashFlowDay {
                date: d.entry_date,
                inflow: d.inflow,
                outflow: d.outflow,
                day_balance,
                running_balance: running,
            }
        })
        .collect()
}

#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleTotals {
    pub open_count: i64,
    pub open_amount: Decimal,
    pub overdue_count: i64,
    pub overdue_amount: Decimal,
}

#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthCashFlow {
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    pub receivables: TitleTotals,
    pub payables: TitleTotals,
    pub current_month: MonthCashFlow,
}

// --- Filtros e Payloads ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReceivableFilter {
    pub status: Option<ReceivableStatus>,
    pub atrasadas: Option<bool>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PayableFilter {
    pub status: Option<PayableStatus>,
    pub atrasadas: Option<bool>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CashFlowFilter {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceivablePayload {
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    pub customer_id: Option<Uuid>,
    pub service_order_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "350.00")]
    pub amount: Decimal,
    pub issued_on: Option<NaiveDate>,
    pub due_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayablePayload {
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    pub supplier_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    pub issued_on: Option<NaiveDate>,
    pub due_on: NaiveDate,
    pub notes: Option<String>,
}

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message("positive".into()))
    }
}

// Baixa de título (recebimento ou pagamento). Data vazia = hoje.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPayload {
    pub date: Option<NaiveDate>,
    #[schema(example = "PIX")]
    pub payment_method: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn running_balance_accumulates_in_order() {
        let flow = with_running_balance(vec![
            CashFlowDayTotals { entry_date: day("2026-03-01"), inflow: dec!(500), outflow: dec!(200) },
            CashFlowDayTotals { entry_date: day("2026-03-02"), inflow: dec!(0), outflow: dec!(450) },
            CashFlowDayTotals { entry_date: day("2026-03-03"), inflow: dec!(100), outflow: dec!(0) },
        ]);

        let balances: Vec<_> = flow.iter().map(|d| d.running_balance).collect();
        assert_eq!(balances, vec![dec!(300), dec!(-150), dec!(-50)]);
        assert_eq!(flow[1].day_balance, dec!(-450));
    }

    #[test]
    fn amounts_must_be_positive() {
        let payload = |amount: Decimal| CreateReceivablePayload {
            description: "Serviço avulso".into(),
            customer_id: None,
            service_order_id: None,
            account_id: None,
            amount,
            issued_on: None,
            due_on: day("2026-04-01"),
            notes: None,
        };
        assert!(payload(dec!(10.50)).validate().is_ok());
        assert!(payload(dec!(0)).validate().is_err());
        assert!(payload(dec!(-1)).validate().is_err());
    }

    #[test]
    fn empty_cash_flow_is_empty() {
        assert!(with_running_balance(Vec::new()).is_empty());
    }
}
