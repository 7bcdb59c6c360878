// src/models/reports.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportPeriod {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

impl ReportPeriod {
    // O filtro só vale com as duas pontas informadas
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.data_inicio.zip(self.data_fim)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Janela em dias (padrão 30)
    pub periodo: Option<i64>,
}

impl DashboardQuery {
    pub fn days(&self) -> i64 {
        self.periodo.filter(|p| *p > 0).unwrap_or(30)
    }
}

/// Percentual `part / whole * 100` com duas casas (0 quando o todo é zero).
pub fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::from(100)).round_dp(2)
}

// 1. Rentabilidade por OS

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderProfitability {
    pub id: Uuid,
    pub number: String,
    pub customer_name: String,
    pub closed_at: Option<DateTime<Utc>>,
    pub services_total: Decimal,
    pub parts_total: Decimal,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub gross_profit: Decimal,
    pub margin_percent: Decimal,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilitySummary {
    pub total_orders: usize,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    pub average_margin: Decimal,
}

impl ProfitabilitySummary {
    pub fn from_orders(orders: &[OrderProfitability]) -> Self {
        let mut summary = orders.iter().fold(Self::default(), |mut acc, o| {
            acc.total_orders += 1;
            acc.revenue += o.revenue;
            acc.cost += o.cost;
            acc.profit += o.gross_profit;
            acc
        });
        summary.average_margin = percent(summary.profit, summary.revenue);
        summary
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfitabilityReport {
    pub details: Vec<OrderProfitability>,
    pub summary: ProfitabilitySummary,
}

// 2. Categorias e mecânicos

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub category: String,
    pub total_orders: i64,
    pub total_services: i64,
    pub service_quantity: i64,
    pub revenue: Decimal,
    pub average_ticket: Decimal,
    #[sqlx(default)]
    pub revenue_share: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MechanicPerformance {
    pub mechanic_id: Uuid,
    pub mechanic: String,
    pub total_orders: i64,
    pub finalized_orders: i64,
    pub revenue: Decimal,
    pub average_ticket: Option<Decimal>,
    pub average_days: Option<Decimal>,
}

// 3. Curva ABC

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub fn from_cumulative(cumulative_percent: Decimal) -> Self {
        if cumulative_percent <= Decimal::from(80) {
            AbcClass::A
        } else if cumulative_percent <= Decimal::from(95) {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbcRank {
    pub position: usize,
    pub share_percent: Decimal,
    pub cumulative_percent: Decimal,
    pub class: AbcClass,
}

/// Classifica valores já ordenados do maior para o menor. A classe usa o
/// acumulado sem arredondamento; só a saída é arredondada.
pub fn abc_curve(values: &[Decimal]) -> Vec<AbcRank> {
    let total: Decimal = values.iter().copied().sum();
    let mut cumulative = Decimal::ZERO;

    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let share = if total.is_zero() {
                Decimal::ZERO
            } else {
                *value / total * Decimal::from(100)
            };
            cumulative += share;
            AbcRank {
                position: index + 1,
                share_percent: share.round_dp(2),
                cumulative_percent: cumulative.round_dp(2),
                class: AbcClass::from_cumulative(cumulative),
            }
        })
        .collect()
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRevenue {
    pub id: Uuid,
    pub name: String,
    pub total_orders: i64,
    pub revenue: Decimal,
    pub average_ticket: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartRevenue {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub total_orders: i64,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAbcEntry {
    #[serde(flatten)]
    pub customer: CustomerRevenue,
    #[serde(flatten)]
    pub rank: AbcRank,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartAbcEntry {
    #[serde(flatten)]
    pub part: PartRevenue,
    #[serde(flatten)]
    pub rank: AbcRank,
    pub profit_margin: Decimal,
}

// 4. Dashboard

#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTotals {
    pub total_orders: i64,
    pub revenue: Decimal,
    pub average_ticket: Option<Decimal>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedRevenue {
    pub name: String,
    pub total_orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDashboard {
    pub period_days: i64,
    pub since: NaiveDate,
    pub revenue: RevenueTotals,
    pub profitability: ProfitabilitySummary,
    pub top_categories: Vec<RankedRevenue>,
    pub top_customers: Vec<RankedRevenue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn abc_classes_follow_cumulative_share() {
        // Participações 60, 22, 8, 7, 3 -> acumulado 60, 82, 90, 97, 100
        let curve = abc_curve(&[dec!(600), dec!(220), dec!(80), dec!(70), dec!(30)]);
        let classes: Vec<_> = curve.iter().map(|r| r.class).collect();
        assert_eq!(classes, vec![AbcClass::A, AbcClass::B, AbcClass::B, AbcClass::C, AbcClass::C]);

        let cumulative: Vec<_> = curve.iter().map(|r| r.cumulative_percent).collect();
        assert_eq!(cumulative, vec![dec!(60), dec!(82), dec!(90), dec!(97), dec!(100)]);
        assert_eq!(curve[0].position, 1);
    }

    #[test]
    fn abc_boundaries_are_inclusive() {
        assert_eq!(AbcClass::from_cumulative(dec!(80)), AbcClass::A);
        assert_eq!(AbcClass::from_cumulative(dec!(80.01)), AbcClass::B);
        assert_eq!(AbcClass::from_cumulative(dec!(95)), AbcClass::B);
        assert_eq!(AbcClass::from_cumulative(dec!(95.01)), AbcClass::C);
    }

    #[test]
    fn abc_of_zero_revenue_does_not_divide_by_zero() {
        let curve = abc_curve(&[Decimal::ZERO, Decimal::ZERO]);
        assert!(curve.iter().all(|r| r.class == AbcClass::A));
        assert!(abc_curve(&[]).is_empty());
    }

    #[test]
    fn profitability_summary_margin() {
        let order = |revenue: Decimal, cost: Decimal| OrderProfitability {
            id: Uuid::new_v4(),
            number: "OS2026-0001".into(),
            customer_name: "Cliente".into(),
            closed_at: None,
            services_total: revenue,
            parts_total: Decimal::ZERO,
            revenue,
            cost,
            gross_profit: revenue - cost,
            margin_percent: percent(revenue - cost, revenue),
        };
        let summary = ProfitabilitySummary::from_orders(&[order(dec!(300), dec!(100)), order(dec!(100), dec!(100))]);
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.profit, dec!(200));
        assert_eq!(summary.average_margin, dec!(50));
    }

    #[test]
    fn period_requires_both_ends() {
        let only_start = ReportPeriod { data_inicio: NaiveDate::from_ymd_opt(2026, 1, 1), data_fim: None };
        assert!(only_start.range().is_none());
        assert_eq!(DashboardQuery::default().days(), 30);
    }
}
