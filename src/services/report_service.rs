// src/services/report_service.rs

use chrono::{Days, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::error::AppError,
    db::ReportRepository,
    models::reports::{
        abc_curve, percent, CategoryPerformance, CustomerAbcEntry, CustomerRevenue, DashboardQuery,
        MechanicPerformance, PartAbcEntry, PartRevenue, ProfitabilityReport, ProfitabilitySummary,
        ReportDashboard, ReportPeriod,
    },
};

const DASHBOARD_TOP: i64 = 5;

/// Preenche a participação de cada categoria no faturamento total.
pub fn with_revenue_share(mut categories: Vec<CategoryPerformance>) -> Vec<CategoryPerformance> {
    let total: Decimal = categories.iter().map(|c| c.revenue).sum();
    for category in &mut categories {
        category.revenue_share = percent(category.revenue, total);
    }
    categories
}

pub fn rank_customers(customers: Vec<CustomerRevenue>) -> Vec<CustomerAbcEntry> {
    let values: Vec<Decimal> = customers.iter().map(|c| c.revenue).collect();
    customers
        .into_iter()
        .zip(abc_curve(&values))
        .map(|(customer, rank)| CustomerAbcEntry { customer, rank })
        .collect()
}

pub fn rank_parts(parts: Vec<PartRevenue>) -> Vec<PartAbcEntry> {
    let values: Vec<Decimal> = parts.iter().map(|p| p.revenue).collect();
    parts
        .into_iter()
        .zip(abc_curve(&values))
        .map(|(part, rank)| {
            let profit_margin = percent(part.profit, part.revenue);
            PartAbcEntry { part, rank, profit_margin }
        })
        .collect()
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository) -> Self {
        Self { repo }
    }

    pub async fn profitability<'e, E>(
        &self,
        executor: E,
        period: &ReportPeriod,
    ) -> Result<ProfitabilityReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = self.repo.profitability(executor, period.range()).await?;
        let summary = ProfitabilitySummary::from_orders(&details);
        Ok(ProfitabilityReport { details, summary })
    }

    pub async fn categories<'e, E>(
        &self,
        executor: E,
        period: &ReportPeriod,
    ) -> Result<Vec<CategoryPerformance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = self.repo.category_performance(executor, period.range()).await?;
        Ok(with_revenue_share(rows))
    }

    pub async fn mechanics<'e, E>(
        &self,
        executor: E,
        period: &ReportPeriod,
    ) -> Result<Vec<MechanicPerformance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.mechanic_performance(executor, period.range()).await
    }

    pub async fn abc_customers<'e, E>(
        &self,
        executor: E,
        period: &ReportPeriod,
    ) -> Result<Vec<CustomerAbcEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = self.repo.customer_revenue(executor, period.range()).await?;
        Ok(rank_customers(rows))
    }

    pub async fn abc_parts<'e, E>(
        &self,
        executor: E,
        period: &ReportPeriod,
    ) -> Result<Vec<PartAbcEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = self.repo.part_revenue(executor, period.range()).await?;
        Ok(rank_parts(rows))
    }

    pub async fn dashboard<'e, E>(&self, executor: E, query: &DashboardQuery) -> Result<ReportDashboard, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let period_days = query.days();
        let today = Utc::now().date_naive();
        let since = today
            .checked_sub_days(Days::new(period_days.unsigned_abs()))
            .unwrap_or(today);

        let revenue = self.repo.revenue_since(&mut *conn, since).await?;
        let orders = self.repo.profitability(&mut *conn, Some((since, today))).await?;
        let top_categories = self.repo.top_categories_since(&mut *conn, since, DASHBOARD_TOP).await?;
        let top_customers = self.repo.top_customers_since(&mut *conn, since, DASHBOARD_TOP).await?;

        Ok(ReportDashboard {
            period_days,
            since,
            revenue,
            profitability: ProfitabilitySummary::from_orders(&orders),
            top_categories,
            top_customers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reports::AbcClass;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn category(name: &str, revenue: Decimal) -> CategoryPerformance {
        CategoryPerformance {
            category: name.into(),
            total_orders: 1,
            total_services: 1,
            service_quantity: 1,
            revenue,
            average_ticket: revenue,
            revenue_share: Decimal::ZERO,
        }
    }

    #[test]
    fn category_share_sums_to_hundred() {
        let rows = with_revenue_share(vec![category("Motor", dec!(750)), category("Freios", dec!(250))]);
        assert_eq!(rows[0].revenue_share, dec!(75));
        assert_eq!(rows[1].revenue_share, dec!(25));
    }

    #[test]
    fn parts_carry_profit_margin_and_class() {
        let part = |name: &str, revenue: Decimal, cost: Decimal| PartRevenue {
            id: Uuid::new_v4(),
            code: name.to_uppercase(),
            name: name.into(),
            total_orders: 1,
            quantity_sold: 1,
            revenue,
            cost,
            profit: revenue - cost,
        };

        let ranked = rank_parts(vec![
            part("filtro", dec!(900), dec!(600)),
            part("vela", dec!(100), dec!(100)),
        ]);

        assert_eq!(ranked[0].rank.class, AbcClass::B);
        assert_eq!(ranked[0].profit_margin, dec!(33.33));
        assert_eq!(ranked[1].rank.class, AbcClass::C);
        assert_eq!(ranked[1].profit_margin, Decimal::ZERO);
        assert_eq!(ranked[1].rank.position, 2);
    }
}
