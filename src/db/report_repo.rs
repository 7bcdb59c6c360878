// src/db/report_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::reports::{
        CategoryPerformance, CustomerRevenue, MechanicPerformance, OrderProfitability, PartRevenue,
        RankedRevenue, RevenueTotals,
    },
};

// Todos os relatórios consideram apenas OS finalizadas, filtradas pela data
// de fechamento quando o período vem completo.
const CLOSED_BETWEEN: &str = r#"
    ($1::date IS NULL OR so.closed_at::date >= $1)
    AND ($2::date IS NULL OR so.closed_at::date <= $2)
"#;

#[derive(Clone, Default)]
pub struct ReportRepository;

impl ReportRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn profitability<'e, E>(
        &self,
        executor: E,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<OrderProfitability>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (start, end) = range.unzip();
        let sql = format!(
            r#"
            WITH costs AS (
                SELECT sop.service_order_id, SUM(sop.quantity * p.cost_price) AS cost
                FROM service_order_parts sop
                JOIN parts p ON p.id = sop.part_id
                GROUP BY sop.service_order_id
            )
            SELECT so.id, so.number, c.name AS customer_name, so.closed_at,
                   so.services_total, so.parts_total,
                   so.services_total + so.parts_total AS revenue,
                   COALESCE(k.cost, 0) AS cost,
                   so.services_total + so.parts_total - COALESCE(k.cost, 0) AS gross_profit,
                   CASE WHEN so.services_total + so.parts_total = 0 THEN 0
                        ELSE ROUND((so.services_total + so.parts_total - COALESCE(k.cost, 0)) * 100
                                   / (so.services_total + so.parts_total), 2)
                   END AS margin_percent
            FROM service_orders so
            JOIN customers c ON c.id = so.customer_id
            LEFT JOIN costs k ON k.service_order_id = so.id
            WHERE so.status = 'FINALIZED' AND {CLOSED_BETWEEN}
            ORDER BY so.closed_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, OrderProfitability>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn category_performance<'e, E>(
        &self,
        executor: E,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<CategoryPerformance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (start, end) = range.unzip();
        let sql = format!(
            r#"
            SELECT COALESCE(sc.name, 'Sem categoria') AS category,
                   COUNT(DISTINCT so.id) AS total_orders,
                   COUNT(sos.id) AS total_services,
                   COALESCE(SUM(sos.quantity), 0) AS service_quantity,
                   COALESCE(SUM(sos.line_total), 0) AS revenue,
                   ROUND(COALESCE(AVG(sos.line_total), 0), 2) AS average_ticket
            FROM service_order_services sos
            JOIN service_orders so ON so.id = sos.service_order_id
            JOIN service_types st ON st.id = sos.service_type_id
            LEFT JOIN service_categories sc ON sc.id = st.category_id
            WHERE so.status = 'FINALIZED' AND {CLOSED_BETWEEN}
            GROUP BY 1
            ORDER BY revenue DESC
            "#
        );

        let rows = sqlx::query_as::<_, CategoryPerformance>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    /// Mecânicos ativos com o volume de OS abertas no período (todas as OS, não só as finalizadas).
    pub async fn mechanic_performance<'e, E>(
        &self,
        executor: E,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<MechanicPerformance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (start, end) = range.unzip();
        let rows = sqlx::query_as::<_, MechanicPerformance>(
            r#"
            SELECT m.id AS mechanic_id, m.name AS mechanic,
                   COUNT(so.id) AS total_orders,
                   COUNT(so.id) FILTER (WHERE so.status = 'FINALIZED') AS finalized_orders,
                   COALESCE(SUM(so.total) FILTER (WHERE so.status = 'FINALIZED'), 0) AS revenue,
                   ROUND(AVG(so.total) FILTER (WHERE so.status = 'FINALIZED'), 2) AS average_ticket,
                   ROUND(AVG(EXTRACT(EPOCH FROM so.closed_at - so.opened_at) / 86400)
                         FILTER (WHERE so.status = 'FINALIZED'), 1) AS average_days
            FROM mechanics m
            LEFT JOIN service_orders so ON so.mechanic_id = m.id
                 AND ($1::date IS NULL OR so.opened_at::date >= $1)
                 AND ($2::date IS NULL OR so.opened_at::date <= $2)
            WHERE m.is_active
            GROUP BY m.id
            ORDER BY revenue DESC, m.name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn customer_revenue<'e, E>(
        &self,
        executor: E,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<CustomerRevenue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (start, end) = range.unzip();
        let sql = format!(
            r#"
            SELECT c.id, c.name, COUNT(so.id) AS total_orders,
                   SUM(so.total) AS revenue, ROUND(AVG(so.total), 2) AS average_ticket
            FROM customers c
            JOIN service_orders so ON so.customer_id = c.id
            WHERE so.status = 'FINALIZED' AND {CLOSED_BETWEEN}
            GROUP BY c.id
            ORDER BY revenue DESC, c.name
            "#
        );

        let rows = sqlx::query_as::<_, CustomerRevenue>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn part_revenue<'e, E>(
        &self,
        executor: E,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<PartRevenue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (start, end) = range.unzip();
        let sql = format!(
            r#"
            SELECT p.id, p.code, p.name,
                   COUNT(DISTINCT so.id) AS total_orders,
                   SUM(sop.quantity) AS quantity_sold,
                   SUM(sop.line_total) AS revenue,
                   SUM(sop.quantity * p.cost_price) AS cost,
                   SUM(sop.line_total) - SUM(sop.quantity * p.cost_price) AS profit
            FROM parts p
            JOIN service_order_parts sop ON sop.part_id = p.id
            JOIN service_orders so ON so.id = sop.service_order_id
            WHERE so.status = 'FINALIZED' AND {CLOSED_BETWEEN}
            GROUP BY p.id
            ORDER BY revenue DESC, p.name
            "#
        );

        let rows = sqlx::query_as::<_, PartRevenue>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    // =========================================================================
    //  DASHBOARD
    // =========================================================================

    pub async fn revenue_since<'e, E>(&self, executor: E, since: NaiveDate) -> Result<RevenueTotals, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, RevenueTotals>(
            r#"
            SELECT COUNT(*) AS total_orders,
                   COALESCE(SUM(total), 0) AS revenue,
                   ROUND(AVG(total), 2) AS average_ticket
            FROM service_orders
            WHERE status = 'FINALIZED' AND closed_at::date >= $1
            "#,
        )
        .bind(since)
        .fetch_one(executor)
        .await?;

        Ok(totals)
    }

    pub async fn top_categories_since<'e, E>(
        &self,
        executor: E,
        since: NaiveDate,
        limit: i64,
    ) -> Result<Vec<RankedRevenue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, RankedRevenue>(
            r#"
            SELECT COALESCE(sc.name, 'Sem categoria') AS name,
                   COUNT(DISTINCT so.id) AS total_orders,
                   SUM(sos.line_total) AS revenue
            FROM service_order_services sos
            JOIN service_orders so ON so.id = sos.service_order_id
            JOIN service_types st ON st.id = sos.service_type_id
            LEFT JOIN service_categories sc ON sc.id = st.category_id
            WHERE so.status = 'FINALIZED' AND so.closed_at::date >= $1
            GROUP BY 1
            ORDER BY revenue DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn top_customers_since<'e, E>(
        &self,
        executor: E,
        since: NaiveDate,
        limit: i64,
    ) -> Result<Vec<RankedRevenue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, RankedRevenue>(
            r#"
            SELECT c.name, COUNT(so.id) AS total_orders, SUM(so.total) AS revenue
            FROM service_orders so
            JOIN customers c ON c.id = so.customer_id
            WHERE so.status = 'FINALIZED' AND so.closed_at::date >= $1
            GROUP BY c.id
            ORDER BY revenue DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}
