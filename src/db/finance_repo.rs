// src/db/finance_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{
        Account, CashFlowDayTotals, CashFlowFilter, CashFlowKind, MonthCashFlow, Payable,
        PayableFilter, Receivable, ReceivableFilter, TitleTotals,
    },
};

// `source` é a tabela ou a CTE com as linhas de receivables
fn receivable_select(source: &str) -> String {
    format!(
        r#"
        SELECT r.id, r.description, r.customer_id, c.name AS customer_name,
               r.service_order_id, so.number AS service_order_number,
               r.account_id, a.name AS account_name, r.amount, r.issued_on, r.due_on,
               r.received_on, r.status, r.payment_method, r.notes, r.created_at,
               (r.status = 'OPEN' AND r.due_on < CURRENT_DATE) AS overdue,
               CASE WHEN r.status = 'OPEN' AND r.due_on < CURRENT_DATE
                    THEN CURRENT_DATE - r.due_on ELSE 0 END AS days_overdue
        FROM {source} r
        LEFT JOIN customers c ON c.id = r.customer_id
        LEFT JOIN service_orders so ON so.id = r.service_order_id
        LEFT JOIN chart_of_accounts a ON a.id = r.account_id
        "#
    )
}

fn payable_select(source: &str) -> String {
    format!(
        r#"
        SELECT p.id, p.description, p.supplier_id, s.name AS supplier_name, p.purchase_order_id,
               p.account_id, a.name AS account_name, p.amount, p.issued_on, p.due_on,
               p.paid_on, p.status, p.payment_method, p.notes, p.created_at,
               (p.status = 'OPEN' AND p.due_on < CURRENT_DATE) AS overdue,
               CASE WHEN p.status = 'OPEN' AND p.due_on < CURRENT_DATE
                    THEN CURRENT_DATE - p.due_on ELSE 0 END AS days_overdue
        FROM {source} p
        LEFT JOIN suppliers s ON s.id = p.supplier_id
        LEFT JOIN chart_of_accounts a ON a.id = p.account_id
        "#
    )
}

#[derive(Debug, Clone)]
pub struct NewReceivable {
    pub description: String,
    pub customer_id: Option<Uuid>,
    pub service_order_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount: Decimal,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPayable {
    pub description: String,
    pub supplier_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub amount: Decimal,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCashFlowEntry<'a> {
    pub kind: CashFlowKind,
    pub description: &'a str,
    pub amount: Decimal,
    pub entry_date: NaiveDate,
    pub account_id: Option<Uuid>,
    pub receivable_id: Option<Uuid>,
    pub payable_id: Option<Uuid>,
}

#[derive(Clone, Default)]
pub struct FinanceRepository;

impl FinanceRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  PLANO DE CONTAS
    // =========================================================================

    pub async fn list_accounts<'e, E>(&self, executor: E) -> Result<Vec<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT id, code, name, kind, is_active FROM chart_of_accounts ORDER BY code",
        )
        .fetch_all(executor)
        .await?;

        Ok(accounts)
    }

    pub async fn find_account_by_code<'e, E>(&self, executor: E, code: &str) -> Result<Account, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Account>(
            "SELECT id, code, name, kind, is_active FROM chart_of_accounts WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("account"))
    }

    // =========================================================================
    //  CONTAS A RECEBER
    // =========================================================================

    pub async fn list_receivables<'e, E>(
        &self,
        executor: E,
        filter: &ReceivableFilter,
    ) -> Result<Vec<Receivable>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT * FROM ({select}) listed
            WHERE ($1::receivable_status IS NULL OR status = $1)
              AND ($2::bool IS NULL OR overdue = $2)
              AND ($3::date IS NULL OR due_on >= $3)
              AND ($4::date IS NULL OR due_on <= $4)
            ORDER BY due_on, created_at
            "#,
            select = receivable_select("receivables"),
        );

        let receivables = sqlx::query_as::<_, Receivable>(&sql)
            .bind(filter.status)
            .bind(filter.atrasadas)
            .bind(filter.data_inicio)
            .bind(filter.data_fim)
            .fetch_all(executor)
            .await?;

        Ok(receivables)
    }

    pub async fn find_receivable<'e, E>(&self, executor: E, id: Uuid) -> Result<Receivable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE r.id = $1", receivable_select("receivables"));

        sqlx::query_as::<_, Receivable>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("receivable"))
    }

    pub async fn find_receivable_by_order<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
    ) -> Result<Option<Receivable>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE r.service_order_id = $1", receivable_select("receivables"));

        let receivable = sqlx::query_as::<_, Receivable>(&sql)
            .bind(service_order_id)
            .fetch_optional(executor)
            .await?;

        Ok(receivable)
    }

    pub async fn create_receivable<'e, E>(
        &self,
        executor: E,
        new: &NewReceivable,
    ) -> Result<Receivable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO receivables (
                    description, customer_id, service_order_id, account_id, amount, issued_on, due_on, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            {select}
            "#,
            select = receivable_select("inserted"),
        );

        let receivable = sqlx::query_as::<_, Receivable>(&sql)
            .bind(&new.description)
            .bind(new.customer_id)
            .bind(new.service_order_id)
            .bind(new.account_id)
            .bind(new.amount)
            .bind(new.issued_on)
            .bind(new.due_on)
            .bind(&new.notes)
            .fetch_one(executor)
            .await?;

        Ok(receivable)
    }

    pub async fn settle_receivable<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        received_on: NaiveDate,
        payment_method: Option<&str>,
    ) -> Result<Receivable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE receivables
                SET status = 'RECEIVED', received_on = $2,
                    payment_method = COALESCE($3, payment_method)
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = receivable_select("updated"),
        );

        sqlx::query_as::<_, Receivable>(&sql)
            .bind(id)
            .bind(received_on)
            .bind(payment_method)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("receivable"))
    }

    // =========================================================================
    //  CONTAS A PAGAR
    // =========================================================================

    pub async fn list_payables<'e, E>(
        &self,
        executor: E,
        filter: &PayableFilter,
    ) -> Result<Vec<Payable>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT * FROM ({select}) listed
            WHERE ($1::payable_status IS NULL OR status = $1)
              AND ($2::bool IS NULL OR overdue = $2)
              AND ($3::date IS NULL OR due_on >= $3)
              AND ($4::date IS NULL OR due_on <= $4)
            ORDER BY due_on, created_at
            "#,
            select = payable_select("payables"),
        );

        let payables = sqlx::query_as::<_, Payable>(&sql)
            .bind(filter.status)
            .bind(filter.atrasadas)
            .bind(filter.data_inicio)
            .bind(filter.data_fim)
            .fetch_all(executor)
            .await?;

        Ok(payables)
    }

    pub async fn find_payable<'e, E>(&self, executor: E, id: Uuid) -> Result<Payable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE p.id = $1", payable_select("payables"));

        sqlx::query_as::<_, Payable>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("payable"))
    }

    pub async fn create_payable<'e, E>(&self, executor: E, new: &NewPayable) -> Result<Payable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO payables (
                    description, supplier_id, purchase_order_id, account_id, amount, issued_on, due_on, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            {select}
            "#,
            select = payable_select("inserted"),
        );

        let payable = sqlx::query_as::<_, Payable>(&sql)
            .bind(&new.description)
            .bind(new.supplier_id)
            .bind(new.purchase_order_id)
            .bind(new.account_id)
            .bind(new.amount)
            .bind(new.issued_on)
            .bind(new.due_on)
            .bind(&new.notes)
            .fetch_one(executor)
            .await?;

        Ok(payable)
    }

    pub async fn settle_payable<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        paid_on: NaiveDate,
        payment_method: Option<&str>,
    ) -> Result<Payable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE payables
                SET status = 'PAID', paid_on = $2, payment_method = COALESCE($3, payment_method)
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = payable_select("updated"),
        );

        sqlx::query_as::<_, Payable>(&sql)
            .bind(id)
            .bind(paid_on)
            .bind(payment_method)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("payable"))
    }

    // =========================================================================
    //  FLUXO DE CAIXA
    // =========================================================================

    pub async fn insert_cash_flow<'e, E>(
        &self,
        executor: E,
        entry: &NewCashFlowEntry<'_>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO cash_flow_entries (
                kind, description, amount, entry_date, account_id, receivable_id, payable_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.kind)
        .bind(entry.description)
        .bind(entry.amount)
        .bind(entry.entry_date)
        .bind(entry.account_id)
        .bind(entry.receivable_id)
        .bind(entry.payable_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn cash_flow_by_day<'e, E>(
        &self,
        executor: E,
        filter: &CashFlowFilter,
    ) -> Result<Vec<CashFlowDayTotals>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let days = sqlx::query_as::<_, CashFlowDayTotals>(
            r#"
            SELECT entry_date,
                   COALESCE(SUM(amount) FILTER (WHERE kind = 'INFLOW'), 0) AS inflow,
                   COALESCE(SUM(amount) FILTER (WHERE kind = 'OUTFLOW'), 0) AS outflow
            FROM cash_flow_entries
            WHERE ($1::date IS NULL OR entry_date >= $1)
              AND ($2::date IS NULL OR entry_date <= $2)
            GROUP BY entry_date
            ORDER BY entry_date
            "#,
        )
        .bind(filter.data_inicio)
        .bind(filter.data_fim)
        .fetch_all(executor)
        .await?;

        Ok(days)
    }

    // =========================================================================
    //  RESUMO
    // =========================================================================

    pub async fn receivable_totals<'e, E>(&self, executor: E) -> Result<TitleTotals, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, TitleTotals>(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'OPEN') AS open_count,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'OPEN'), 0) AS open_amount,
                   COUNT(*) FILTER (WHERE status = 'OPEN' AND due_on < CURRENT_DATE) AS overdue_count,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'OPEN' AND due_on < CURRENT_DATE), 0) AS overdue_amount
            FROM receivables
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(totals)
    }

    pub async fn payable_totals<'e, E>(&self, executor: E) -> Result<TitleTotals, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, TitleTotals>(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'OPEN') AS open_count,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'OPEN'), 0) AS open_amount,
                   COUNT(*) FILTER (WHERE status = 'OPEN' AND due_on < CURRENT_DATE) AS overdue_count,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'OPEN' AND due_on < CURRENT_DATE), 0) AS overdue_amount
            FROM payables
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(totals)
    }

    pub async fn month_cash_flow<'e, E>(&self, executor: E) -> Result<MonthCashFlow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let month = sqlx::query_as::<_, MonthCashFlow>(
            r#"
            SELECT inflow, outflow, inflow - outflow AS balance
            FROM (
                SELECT COALESCE(SUM(amount) FILTER (WHERE kind = 'INFLOW'), 0) AS inflow,
                       COALESCE(SUM(amount) FILTER (WHERE kind = 'OUTFLOW'), 0) AS outflow
                FROM cash_flow_entries
                WHERE date_trunc('month', entry_date) = date_trunc('month', CURRENT_DATE)
            ) month
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(month)
    }
}
