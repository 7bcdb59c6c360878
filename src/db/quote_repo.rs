// src/db/quote_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        operations::PartyInfo,
        quotes::{Quote, QuoteFilter, QuoteStatus, QuoteStatusStat, QuoteSummary, UpdateQuotePayload},
    },
};

const QUOTE_COLUMNS: &str = "id, number, customer_id, vehicle_id, status, problem_description, \
     notes, valid_until, services_total, parts_total, discount, total, service_order_id, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewQuote {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub problem_description: Option<String>,
    pub notes: Option<String>,
    pub valid_until: NaiveDate,
    pub discount: Decimal,
}

#[derive(Clone, Default)]
pub struct QuoteRepository;

impl QuoteRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_quote<'e, E>(
        &self,
        executor: E,
        number: &str,
        new: &NewQuote,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO quotes (number, customer_id, vehicle_id, problem_description, notes, valid_until, discount, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0 - $7)
            RETURNING {QUOTE_COLUMNS}
            "#
        );

        let quote = sqlx::query_as::<_, Quote>(&sql)
            .bind(number)
            .bind(new.customer_id)
            .bind(new.vehicle_id)
            .bind(&new.problem_description)
            .bind(&new.notes)
            .bind(new.valid_until)
            .bind(new.discount)
            .fetch_one(executor)
            .await?;

        Ok(quote)
    }

    pub async fn find_quote<'e, E>(&self, executor: E, id: Uuid) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1");

        sqlx::query_as::<_, Quote>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("quote"))
    }

    pub async fn lock_quote<'e, E>(&self, executor: E, id: Uuid) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, Quote>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("quote"))
    }

    /// `expired` é derivado: PENDING/SENT com validade anterior a hoje.
    pub async fn list_quotes<'e, E>(
        &self,
        executor: E,
        filter: &QuoteFilter,
    ) -> Result<Vec<QuoteSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotes = sqlx::query_as::<_, QuoteSummary>(
            r#"
            SELECT * FROM (
                SELECT q.id, q.number, q.status, q.customer_id, c.name AS customer_name,
                       c.phone AS customer_phone, q.vehicle_id, v.plate,
                       v.make || ' ' || v.model AS vehicle_description, q.total, q.valid_until,
                       q.service_order_id, q.created_at,
                       (q.status IN ('PENDING', 'SENT') AND q.valid_until < CURRENT_DATE) AS expired
                FROM quotes q
                JOIN customers c ON c.id = q.customer_id
                JOIN vehicles v ON v.id = q.vehicle_id
                WHERE ($1::quote_status IS NULL OR q.status = $1)
                  AND ($2::uuid IS NULL OR q.customer_id = $2)
            ) listed
            WHERE ($3::bool IS NULL OR expired = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.cliente_id)
        .bind(filter.expirados)
        .fetch_all(executor)
        .await?;

        Ok(quotes)
    }

    pub async fn statistics_by_status<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<QuoteStatusStat>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, QuoteStatusStat>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(total), 0) AS total_value
            FROM quotes
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(stats)
    }

    pub async fn find_party<'e, E>(&self, executor: E, quote_id: Uuid) -> Result<PartyInfo, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PartyInfo>(
            r#"
            SELECT c.name AS customer_name, c.phone AS customer_phone, c.email AS customer_email,
                   v.plate, v.make, v.model, v.year AS vehicle_year, NULL::text AS mechanic_name
            FROM quotes q
            JOIN customers c ON c.id = q.customer_id
            JOIN vehicles v ON v.id = q.vehicle_id
            WHERE q.id = $1
            "#,
        )
        .bind(quote_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("quote"))
    }

    pub async fn update_quote<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateQuotePayload,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE quotes
            SET problem_description = COALESCE($2, problem_description),
                notes = COALESCE($3, notes),
                valid_until = COALESCE($4, valid_until),
                discount = COALESCE($5, discount),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {QUOTE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Quote>(&sql)
            .bind(id)
            .bind(&payload.problem_description)
            .bind(&payload.notes)
            .bind(payload.valid_until)
            .bind(payload.discount)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("quote"))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: QuoteStatus,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE quotes SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {QUOTE_COLUMNS}"
        );

        sqlx::query_as::<_, Quote>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("quote"))
    }

    pub async fn mark_converted<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        order_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE quotes
            SET status = 'CONVERTED', service_order_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(order_id)
        .execute(executor)
        .await?;

        Ok(())
    }
}
