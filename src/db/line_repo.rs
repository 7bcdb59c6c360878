// src/db/line_repo.rs

use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{AddPartLinePayload, AddServiceLinePayload, PartLine, ServiceLine},
};

// OS e orçamento têm linhas com o mesmo formato, só muda a tabela
pub struct LineTables {
    pub document: &'static str,
    pub services: &'static str,
    pub parts: &'static str,
    pub owner: &'static str,
    pub service_not_found: &'static str,
    pub part_not_found: &'static str,
}

pub const ORDER_LINES: LineTables = LineTables {
    document: "service_orders",
    services: "service_order_services",
    parts: "service_order_parts",
    owner: "service_order_id",
    service_not_found: "service_line",
    part_not_found: "part_line",
};

pub const QUOTE_LINES: LineTables = LineTables {
    document: "quotes",
    services: "quote_services",
    parts: "quote_parts",
    owner: "quote_id",
    service_not_found: "quote_line",
    part_not_found: "quote_line",
};

#[derive(Debug, Clone, Copy, FromRow)]
pub struct RemovedPartLine {
    pub part_id: Uuid,
    pub quantity: i32,
}

#[derive(Clone, Default)]
pub struct LineRepository;

impl LineRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_services<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
    ) -> Result<Vec<ServiceLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT l.id, l.{owner} AS document_id, l.service_type_id, st.name AS service_name,
                   sc.name AS category_name, l.mechanic_id, l.description, l.quantity,
                   l.unit_price, l.line_total, l.created_at
            FROM {services} l
            JOIN service_types st ON st.id = l.service_type_id
            LEFT JOIN service_categories sc ON sc.id = st.category_id
            WHERE l.{owner} = $1
            ORDER BY l.created_at
            "#,
            owner = tables.owner,
            services = tables.services,
        );

        let lines = sqlx::query_as::<_, ServiceLine>(&sql)
            .bind(document_id)
            .fetch_all(executor)
            .await?;

        Ok(lines)
    }

    pub async fn list_parts<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
    ) -> Result<Vec<PartLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT l.id, l.{owner} AS document_id, l.part_id, p.code AS part_code,
                   p.name AS part_name, l.quantity, l.unit_price, l.line_total, l.created_at
            FROM {parts} l
            JOIN parts p ON p.id = l.part_id
            WHERE l.{owner} = $1
            ORDER BY l.created_at
            "#,
            owner = tables.owner,
            parts = tables.parts,
        );

        let lines = sqlx::query_as::<_, PartLine>(&sql)
            .bind(document_id)
            .fetch_all(executor)
            .await?;

        Ok(lines)
    }

    pub async fn insert_service<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
        line: &AddServiceLinePayload,
    ) -> Result<ServiceLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // CTE para devolver a linha já com os nomes do catálogo
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO {services} ({owner}, service_type_id, mechanic_id, description, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT l.id, l.{owner} AS document_id, l.service_type_id, st.name AS service_name,
                   sc.name AS category_name, l.mechanic_id, l.description, l.quantity,
                   l.unit_price, l.line_total, l.created_at
            FROM inserted l
            JOIN service_types st ON st.id = l.service_type_id
            LEFT JOIN service_categories sc ON sc.id = st.category_id
            "#,
            owner = tables.owner,
            services = tables.services,
        );

        let line = sqlx::query_as::<_, ServiceLine>(&sql)
            .bind(document_id)
            .bind(line.service_type_id)
            .bind(line.mechanic_id)
            .bind(&line.description)
            .bind(line.quantity.unwrap_or(1))
            .bind(line.unit_price)
            .fetch_one(executor)
            .await?;

        Ok(line)
    }

    pub async fn insert_part<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
        line: &AddPartLinePayload,
    ) -> Result<PartLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO {parts} ({owner}, part_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT l.id, l.{owner} AS document_id, l.part_id, p.code AS part_code,
                   p.name AS part_name, l.quantity, l.unit_price, l.line_total, l.created_at
            FROM inserted l
            JOIN parts p ON p.id = l.part_id
            "#,
            owner = tables.owner,
            parts = tables.parts,
        );

        let line = sqlx::query_as::<_, PartLine>(&sql)
            .bind(document_id)
            .bind(line.part_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(executor)
            .await?;

        Ok(line)
    }

    pub async fn delete_service<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
        line_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "DELETE FROM {services} WHERE id = $1 AND {owner} = $2",
            services = tables.services,
            owner = tables.owner,
        );

        let result = sqlx::query(&sql)
            .bind(line_id)
            .bind(document_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(tables.service_not_found));
        }
        Ok(())
    }

    /// Remove a linha e devolve peça e quantidade, para o chamador decidir
    /// se o estoque precisa voltar.
    pub async fn delete_part<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
        line_id: Uuid,
    ) -> Result<RemovedPartLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "DELETE FROM {parts} WHERE id = $1 AND {owner} = $2 RETURNING part_id, quantity",
            parts = tables.parts,
            owner = tables.owner,
        );

        sqlx::query_as::<_, RemovedPartLine>(&sql)
            .bind(line_id)
            .bind(document_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound(tables.part_not_found))
    }

    /// Recalcula subtotais e total a partir das linhas. Único caminho que
    /// grava `services_total`, `parts_total` e `total`.
    pub async fn recompute_totals<'e, E>(
        &self,
        executor: E,
        tables: &LineTables,
        document_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH sums AS (
                SELECT
                    (SELECT COALESCE(SUM(line_total), 0) FROM {services} WHERE {owner} = $1) AS services,
                    (SELECT COALESCE(SUM(line_total), 0) FROM {parts} WHERE {owner} = $1) AS parts
            )
            UPDATE {document} d
            SET services_total = sums.services,
                parts_total = sums.parts,
                total = sums.services + sums.parts - d.discount,
                updated_at = NOW()
            FROM sums
            WHERE d.id = $1
            "#,
            document = tables.document,
            services = tables.services,
            parts = tables.parts,
            owner = tables.owner,
        );

        sqlx::query(&sql).bind(document_id).execute(executor).await?;
        Ok(())
    }
}
