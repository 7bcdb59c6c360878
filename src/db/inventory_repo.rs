// src/db/inventory_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        IdlePart, MovementFilter, MovementKindStat, PartMovementStat, PeriodQuery, PurchaseOrder,
        PurchaseOrderItem, PurchaseOrderItemPayload, PurchaseOrderStatus, StockChange,
        StockMovement, StockMovementKind, TurnoverEntry,
    },
};

const PURCHASE_ORDER_COLUMNS: &str =
    "id, number, supplier_id, status, total, expected_on, received_at, notes, created_at";

// Saldo atual de uma peça, lido com a linha travada
#[derive(Debug, Clone, FromRow)]
pub struct PartStock {
    pub id: Uuid,
    pub name: String,
    pub stock_quantity: i32,
}

// Dados de uma movimentação a registrar
#[derive(Debug, Clone, Copy)]
pub struct MovementRecord<'a> {
    pub part_id: Uuid,
    pub kind: StockMovementKind,
    pub quantity: i32,
    pub change: StockChange,
    pub reason: &'a str,
    pub reference_type: Option<&'a str>,
    pub reference_id: Option<Uuid>,
}

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  SALDO
    // =========================================================================

    /// Lê o saldo com `FOR UPDATE`: quem valida e depois movimenta precisa
    /// segurar a linha até o commit.
    pub async fn lock_part_stock<'e, E>(&self, executor: E, part_id: Uuid) -> Result<PartStock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PartStock>(
            "SELECT id, name, stock_quantity FROM parts WHERE id = $1 FOR UPDATE",
        )
        .bind(part_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("part"))
    }

    /// Soma `delta` (com sinal) ao saldo numa única instrução e devolve antes/depois.
    pub async fn apply_stock_delta<'e, E>(
        &self,
        executor: E,
        part_id: Uuid,
        delta: i32,
    ) -> Result<StockChange, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockChange>(
            r#"
            UPDATE parts
            SET stock_quantity = stock_quantity + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING stock_quantity - $2 AS stock_before, stock_quantity AS stock_after
            "#,
        )
        .bind(part_id)
        .bind(delta)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("part"))
    }

    // =========================================================================
    //  MOVIMENTAÇÕES
    // =========================================================================

    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        record: MovementRecord<'_>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            WITH inserted AS (
                INSERT INTO stock_movements (
                    part_id, kind, quantity, stock_before, stock_after, reason, reference_type, reference_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT m.id, m.part_id, p.code AS part_code, p.name AS part_name, m.kind, m.quantity,
                   m.stock_before, m.stock_after, m.reason, m.reference_type, m.reference_id, m.created_at
            FROM inserted m
            JOIN parts p ON p.id = m.part_id
            "#,
        )
        .bind(record.part_id)
        .bind(record.kind)
        .bind(record.quantity)
        .bind(record.change.stock_before)
        .bind(record.change.stock_after)
        .bind(record.reason)
        .bind(record.reference_type)
        .bind(record.reference_id)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        filter: &MovementFilter,
        default_limit: i64,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let limit = filter.limit.filter(|l| *l > 0).unwrap_or(default_limit).min(1000);

        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT m.id, m.part_id, p.code AS part_code, p.name AS part_name, m.kind, m.quantity,
                   m.stock_before, m.stock_after, m.reason, m.reference_type, m.reference_id, m.created_at
            FROM stock_movements m
            JOIN parts p ON p.id = m.part_id
            WHERE ($1::uuid IS NULL OR m.part_id = $1)
              AND ($2::stock_movement_kind IS NULL OR m.kind = $2)
              AND ($3::date IS NULL OR m.created_at::date >= $3)
              AND ($4::date IS NULL OR m.created_at::date <= $4)
            ORDER BY m.created_at DESC
            LIMIT $5
            "#,
        )
        .bind(filter.peca_id)
        .bind(filter.tipo)
        .bind(filter.data_inicio)
        .bind(filter.data_fim)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(movements)
    }

    // =========================================================================
    //  ESTATÍSTICAS E GIRO
    // =========================================================================

    pub async fn movement_stats_by_kind<'e, E>(
        &self,
        executor: E,
        period: &PeriodQuery,
    ) -> Result<Vec<MovementKindStat>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, MovementKindStat>(
            r#"
            SELECT kind, COUNT(*) AS movements, COALESCE(SUM(quantity), 0) AS total_quantity
            FROM stock_movements
            WHERE ($1::date IS NULL OR created_at::date >= $1)
              AND ($2::date IS NULL OR created_at::date <= $2)
            GROUP BY kind
            ORDER BY kind
            "#,
        )
        .bind(period.data_inicio)
        .bind(period.data_fim)
        .fetch_all(executor)
        .await?;

        Ok(stats)
    }

    pub async fn most_moved_parts<'e, E>(
        &self,
        executor: E,
        period: &PeriodQuery,
        limit: i64,
    ) -> Result<Vec<PartMovementStat>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let parts = sqlx::query_as::<_, PartMovementStat>(
            r#"
            SELECT p.id AS part_id, p.code, p.name, p.stock_quantity,
                   COUNT(m.id) AS movements, COALESCE(SUM(m.quantity), 0) AS total_quantity
            FROM stock_movements m
            JOIN parts p ON p.id = m.part_id
            WHERE ($1::date IS NULL OR m.created_at::date >= $1)
              AND ($2::date IS NULL OR m.created_at::date <= $2)
            GROUP BY p.id
            ORDER BY total_quantity DESC, movements DESC
            LIMIT $3
            "#,
        )
        .bind(period.data_inicio)
        .bind(period.data_fim)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(parts)
    }

    /// Peças ativas com saldo e sem movimentação há mais de `idle_days` dias.
    pub async fn idle_parts<'e, E>(&self, executor: E, idle_days: i32) -> Result<Vec<IdlePart>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let parts = sqlx::query_as::<_, IdlePart>(
            r#"
            SELECT p.id AS part_id, p.code, p.name, p.stock_quantity,
                   MAX(m.created_at) AS last_movement_at
            FROM parts p
            LEFT JOIN stock_movements m ON m.part_id = p.id
            WHERE p.is_active AND p.stock_quantity > 0
            GROUP BY p.id
            HAVING MAX(m.created_at) IS NULL
                OR MAX(m.created_at) < NOW() - make_interval(days => $1)
            ORDER BY last_movement_at NULLS FIRST, p.name
            "#,
        )
        .bind(idle_days)
        .fetch_all(executor)
        .await?;

        Ok(parts)
    }

    pub async fn turnover<'e, E>(
        &self,
        executor: E,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TurnoverEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, TurnoverEntry>(
            r#"
            SELECT p.id AS part_id, p.code, p.name, p.stock_quantity, p.cost_price, p.sale_price,
                   COUNT(m.id) FILTER (WHERE m.kind = 'OUT') AS out_movements,
                   COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'OUT'), 0) AS quantity_out,
                   COALESCE(SUM(m.quantity) FILTER (WHERE m.kind IN ('IN', 'RETURN')), 0) AS quantity_in,
                   COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'OUT'), 0) * p.sale_price AS revenue,
                   COALESCE(SUM(m.quantity) FILTER (WHERE m.kind = 'OUT'), 0) * p.cost_price AS cost_sold
            FROM parts p
            JOIN stock_movements m ON m.part_id = p.id
            WHERE m.created_at::date BETWEEN $1 AND $2
            GROUP BY p.id
            ORDER BY quantity_out DESC, p.name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }

    // =========================================================================
    //  ORDENS DE COMPRA
    // =========================================================================

    pub async fn create_purchase_order<'e, E>(
        &self,
        executor: E,
        number: &str,
        supplier_id: Uuid,
        expected_on: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO purchase_orders (number, supplier_id, expected_on, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {PURCHASE_ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(number)
            .bind(supplier_id)
            .bind(expected_on)
            .bind(notes)
            .fetch_one(executor)
            .await?;

        Ok(order)
    }

    pub async fn add_purchase_item<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
        item: &PurchaseOrderItemPayload,
    ) -> Result<PurchaseOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            WITH inserted AS (
                INSERT INTO purchase_order_items (purchase_order_id, part_id, quantity, unit_cost)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT i.id, i.purchase_order_id, i.part_id, p.name AS part_name, i.quantity,
                   i.unit_cost, i.line_total
            FROM inserted i
            JOIN parts p ON p.id = i.part_id
            "#,
        )
        .bind(purchase_order_id)
        .bind(item.part_id)
        .bind(item.quantity)
        .bind(item.unit_cost)
        .fetch_one(executor)
        .await?;

        Ok(item)
    }

    pub async fn refresh_purchase_total<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE purchase_orders
            SET total = (
                SELECT COALESCE(SUM(line_total), 0)
                FROM purchase_order_items WHERE purchase_order_id = $1
            )
            WHERE id = $1
            RETURNING {PURCHASE_ORDER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(purchase_order_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("purchase_order"))
    }

    pub async fn list_purchase_orders<'e, E>(
        &self,
        executor: E,
        status: Option<PurchaseOrderStatus>,
    ) -> Result<Vec<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {PURCHASE_ORDER_COLUMNS}
            FROM purchase_orders
            WHERE ($1::purchase_order_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#
        );

        let orders = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(status)
            .fetch_all(executor)
            .await?;

        Ok(orders)
    }

    pub async fn find_purchase_order<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders WHERE id = $1");

        sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("purchase_order"))
    }

    pub async fn lock_purchase_order<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PURCHASE_ORDER_COLUMNS} FROM purchase_orders WHERE id = $1 FOR UPDATE"
        );

        sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("purchase_order"))
    }

    pub async fn list_purchase_items<'e, E>(
        &self,
        executor: E,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            SELECT i.id, i.purchase_order_id, i.part_id, p.name AS part_name, i.quantity,
                   i.unit_cost, i.line_total
            FROM purchase_order_items i
            JOIN parts p ON p.id = i.part_id
            WHERE i.purchase_order_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(purchase_order_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    pub async fn set_purchase_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: PurchaseOrderStatus,
        received_at: Option<DateTime<Utc>>,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE purchase_orders
            SET status = $2, received_at = COALESCE($3, received_at)
            WHERE id = $1
            RETURNING {PURCHASE_ORDER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(id)
            .bind(status)
            .bind(received_at)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("purchase_order"))
    }

    pub async fn supplier_name<'e, E>(&self, executor: E, supplier_id: Uuid) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, String>("SELECT name FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("supplier"))
    }
}
