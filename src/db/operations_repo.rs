// src/db/operations_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{
        ChecklistItem, ChecklistStatus, Communication, CommunicationChannel, PartyInfo,
        ServiceOrder, ServiceOrderFilter, ServiceOrderStatus, ServiceOrderSummary,
        UpdateServiceOrderPayload,
    },
};

const ORDER_COLUMNS: &str = "id, number, customer_id, vehicle_id, mechanic_id, quote_id, status, \
     problem_reported, diagnosis, notes, odometer_in, services_total, parts_total, discount, total, \
     opened_at, expected_on, closed_at, created_at, updated_at";

// Listagem com cliente, veículo e mecânico. `days_open` conta até hoje ou até o fechamento.
const SUMMARY_SELECT: &str = r#"
    SELECT so.id, so.number, so.status, so.customer_id, c.name AS customer_name,
           c.phone AS customer_phone, so.vehicle_id, v.plate,
           v.make || ' ' || v.model AS vehicle_description, m.name AS mechanic_name,
           so.total, so.opened_at, so.expected_on, so.closed_at,
           (COALESCE(so.closed_at, NOW())::date - so.opened_at::date) AS days_open
    FROM service_orders so
    JOIN customers c ON c.id = so.customer_id
    JOIN vehicles v ON v.id = so.vehicle_id
    LEFT JOIN mechanics m ON m.id = so.mechanic_id
"#;

const FILTER_WHERE: &str = r#"
    WHERE ($1::service_order_status IS NULL OR so.status = $1)
      AND ($2::uuid IS NULL OR so.customer_id = $2)
      AND ($3::uuid IS NULL OR so.vehicle_id = $3)
      AND ($4::date IS NULL OR so.opened_at::date >= $4)
      AND ($5::date IS NULL OR so.opened_at::date <= $5)
"#;

// Dados para abrir uma OS (manual ou vinda de orçamento)
#[derive(Debug, Clone)]
pub struct NewServiceOrder {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub quote_id: Option<Uuid>,
    pub problem_reported: Option<String>,
    pub notes: Option<String>,
    pub odometer_in: Option<i32>,
    pub expected_on: Option<NaiveDate>,
    pub discount: Decimal,
}

#[derive(Clone, Default)]
pub struct OperationsRepository;

impl OperationsRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  ORDENS DE SERVIÇO
    // =========================================================================

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        number: &str,
        new: &NewServiceOrder,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO service_orders (
                number, customer_id, vehicle_id, mechanic_id, quote_id,
                problem_reported, notes, odometer_in, expected_on, discount, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0 - $10)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let order = sqlx::query_as::<_, ServiceOrder>(&sql)
            .bind(number)
            .bind(new.customer_id)
            .bind(new.vehicle_id)
            .bind(new.mechanic_id)
            .bind(new.quote_id)
            .bind(&new.problem_reported)
            .bind(&new.notes)
            .bind(new.odometer_in)
            .bind(new.expected_on)
            .bind(new.discount)
            .fetch_one(executor)
            .await?;

        Ok(order)
    }

    pub async fn find_order<'e, E>(&self, executor: E, id: Uuid) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM service_orders WHERE id = $1");

        sqlx::query_as::<_, ServiceOrder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("service_order"))
    }

    /// Lê a OS travando a linha até o fim da transação.
    pub async fn lock_order<'e, E>(&self, executor: E, id: Uuid) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM service_orders WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, ServiceOrder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("service_order"))
    }

    pub async fn list_orders<'e, E>(
        &self,
        executor: E,
        filter: &ServiceOrderFilter,
    ) -> Result<Vec<ServiceOrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{SUMMARY_SELECT} {FILTER_WHERE} ORDER BY so.opened_at DESC LIMIT $6 OFFSET $7");

        let orders = sqlx::query_as::<_, ServiceOrderSummary>(&sql)
            .bind(filter.status)
            .bind(filter.cliente_id)
            .bind(filter.veiculo_id)
            .bind(filter.data_inicio)
            .bind(filter.data_fim)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(executor)
            .await?;

        Ok(orders)
    }

    pub async fn count_orders<'e, E>(
        &self,
        executor: E,
        filter: &ServiceOrderFilter,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT COUNT(*) FROM service_orders so {FILTER_WHERE}");

        let total: i64 = sqlx::query_scalar(&sql)
            .bind(filter.status)
            .bind(filter.cliente_id)
            .bind(filter.veiculo_id)
            .bind(filter.data_inicio)
            .bind(filter.data_fim)
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    // Ordens ainda em andamento, mais antigas primeiro (Kanban)
    pub async fn list_open_orders<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<ServiceOrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{SUMMARY_SELECT} WHERE so.status NOT IN ('FINALIZED', 'CANCELLED') ORDER BY so.opened_at"
        );

        let orders = sqlx::query_as::<_, ServiceOrderSummary>(&sql)
            .fetch_all(executor)
            .await?;

        Ok(orders)
    }

    pub async fn find_party<'e, E>(&self, executor: E, order_id: Uuid) -> Result<PartyInfo, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PartyInfo>(
            r#"
            SELECT c.name AS customer_name, c.phone AS customer_phone, c.email AS customer_email,
                   v.plate, v.make, v.model, v.year AS vehicle_year, m.name AS mechanic_name
            FROM service_orders so
            JOIN customers c ON c.id = so.customer_id
            JOIN vehicles v ON v.id = so.vehicle_id
            LEFT JOIN mechanics m ON m.id = so.mechanic_id
            WHERE so.id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("service_order"))
    }

    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateServiceOrderPayload,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O total é refeito depois pelo recálculo das linhas
        let sql = format!(
            r#"
            UPDATE service_orders
            SET mechanic_id = COALESCE($2, mechanic_id),
                expected_on = COALESCE($3, expected_on),
                diagnosis = COALESCE($4, diagnosis),
                notes = COALESCE($5, notes),
                discount = COALESCE($6, discount),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ServiceOrder>(&sql)
            .bind(id)
            .bind(payload.mechanic_id)
            .bind(payload.expected_on)
            .bind(&payload.diagnosis)
            .bind(&payload.notes)
            .bind(payload.discount)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("service_order"))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ServiceOrderStatus,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE service_orders
            SET status = $2, closed_at = COALESCE($3, closed_at), updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ServiceOrder>(&sql)
            .bind(id)
            .bind(status)
            .bind(closed_at)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("service_order"))
    }

    /// Nomes dos serviços da OS (tipo + descrição livre), usados pelas regras de lembrete.
    pub async fn service_names<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT st.name || COALESCE(' ' || l.description, '')
            FROM service_order_services l
            JOIN service_types st ON st.id = l.service_type_id
            WHERE l.service_order_id = $1
            ORDER BY l.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(names)
    }

    // =========================================================================
    //  CHECKLIST E COMUNICAÇÕES
    // =========================================================================

    pub async fn add_checklist_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        item: &str,
        status: ChecklistStatus,
        notes: Option<&str>,
        photo_path: Option<&str>,
    ) -> Result<ChecklistItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, ChecklistItem>(
            r#"
            INSERT INTO checklist_items (service_order_id, item, status, notes, photo_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, service_order_id, item, status, notes, photo_path, created_at
            "#,
        )
        .bind(order_id)
        .bind(item)
        .bind(status)
        .bind(notes)
        .bind(photo_path)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn list_checklist<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<ChecklistItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ChecklistItem>(
            r#"
            SELECT id, service_order_id, item, status, notes, photo_path, created_at
            FROM checklist_items
            WHERE service_order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    pub async fn add_communication<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        channel: CommunicationChannel,
        message: &str,
        sent_by: Option<&str>,
    ) -> Result<Communication, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, Communication>(
            r#"
            INSERT INTO communications (service_order_id, channel, message, sent_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, service_order_id, channel, message, sent_by, created_at
            "#,
        )
        .bind(order_id)
        .bind(channel)
        .bind(message)
        .bind(sent_by)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    pub async fn list_communications<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<Communication>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, Communication>(
            r#"
            SELECT id, service_order_id, channel, message, sent_by, created_at
            FROM communications
            WHERE service_order_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(entries)
    }
}
