// src/db/reminder_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reminders::{
        NewReminder, Reminder, ReminderFilter, ReminderKind, ReminderStatus, UpdateReminderPayload,
    },
};

fn reminder_select(source: &str) -> String {
    format!(
        r#"
        SELECT r.id, r.vehicle_id, v.plate, v.make || ' ' || v.model AS vehicle_description,
               r.customer_id, c.name AS customer_name, c.phone AS customer_phone,
               r.service_order_id, r.kind, r.description, r.current_odometer, r.due_odometer,
               r.due_on, r.status, r.priority, r.last_sent_at, r.send_count, r.notes,
               r.created_at, r.updated_at
        FROM {source} r
        JOIN vehicles v ON v.id = r.vehicle_id
        JOIN customers c ON c.id = r.customer_id
        "#
    )
}

#[derive(Clone, Default)]
pub struct ReminderRepository;

impl ReminderRepository {
    pub fn new() -> Self {
        Self
    }

    /// A urgência é filtrada no banco com a mesma regra de `ReminderUrgency::classify`.
    pub async fn list_reminders<'e, E>(
        &self,
        executor: E,
        filter: &ReminderFilter,
    ) -> Result<Vec<Reminder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {select}
            WHERE ($1::reminder_status IS NULL OR r.status = $1)
              AND ($2::reminder_kind IS NULL OR r.kind = $2)
              AND ($3::reminder_priority IS NULL OR r.priority = $3)
              AND ($4::uuid IS NULL OR r.customer_id = $4)
              AND ($5::uuid IS NULL OR r.vehicle_id = $5)
              AND ($6::text IS NULL OR $6 = CASE
                    WHEN r.due_on < CURRENT_DATE THEN 'OVERDUE'
                    WHEN r.due_on <= CURRENT_DATE + 7 THEN 'UPCOMING'
                    ELSE 'FUTURE' END)
            ORDER BY r.due_on NULLS LAST, r.created_at
            LIMIT $7
            "#,
            select = reminder_select("reminders"),
        );

        let reminders = sqlx::query_as::<_, Reminder>(&sql)
            .bind(filter.status)
            .bind(filter.tipo)
            .bind(filter.prioridade)
            .bind(filter.cliente_id)
            .bind(filter.veiculo_id)
            .bind(filter.urgencia.map(|u| u.code()))
            .bind(filter.limit())
            .fetch_all(executor)
            .await?;

        Ok(reminders)
    }

    // Abertos (PENDING/SENT) com data alvo já passada
    pub async fn list_overdue<'e, E>(&self, executor: E) -> Result<Vec<Reminder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {select}
            WHERE r.status IN ('PENDING', 'SENT') AND r.due_on < CURRENT_DATE
            ORDER BY r.due_on
            "#,
            select = reminder_select("reminders"),
        );

        let reminders = sqlx::query_as::<_, Reminder>(&sql).fetch_all(executor).await?;

        Ok(reminders)
    }

    /// Todos os lembretes abertos; com `customer_id`, só os daquele cliente.
    pub async fn list_open<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<Reminder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {select}
            WHERE r.status IN ('PENDING', 'SENT') AND ($1::uuid IS NULL OR r.customer_id = $1)
            ORDER BY r.due_on NULLS LAST
            "#,
            select = reminder_select("reminders"),
        );

        let reminders = sqlx::query_as::<_, Reminder>(&sql)
            .bind(customer_id)
            .fetch_all(executor)
            .await?;

        Ok(reminders)
    }

    pub async fn find_reminder<'e, E>(&self, executor: E, id: Uuid) -> Result<Reminder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE r.id = $1", reminder_select("reminders"));

        sqlx::query_as::<_, Reminder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("reminder"))
    }

    pub async fn create_reminder<'e, E>(&self, executor: E, new: &NewReminder) -> Result<Reminder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO reminders (
                    vehicle_id, customer_id, service_order_id, kind, description,
                    current_odometer, due_odometer, due_on, priority, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
            )
            {select}
            "#,
            select = reminder_select("inserted"),
        );

        let reminder = sqlx::query_as::<_, Reminder>(&sql)
            .bind(new.vehicle_id)
            .bind(new.customer_id)
            .bind(new.service_order_id)
            .bind(new.kind)
            .bind(&new.description)
            .bind(new.current_odometer)
            .bind(new.due_odometer)
            .bind(new.due_on)
            .bind(new.priority)
            .bind(&new.notes)
            .fetch_one(executor)
            .await?;

        Ok(reminder)
    }

    pub async fn update_reminder<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateReminderPayload,
    ) -> Result<Reminder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE reminders
                SET kind = COALESCE($2, kind),
                    description = COALESCE($3, description),
                    current_odometer = COALESCE($4, current_odometer),
                    due_odometer = COALESCE($5, due_odometer),
                    due_on = COALESCE($6, due_on),
                    priority = COALESCE($7, priority),
                    notes = COALESCE($8, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = reminder_select("updated"),
        );

        sqlx::query_as::<_, Reminder>(&sql)
            .bind(id)
            .bind(payload.kind)
            .bind(&payload.description)
            .bind(payload.current_odometer)
            .bind(payload.due_odometer)
            .bind(payload.due_on)
            .bind(payload.priority)
            .bind(&payload.notes)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("reminder"))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ReminderStatus,
    ) -> Result<Reminder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE reminders SET status = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = reminder_select("updated"),
        );

        sqlx::query_as::<_, Reminder>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("reminder"))
    }

    pub async fn mark_sent<'e, E>(&self, executor: E, id: Uuid) -> Result<Reminder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE reminders
                SET status = 'SENT', last_sent_at = NOW(), send_count = send_count + 1, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = reminder_select("updated"),
        );

        sqlx::query_as::<_, Reminder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("reminder"))
    }

    pub async fn delete_reminder<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("reminder"));
        }
        Ok(())
    }

    /// Já existe lembrete aberto (PENDING/SENT) do mesmo tipo para o veículo?
    pub async fn has_open_reminder<'e, E>(
        &self,
        executor: E,
        vehicle_id: Uuid,
        kind: ReminderKind,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM reminders
                WHERE vehicle_id = $1 AND kind = $2 AND status IN ('PENDING', 'SENT')
            )
            "#,
        )
        .bind(vehicle_id)
        .bind(kind)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }
}
