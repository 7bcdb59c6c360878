// src/db/crm_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{
        CustomerPreferences, HistoryEntry, HistoryFilter, NewHistoryEntry, NotificationActivity,
        OrderBrief, ProfileStats, RetentionRow, TopCustomer, UpdatePreferencesPayload,
    },
};

const PREFERENCE_COLUMNS: &str = "customer_id, receive_reminders, receive_promotions, \
     receive_surveys, preferred_channel, best_time, updated_at";

#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  HISTÓRICO
    // =========================================================================

    pub async fn insert_history<'e, E>(
        &self,
        executor: E,
        entry: &NewHistoryEntry,
    ) -> Result<HistoryEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO customer_history (customer_id, kind, description, reference_id, performed_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, customer_id, kind, description, reference_id, performed_by, notes, created_at
            "#,
        )
        .bind(entry.customer_id)
        .bind(&entry.kind)
        .bind(&entry.description)
        .bind(entry.reference_id)
        .bind(&entry.performed_by)
        .bind(&entry.notes)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn list_history<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, customer_id, kind, description, reference_id, performed_by, notes, created_at
            FROM customer_history
            WHERE customer_id = $1 AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(customer_id)
        .bind(&filter.tipo)
        .bind(filter.limit())
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    //  PREFERÊNCIAS
    // =========================================================================

    /// Devolve as preferências, criando a linha padrão no primeiro acesso.
    pub async fn get_or_create_preferences<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<CustomerPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO customer_preferences (customer_id)
            VALUES ($1)
            ON CONFLICT (customer_id) DO UPDATE SET customer_id = EXCLUDED.customer_id
            RETURNING {PREFERENCE_COLUMNS}
            "#
        );

        let prefs = sqlx::query_as::<_, CustomerPreferences>(&sql)
            .bind(customer_id)
            .fetch_one(executor)
            .await?;

        Ok(prefs)
    }

    pub async fn update_preferences<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        payload: &UpdatePreferencesPayload,
    ) -> Result<CustomerPreferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO customer_preferences (
                customer_id, receive_reminders, receive_promotions, receive_surveys, preferred_channel, best_time
            )
            VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE), COALESCE($4, TRUE),
                    COALESCE($5, 'WHATSAPP'::notification_channel), $6)
            ON CONFLICT (customer_id) DO UPDATE SET
                receive_reminders = COALESCE($2, customer_preferences.receive_reminders),
                receive_promotions = COALESCE($3, customer_preferences.receive_promotions),
                receive_surveys = COALESCE($4, customer_preferences.receive_surveys),
                preferred_channel = COALESCE($5, customer_preferences.preferred_channel),
                best_time = COALESCE($6, customer_preferences.best_time),
                updated_at = NOW()
            RETURNING {PREFERENCE_COLUMNS}
            "#
        );

        let prefs = sqlx::query_as::<_, CustomerPreferences>(&sql)
            .bind(customer_id)
            .bind(payload.receive_reminders)
            .bind(payload.receive_promotions)
            .bind(payload.receive_surveys)
            .bind(payload.preferred_channel)
            .bind(&payload.best_time)
            .fetch_one(executor)
            .await?;

        Ok(prefs)
    }

    // =========================================================================
    //  RETENÇÃO E PERFIL
    // =========================================================================

    /// Agregado por cliente ativo considerando só OS finalizadas. A data da
    /// visita é o fechamento (ou a abertura, se não houver fechamento).
    pub async fn retention_rows<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<RetentionRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, RetentionRow>(
            r#"
            SELECT c.id AS customer_id, c.name AS customer_name, c.phone AS customer_phone,
                   COUNT(so.id) AS total_visits,
                   MAX(COALESCE(so.closed_at, so.opened_at)) AS last_visit,
                   CURRENT_DATE - MAX(COALESCE(so.closed_at, so.opened_at))::date AS days_since_visit,
                   COALESCE(SUM(so.total), 0) AS total_value,
                   ROUND(AVG(so.total), 2) AS average_ticket
            FROM customers c
            LEFT JOIN service_orders so ON so.customer_id = c.id AND so.status = 'FINALIZED'
            WHERE c.is_active AND ($1::uuid IS NULL OR c.id = $1)
            GROUP BY c.id
            ORDER BY days_since_visit DESC NULLS LAST, c.name
            "#,
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn profile_stats<'e, E>(&self, executor: E, customer_id: Uuid) -> Result<ProfileStats, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stats = sqlx::query_as::<_, ProfileStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM service_orders WHERE customer_id = $1) AS total_orders,
                (SELECT COALESCE(SUM(total), 0) FROM service_orders
                  WHERE customer_id = $1 AND status = 'FINALIZED') AS total_billed,
                (SELECT MAX(opened_at) FROM service_orders WHERE customer_id = $1) AS last_visit,
                (SELECT COUNT(*) FROM vehicles WHERE customer_id = $1) AS total_vehicles,
                (SELECT ROUND(AVG((rating_service + rating_quality + rating_deadline + rating_price) / 4.0), 2)
                   FROM surveys WHERE customer_id = $1 AND status = 'RESPONDED') AS satisfaction_average,
                (SELECT COUNT(*) FROM reminders
                  WHERE customer_id = $1 AND status IN ('PENDING', 'SENT')) AS pending_reminders
            "#,
        )
        .bind(customer_id)
        .fetch_one(executor)
        .await?;

        Ok(stats)
    }

    pub async fn recent_orders<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<OrderBrief>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, OrderBrief>(
            r#"
            SELECT id, number, status, total, opened_at, closed_at
            FROM service_orders
            WHERE customer_id = $1
            ORDER BY opened_at DESC
            LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(orders)
    }

    /// Lembretes já enviados e vencidos antes de `cutoff`, sem retorno do cliente.
    pub async fn stale_reminder_count<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        cutoff: NaiveDate,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reminders
            WHERE customer_id = $1 AND status = 'SENT' AND due_on < $2
            "#,
        )
        .bind(customer_id)
        .bind(cutoff)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    // =========================================================================
    //  DASHBOARD
    // =========================================================================

    pub async fn top_customers<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<TopCustomer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, TopCustomer>(
            r#"
            SELECT c.id AS customer_id, c.name, SUM(so.total) AS total_billed, COUNT(so.id) AS total_orders
            FROM customers c
            JOIN service_orders so ON so.customer_id = c.id AND so.status = 'FINALIZED'
            GROUP BY c.id
            ORDER BY total_billed DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(customers)
    }

    pub async fn notification_activity<'e, E>(
        &self,
        executor: E,
        days: i32,
    ) -> Result<Vec<NotificationActivity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let activity = sqlx::query_as::<_, NotificationActivity>(
            r#"
            SELECT kind, channel, status, COUNT(*) AS total
            FROM notifications
            WHERE created_at >= NOW() - make_interval(days => $1)
            GROUP BY kind, channel, status
            ORDER BY total DESC
            "#,
        )
        .bind(days)
        .fetch_all(executor)
        .await?;

        Ok(activity)
    }
}
