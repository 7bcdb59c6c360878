// src/db/notification_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notifications::{
        ContactInfo, Notification, NotificationChannel, NotificationChannelCount, NotificationFilter,
        NotificationKind, NotificationKindCount, NotificationPeriod, NotificationStatusCount,
    },
};

fn notification_select(source: &str) -> String {
    format!(
        r#"
        SELECT n.id, n.customer_id, c.name AS customer_name, n.kind, n.channel, n.recipient,
               n.message, n.status, n.reference_id, n.attempts, n.error_message, n.sent_at,
               n.read_at, n.created_at
        FROM {source} n
        JOIN customers c ON c.id = n.customer_id
        "#
    )
}

const PERIOD_WHERE: &str = r#"
    ($1::date IS NULL OR created_at::date >= $1)
    AND ($2::date IS NULL OR created_at::date <= $2)
"#;

pub struct NewNotification<'a> {
    pub customer_id: Uuid,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub recipient: &'a str,
    pub message: &'a str,
    pub reference_id: Option<Uuid>,
}

#[derive(Clone, Default)]
pub struct NotificationRepository;

impl NotificationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_contact<'e, E>(&self, executor: E, customer_id: Uuid) -> Result<ContactInfo, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ContactInfo>(
            "SELECT id AS customer_id, name, phone, email FROM customers WHERE id = $1",
        )
        .bind(customer_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("customer"))
    }

    pub async fn list_notifications<'e, E>(
        &self,
        executor: E,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            {select}
            WHERE ($1::notification_status IS NULL OR n.status = $1)
              AND ($2::notification_kind IS NULL OR n.kind = $2)
              AND ($3::notification_channel IS NULL OR n.channel = $3)
              AND ($4::uuid IS NULL OR n.customer_id = $4)
            ORDER BY n.created_at DESC
            LIMIT $5
            "#,
            select = notification_select("notifications"),
        );

        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(filter.status)
            .bind(filter.tipo)
            .bind(filter.meio)
            .bind(filter.cliente_id)
            .bind(filter.limit())
            .fetch_all(executor)
            .await?;

        Ok(notifications)
    }

    pub async fn list_pending<'e, E>(&self, executor: E) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} WHERE n.status = 'PENDING' ORDER BY n.created_at",
            notification_select("notifications"),
        );

        let notifications = sqlx::query_as::<_, Notification>(&sql).fetch_all(executor).await?;

        Ok(notifications)
    }

    pub async fn find_notification<'e, E>(&self, executor: E, id: Uuid) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE n.id = $1", notification_select("notifications"));

        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("notification"))
    }

    pub async fn insert_notification<'e, E>(
        &self,
        executor: E,
        new: &NewNotification<'_>,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO notifications (customer_id, kind, channel, recipient, message, reference_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            {select}
            "#,
            select = notification_select("inserted"),
        );

        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(new.customer_id)
            .bind(new.kind)
            .bind(new.channel)
            .bind(new.recipient)
            .bind(new.message)
            .bind(new.reference_id)
            .fetch_one(executor)
            .await?;

        Ok(notification)
    }

    /// Grava o resultado de uma tentativa de envio e incrementa `attempts`.
    pub async fn record_attempt<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        delivered: bool,
        error_message: Option<&str>,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE notifications
                SET status = CASE WHEN $2 THEN 'SENT'::notification_status ELSE 'FAILED'::notification_status END,
                    sent_at = CASE WHEN $2 THEN NOW() ELSE sent_at END,
                    error_message = $3,
                    attempts = attempts + 1
                WHERE id = $1
                RETURNING *
            )
            {select}
            "#,
            select = notification_select("updated"),
        );

        sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(delivered)
            .bind(error_message)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("notification"))
    }

    // =========================================================================
    //  ESTATÍSTICAS
    // =========================================================================

    pub async fn count_by_status<'e, E>(
        &self,
        executor: E,
        period: &NotificationPeriod,
    ) -> Result<Vec<NotificationStatusCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT status, COUNT(*) AS total
            FROM notifications
            WHERE {PERIOD_WHERE}
            GROUP BY status
            ORDER BY total DESC
            "#
        );

        let rows = sqlx::query_as::<_, NotificationStatusCount>(&sql)
            .bind(period.data_inicio)
            .bind(period.data_fim)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn count_by_kind<'e, E>(
        &self,
        executor: E,
        period: &NotificationPeriod,
    ) -> Result<Vec<NotificationKindCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT kind, COUNT(*) AS total
            FROM notifications
            WHERE {PERIOD_WHERE}
            GROUP BY kind
            ORDER BY total DESC
            "#
        );

        let rows = sqlx::query_as::<_, NotificationKindCount>(&sql)
            .bind(period.data_inicio)
            .bind(period.data_fim)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }

    pub async fn count_by_channel<'e, E>(
        &self,
        executor: E,
        period: &NotificationPeriod,
    ) -> Result<Vec<NotificationChannelCount>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT channel, COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status IN ('SENT', 'DELIVERED', 'READ')) AS sent,
                   COUNT(*) FILTER (WHERE status = 'FAILED') AS failed
            FROM notifications
            WHERE {PERIOD_WHERE}
            GROUP BY channel
            ORDER BY total DESC
            "#
        );

        let rows = sqlx::query_as::<_, NotificationChannelCount>(&sql)
            .bind(period.data_inicio)
            .bind(period.data_fim)
            .fetch_all(executor)
            .await?;

        Ok(rows)
    }
}
