// src/services/notification_service.rs

use std::sync::Arc;

use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{notification_repo::NewNotification, CrmRepository, NotificationRepository},
    models::notifications::{
        success_rate, BatchItemResult, BatchNotificationPayload, BatchResult, ContactInfo,
        DispatchResult, Notification, NotificationChannel, NotificationFilter, NotificationKind,
        NotificationPeriod, NotificationStatistics, NotificationStatus, SendNotificationPayload,
    },
    services::notification_sender::{NotificationSender, OutboundMessage},
};

pub const MAX_ATTEMPTS: i32 = 3;

/// Pedido de envio para um cliente. Sem `channel`, usa o meio preferido dele.
#[derive(Debug, Clone, Copy)]
pub struct Dispatch<'a> {
    pub customer_id: Uuid,
    pub kind: NotificationKind,
    pub channel: Option<NotificationChannel>,
    pub message: &'a str,
    pub reference_id: Option<Uuid>,
}

/// E-mail vai para o endereço cadastrado; SMS e WhatsApp vão para o telefone.
pub fn resolve_recipient(contact: &ContactInfo, channel: NotificationChannel) -> Result<String, AppError> {
    let address = match channel {
        NotificationChannel::Email => contact.email.as_deref(),
        NotificationChannel::Sms | NotificationChannel::Whatsapp => Some(contact.phone.as_str()),
    };

    address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::MissingContact(channel.code().to_string()))
}

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    crm_repo: CrmRepository,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationService {
    pub fn new(
        repo: NotificationRepository,
        crm_repo: CrmRepository,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self { repo, crm_repo, sender }
    }

    /// Registra a notificação e tenta entregá-la. Falha de entrega não é erro:
    /// fica gravada como FAILED e volta com `delivered = false`.
    pub async fn dispatch(&self, conn: &mut PgConnection, request: Dispatch<'_>) -> Result<DispatchResult, AppError> {
        let contact = self.repo.find_contact(&mut *conn, request.customer_id).await?;
        let preferences = self
            .crm_repo
            .get_or_create_preferences(&mut *conn, request.customer_id)
            .await?;

        if !preferences.accepts(request.kind) {
            return Err(AppError::NotificationOptOut(request.kind.code().to_string()));
        }

        let channel = request.channel.unwrap_or(preferences.preferred_channel);
        let recipient = resolve_recipient(&contact, channel)?;

        let notification = self
            .repo
            .insert_notification(
                &mut *conn,
                &NewNotification {
                    customer_id: request.customer_id,
                    kind: request.kind,
                    channel,
                    recipient: &recipient,
                    message: request.message,
                    reference_id: request.reference_id,
                },
            )
            .await?;

        self.deliver(conn, notification).await
    }

    async fn deliver(&self, conn: &mut PgConnection, notification: Notification) -> Result<DispatchResult, AppError> {
        let outbound = OutboundMessage {
            channel: notification.channel,
            recipient: notification.recipient.clone(),
            body: notification.message.clone(),
        };

        let outcome = self.sender.send(&outbound).await;
        let error = outcome.as_ref().err().map(|e| e.to_string());

        let notification = self
            .repo
            .record_attempt(&mut *conn, notification.id, outcome.is_ok(), error.as_deref())
            .await?;

        Ok(DispatchResult { delivered: outcome.is_ok(), notification })
    }

    // =========================================================================
    //  OPERAÇÕES
    // =========================================================================

    pub async fn send<'e, E>(&self, executor: E, payload: &SendNotificationPayload) -> Result<DispatchResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let result = self
            .dispatch(
                &mut tx,
                Dispatch {
                    customer_id: payload.customer_id,
                    kind: payload.kind,
                    channel: Some(payload.channel),
                    message: &payload.message,
                    reference_id: payload.reference_id,
                },
            )
            .await?;

        tx.commit().await?;
        Ok(result)
    }

    /// Cada cliente é independente: um erro vira um item com falha e o lote segue.
    pub async fn send_batch<'e, E>(&self, executor: E, payload: &BatchNotificationPayload) -> Result<BatchResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let mut result = BatchResult { total: payload.customer_ids.len(), ..Default::default() };

        for customer_id in &payload.customer_ids {
            let request = Dispatch {
                customer_id: *customer_id,
                kind: payload.kind,
                channel: Some(payload.channel),
                message: &payload.message,
                reference_id: None,
            };

            let item = match self.dispatch(&mut conn, request).await {
                Ok(dispatched) => BatchItemResult {
                    customer_id: *customer_id,
                    sent: dispatched.delivered,
                    notification_id: Some(dispatched.notification.id),
                    error: dispatched.notification.error_message,
                },
                Err(e) => BatchItemResult {
                    customer_id: *customer_id,
                    sent: false,
                    notification_id: None,
                    error: Some(e.to_string()),
                },
            };
            result.push(item);
        }

        tracing::info!("📨 Lote enviado: {} de {} entregues", result.sent, result.total);

        Ok(result)
    }

    pub async fn resend<'e, E>(&self, executor: E, id: Uuid) -> Result<DispatchResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let notification = self.repo.find_notification(&mut *tx, id).await?;
        if notification.status == NotificationStatus::Sent {
            return Err(AppError::AlreadySent);
        }
        if notification.attempts >= MAX_ATTEMPTS {
            return Err(AppError::RetryLimitReached);
        }

        let result = self.deliver(&mut tx, notification).await?;

        tx.commit().await?;
        Ok(result)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &NotificationFilter) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_notifications(executor, filter).await
    }

    pub async fn pending<'e, E>(&self, executor: E) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_pending(executor).await
    }

    pub async fn detail<'e, E>(&self, executor: E, id: Uuid) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_notification(executor, id).await
    }

    pub async fn statistics<'e, E>(
        &self,
        executor: E,
        period: &NotificationPeriod,
    ) -> Result<NotificationStatistics, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let by_status = self.repo.count_by_status(&mut *conn, period).await?;
        let by_kind = self.repo.count_by_kind(&mut *conn, period).await?;
        let by_channel = self.repo.count_by_channel(&mut *conn, period).await?;

        let total: i64 = by_status.iter().map(|s| s.total).sum();
        let sent: i64 = by_channel.iter().map(|c| c.sent).sum();
        let failed: i64 = by_channel.iter().map(|c| c.failed).sum();

        Ok(NotificationStatistics {
            by_status,
            by_kind,
            by_channel,
            total,
            sent,
            failed,
            success_rate: success_rate(sent, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification_sender::RecordingSender;
    use sqlx::PgPool;

    fn contact(email: Option<&str>) -> ContactInfo {
        ContactInfo {
            customer_id: Uuid::new_v4(),
            name: "Jane".into(),
            phone: "555-0100".into(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn email_goes_to_address_and_others_to_phone() {
        let c = contact(Some("jane@example.com"));
        assert_eq!(resolve_recipient(&c, NotificationChannel::Email).unwrap(), "jane@example.com");
        assert_eq!(resolve_recipient(&c, NotificationChannel::Sms).unwrap(), "555-0100");
        assert_eq!(resolve_recipient(&c, NotificationChannel::Whatsapp).unwrap(), "555-0100");
    }

    #[test]
    fn missing_or_blank_email_is_rejected() {
        for email in [None, Some("   ")] {
            let err = resolve_recipient(&contact(email), NotificationChannel::Email).unwrap_err();
            assert!(matches!(err, AppError::MissingContact(ref c) if c == "EMAIL"));
        }
    }

    async fn customer(pool: &PgPool) -> Uuid {
        sqlx::query_scalar("INSERT INTO customers (name, phone) VALUES ('Jane', '555-0100') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn failed_delivery_is_recorded_and_retry_is_capped(pool: PgPool) {
        let sender = Arc::new(RecordingSender::failing());
        let service = NotificationService::new(NotificationRepository::new(), CrmRepository::new(), sender.clone());
        let customer_id = customer(&pool).await;

        let payload = SendNotificationPayload {
            customer_id,
            kind: NotificationKind::Campaign,
            channel: NotificationChannel::Sms,
            message: "Promoção de revisão".into(),
            reference_id: None,
        };
        let first = service.send(&pool, &payload).await.unwrap();
        assert!(!first.delivered);
        assert_eq!(first.notification.status, NotificationStatus::Failed);
        assert_eq!(first.notification.attempts, 1);

        let id = first.notification.id;
        service.resend(&pool, id).await.unwrap();
        service.resend(&pool, id).await.unwrap();
        let err = service.resend(&pool, id).await.unwrap_err();
        assert!(matches!(err, AppError::RetryLimitReached));
        assert_eq!(sender.sent().len(), 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn opted_out_customer_is_not_contacted(pool: PgPool) {
        let sender = Arc::new(RecordingSender::delivering());
        let service = NotificationService::new(NotificationRepository::new(), CrmRepository::new(), sender.clone());
        let customer_id = customer(&pool).await;
        sqlx::query("INSERT INTO customer_preferences (customer_id, receive_promotions) VALUES ($1, FALSE)")
            .bind(customer_id)
            .execute(&pool)
            .await
            .unwrap();

        let payload = BatchNotificationPayload {
            customer_ids: vec![customer_id],
            kind: NotificationKind::Campaign,
            channel: NotificationChannel::Whatsapp,
            message: "Promoção".into(),
        };
        let result = service.send_batch(&pool, &payload).await.unwrap();
        assert_eq!((result.total, result.sent, result.failed), (1, 0, 1));
        assert!(sender.sent().is_empty());
    }
}
