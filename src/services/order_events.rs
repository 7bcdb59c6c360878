// src/services/order_events.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{finance_repo::NewReceivable, CrmRepository, FinanceRepository, SettingsRepository},
    models::{
        crm::{history_kind, NewHistoryEntry},
        finance::account_codes,
    },
    services::{
        reminder_service::{OrderServices, ReminderService},
        survey_service::SurveyService,
    },
};

/// Emitido quando uma OS chega a FINALIZED, dentro da mesma transação.
#[derive(Debug, Clone)]
pub struct OrderFinalized {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub vehicle_id: Uuid,
    pub odometer: Option<i32>,
    pub total: Decimal,
    pub service_names: Vec<String>,
    pub finalized_at: DateTime<Utc>,
}

pub fn receivable_description(order_number: &str, customer_name: &str) -> String {
    format!("OS {order_number} - {customer_name}")
}

#[async_trait]
pub trait OrderFinalizedHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, conn: &mut PgConnection, event: &OrderFinalized) -> Result<(), AppError>;
}

/// Executa os handlers em ordem de registro; o primeiro erro aborta a transação.
#[derive(Clone, Default)]
pub struct OrderEvents {
    handlers: Vec<Arc<dyn OrderFinalizedHandler>>,
}

impl OrderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, handler: impl OrderFinalizedHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub async fn publish(&self, conn: &mut PgConnection, event: &OrderFinalized) -> Result<(), AppError> {
        for handler in &self.handlers {
            tracing::debug!("OrderFinalized {} -> {}", event.order_number, handler.name());
            handler.handle(&mut *conn, event).await?;
        }
        Ok(())
    }
}

// =============================================================================
//  HANDLERS
// =============================================================================

#[derive(Clone)]
pub struct ReceivableCreator {
    finance_repo: FinanceRepository,
    settings_repo: SettingsRepository,
}

impl ReceivableCreator {
    pub fn new(finance_repo: FinanceRepository, settings_repo: SettingsRepository) -> Self {
        Self { finance_repo, settings_repo }
    }
}

#[async_trait]
impl OrderFinalizedHandler for ReceivableCreator {
    fn name(&self) -> &'static str {
        "ReceivableCreator"
    }

    async fn handle(&self, conn: &mut PgConnection, event: &OrderFinalized) -> Result<(), AppError> {
        if event.total <= Decimal::ZERO {
            return Ok(());
        }
        if self.finance_repo.find_receivable_by_order(&mut *conn, event.order_id).await?.is_some() {
            return Ok(());
        }

        let settings = self.settings_repo.get_settings(&mut *conn).await?;
        let account = self.finance_repo.find_account_by_code(&mut *conn, account_codes::SERVICE_REVENUE).await?;

        let issued_on = event.finalized_at.date_naive();
        let due_days = u64::try_from(settings.receivable_due_days).unwrap_or_default();
        let due_on = issued_on.checked_add_days(Days::new(due_days)).unwrap_or(issued_on);

        self.finance_repo
            .create_receivable(
                &mut *conn,
                &NewReceivable {
                    description: receivable_description(&event.order_number, &event.customer_name),
                    customer_id: Some(event.customer_id),
                    service_order_id: Some(event.order_id),
                    account_id: Some(account.id),
                    amount: event.total,
                    issued_on,
                    due_on,
                    notes: None,
                },
            )
            .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct SurveyIssuer {
    surveys: SurveyService,
}

impl SurveyIssuer {
    pub fn new(surveys: SurveyService) -> Self {
        Self { surveys }
    }
}

#[async_trait]
impl OrderFinalizedHandler for SurveyIssuer {
    fn name(&self) -> &'static str {
        "SurveyIssuer"
    }

    async fn handle(&self, conn: &mut PgConnection, event: &OrderFinalized) -> Result<(), AppError> {
        self.surveys.issue_for_order(conn, event.order_id, event.customer_id).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ReminderGenerator {
    reminders: ReminderService,
}

impl ReminderGenerator {
    pub fn new(reminders: ReminderService) -> Self {
        Self { reminders }
    }
}

#[async_trait]
impl OrderFinalizedHandler for ReminderGenerator {
    fn name(&self) -> &'static str {
        "ReminderGenerator"
    }

    async fn handle(&self, conn: &mut PgConnection, event: &OrderFinalized) -> Result<(), AppError> {
        let order = OrderServices {
            order_id: event.order_id,
            order_number: event.order_number.clone(),
            customer_id: event.customer_id,
            vehicle_id: event.vehicle_id,
            odometer: event.odometer,
            service_names: event.service_names.clone(),
        };
        self.reminders.generate_for_order(conn, &order).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct CustomerHistoryRecorder {
    crm_repo: CrmRepository,
}

impl CustomerHistoryRecorder {
    pub fn new(crm_repo: CrmRepository) -> Self {
        Self { crm_repo }
    }
}

#[async_trait]
impl OrderFinalizedHandler for CustomerHistoryRecorder {
    fn name(&self) -> &'static str {
        "CustomerHistoryRecorder"
    }

    async fn handle(&self, conn: &mut PgConnection, event: &OrderFinalized) -> Result<(), AppError> {
        self.crm_repo
            .insert_history(
                conn,
                &NewHistoryEntry::system(
                    event.customer_id,
                    history_kind::ORDER_FINALIZED,
                    format!("OS {} finalizada - Total: R$ {:.2}", event.order_number, event.total),
                    Some(event.order_id),
                ),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl OrderFinalizedHandler for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn handle(&self, _conn: &mut PgConnection, _event: &OrderFinalized) -> Result<(), AppError> {
            self.seen.lock().unwrap().push(self.label);
            if self.fail {
                return Err(AppError::BadRequest(self.label.to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn handlers_keep_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let events = OrderEvents::new()
            .register(Recorder { label: "primeiro", seen: seen.clone(), fail: false })
            .register(Recorder { label: "segundo", seen, fail: false });

        assert_eq!(events.handler_names(), vec!["primeiro", "segundo"]);
    }

    #[test]
    fn receivable_description_names_order_and_customer() {
        assert_eq!(receivable_description("OS2026-0001", "Jane"), "OS OS2026-0001 - Jane");
    }

    fn event() -> OrderFinalized {
        OrderFinalized {
            order_id: Uuid::new_v4(),
            order_number: "OS2026-0001".into(),
            customer_id: Uuid::new_v4(),
            customer_name: "Jane".into(),
            vehicle_id: Uuid::new_v4(),
            odometer: Some(50_000),
            total: Decimal::from(20),
            service_names: vec!["Troca de óleo".into()],
            finalized_at: Utc::now(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn failing_handler_stops_the_chain(pool: sqlx::PgPool) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let events = OrderEvents::new()
            .register(Recorder { label: "a", seen: seen.clone(), fail: true })
            .register(Recorder { label: "b", seen: seen.clone(), fail: false });

        let mut conn = pool.acquire().await.unwrap();
        assert!(events.publish(&mut conn, &event()).await.is_err());
        assert_eq!(*seen.lock().unwrap(), vec!["a"]);
    }
}
