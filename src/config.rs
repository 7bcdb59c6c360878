// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CrmRepository, FinanceRepository, InventoryRepository, LineRepository, NotificationRepository,
        OperationsRepository, QuoteRepository, RegistryRepository, ReminderRepository,
        ReportRepository, SequenceRepository, SettingsRepository, SurveyRepository,
    },
    services::{
        crm_service::CrmService,
        document_service::DocumentService,
        finance_service::FinanceService,
        inventory_service::InventoryService,
        notification_sender::{NotificationSender, SimulatedSender},
        notification_service::NotificationService,
        operation_service::OperationsService,
        order_events::{
            CustomerHistoryRecorder, OrderEvents, ReceivableCreator, ReminderGenerator, SurveyIssuer,
        },
        quote_service::QuoteService,
        registry_service::RegistryService,
        reminder_service::ReminderService,
        report_service::ReportService,
        survey_service::SurveyService,
        upload_storage::UploadStorage,
    },
};

/// Variáveis de ambiente lidas na subida (depois do `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub upload_dir: String,
    pub fonts_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;

        Ok(Self {
            database_url,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000"),
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            fonts_dir: env_or("FONTS_DIR", "./fonts"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub uploads: UploadStorage,

    // CRUD simples vai direto aos repositórios
    pub registry_repo: RegistryRepository,
    pub settings_repo: SettingsRepository,

    pub registry_service: RegistryService,
    pub operations_service: OperationsService,
    pub quote_service: QuoteService,
    pub inventory_service: InventoryService,
    pub finance_service: FinanceService,
    pub report_service: ReportService,
    pub crm_service: CrmService,
    pub reminder_service: ReminderService,
    pub survey_service: SurveyService,
    pub notification_service: NotificationService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let sender: Arc<dyn NotificationSender> = Arc::new(SimulatedSender::default());
        Ok(Self::build(db_pool, config, sender))
    }

    /// Monta o grafo de dependências sobre um pool já aberto.
    pub fn build(db_pool: PgPool, config: &AppConfig, sender: Arc<dyn NotificationSender>) -> Self {
        let crm_repo = CrmRepository::new();
        let finance_repo = FinanceRepository::new();
        let operations_repo = OperationsRepository::new();
        let registry_repo = RegistryRepository::new();
        let sequence_repo = SequenceRepository::new();
        let settings_repo = SettingsRepository::new();
        let line_repo = LineRepository::new();

        let notification_service =
            NotificationService::new(NotificationRepository::new(), crm_repo.clone(), sender);
        let survey_service = SurveyService::new(
            SurveyRepository::new(),
            crm_repo.clone(),
            settings_repo.clone(),
            notification_service.clone(),
        );
        let reminder_service = ReminderService::new(
            ReminderRepository::new(),
            crm_repo.clone(),
            operations_repo.clone(),
            notification_service.clone(),
        );

        // Ordem de execução dos efeitos de OS finalizada
        let events = OrderEvents::new()
            .register(ReceivableCreator::new(finance_repo.clone(), settings_repo.clone()))
            .register(SurveyIssuer::new(survey_service.clone()))
            .register(ReminderGenerator::new(reminder_service.clone()))
            .register(CustomerHistoryRecorder::new(crm_repo.clone()));
        tracing::info!("📣 Handlers de OS finalizada: {:?}", events.handler_names());

        let uploads = UploadStorage::new(&config.upload_dir);

        let inventory_service = InventoryService::new(
            InventoryRepository::new(),
            sequence_repo.clone(),
            settings_repo.clone(),
        );
        let operations_service = OperationsService::new(
            operations_repo.clone(),
            line_repo.clone(),
            sequence_repo.clone(),
            registry_repo.clone(),
            crm_repo.clone(),
            inventory_service.clone(),
            events,
            uploads.clone(),
        );
        let quote_service = QuoteService::new(
            QuoteRepository::new(),
            line_repo,
            sequence_repo,
            settings_repo.clone(),
            registry_repo.clone(),
            operations_repo,
            crm_repo.clone(),
            operations_service.clone(),
            inventory_service.clone(),
        );
        let document_service =
            DocumentService::new(quote_service.clone(), settings_repo.clone(), &config.fonts_dir);
        let crm_service = CrmService::new(
            crm_repo,
            registry_repo.clone(),
            ReminderRepository::new(),
            SurveyRepository::new(),
        );

        Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::new()),
            uploads,
            registry_service: RegistryService::new(registry_repo.clone()),
            registry_repo,
            settings_repo,
            operations_service,
            quote_service,
            inventory_service,
            finance_service: FinanceService::new(finance_repo),
            report_service: ReportService::new(ReportRepository::new()),
            crm_service,
            reminder_service,
            survey_service,
            notification_service,
            document_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::operations::AddPartLinePayload, test_support};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_variables_use_defaults() {
        assert_eq!(env_or("TGEST_VARIAVEL_INEXISTENTE", "uploads"), "uploads");
    }

    // Cliente -> veículo -> OS -> peça -> finalização, passando por todos os serviços
    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn finalized_order_runs_the_closing_cascade(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let part_id = test_support::part_with_stock(&state, "VEL-001", 5).await;
        let order = test_support::open_order(&state, &owner).await;

        state
            .operations_service
            .add_part_line(&pool, order.id, &AddPartLinePayload { part_id, quantity: 2, unit_price: dec!(10) })
            .await
            .unwrap();

        let detail = state.operations_service.detail(&pool, order.id).await.unwrap();
        assert_eq!(detail.order.total, dec!(20));
        assert_eq!(test_support::stock_of(&pool, part_id).await, 3);

        test_support::finalize(&state, order.id).await;

        let surveys =
            test_support::count(&pool, "SELECT COUNT(*) FROM surveys WHERE service_order_id = $1", order.id).await;
        assert_eq!(surveys, 1);

        // Só peça, nenhum serviço com palavra-chave de manutenção
        let reminders =
            test_support::count(&pool, "SELECT COUNT(*) FROM reminders WHERE service_order_id = $1", order.id).await;
        assert_eq!(reminders, 0);

        let amount: Decimal = sqlx::query_scalar("SELECT amount FROM receivables WHERE service_order_id = $1")
            .bind(order.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(amount, dec!(20));
    }
}
