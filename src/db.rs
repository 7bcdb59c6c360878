pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod finance_repo;
pub use finance_repo::FinanceRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod line_repo;
pub use line_repo::LineRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod operations_repo;
pub use operations_repo::OperationsRepository;
pub mod quote_repo;
pub use quote_repo::QuoteRepository;
pub mod registry_repo;
pub use registry_repo::RegistryRepository;
pub mod reminder_repo;
pub use reminder_repo::ReminderRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
pub mod sequence_repo;
pub use sequence_repo::SequenceRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod survey_repo;
pub use survey_repo::SurveyRepository;
