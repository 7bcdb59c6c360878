// src/services.rs

pub mod crm_service;
pub mod document_service;
pub mod finance_service;
pub mod inventory_service;
pub mod notification_sender;
pub mod notification_service;
pub mod operation_service;
pub mod order_events;
pub mod quote_service;
pub mod registry_service;
pub mod reminder_service;
pub mod report_service;
pub mod survey_service;
pub mod upload_storage;
