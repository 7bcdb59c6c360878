// src/handlers.rs

pub mod crm;
pub mod finance;
pub mod inventory;
pub mod notifications;
pub mod operations;
pub mod quotes;
pub mod registry;
pub mod reminders;
pub mod reports;
pub mod settings;
pub mod surveys;
