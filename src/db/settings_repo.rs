use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::settings::{UpdateSettingsRequest, WorkshopSettings},
};

const SETTINGS_COLUMNS: &str = "company_name, document_number, address, phone, email, \
     quote_validity_days, stock_alert_days, receivable_due_days, survey_expiry_days, \
     survey_base_url, updated_at";

#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<WorkshopSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // A linha única é semeada pela migração; se alguém apagou, recria com os padrões
        let sql = format!(
            r#"
            INSERT INTO workshop_settings (id) VALUES (TRUE)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING {SETTINGS_COLUMNS}
            "#
        );

        let settings = sqlx::query_as::<_, WorkshopSettings>(&sql)
            .fetch_one(executor)
            .await?;

        Ok(settings)
    }

    /// Atualização parcial: campos ausentes mantêm o valor atual.
    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        input: &UpdateSettingsRequest,
    ) -> Result<WorkshopSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO workshop_settings (id) VALUES (TRUE)
            ON CONFLICT (id) DO UPDATE SET
                company_name = COALESCE($1, workshop_settings.company_name),
                document_number = COALESCE($2, workshop_settings.document_number),
                address = COALESCE($3, workshop_settings.address),
                phone = COALESCE($4, workshop_settings.phone),
                email = COALESCE($5, workshop_settings.email),
                quote_validity_days = COALESCE($6, workshop_settings.quote_validity_days),
                stock_alert_days = COALESCE($7, workshop_settings.stock_alert_days),
                receivable_due_days = COALESCE($8, workshop_settings.receivable_due_days),
                survey_expiry_days = COALESCE($9, workshop_settings.survey_expiry_days),
                survey_base_url = COALESCE($10, workshop_settings.survey_base_url),
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        );

        let settings = sqlx::query_as::<_, WorkshopSettings>(&sql)
            .bind(&input.company_name)
            .bind(&input.document_number)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(input.quote_validity_days)
            .bind(input.stock_alert_days)
            .bind(input.receivable_due_days)
            .bind(input.survey_expiry_days)
            .bind(&input.survey_base_url)
            .fetch_one(executor)
            .await?;

        Ok(settings)
    }
}
