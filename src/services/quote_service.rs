// src/services/quote_service.rs

use chrono::{Datelike, Days, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        line_repo::{ORDER_LINES, QUOTE_LINES},
        operations_repo::NewServiceOrder,
        quote_repo::NewQuote,
        sequence_repo::prefix,
        CrmRepository, LineRepository, OperationsRepository, QuoteRepository, RegistryRepository,
        SequenceRepository, SettingsRepository,
    },
    models::{
        crm::{history_kind, NewHistoryEntry},
        inventory::reference,
        lifecycle::StatusMachine,
        operations::{AddPartLinePayload, AddServiceLinePayload, PartLine, ServiceLine},
        quotes::{
            conversion_rate, ConversionResult, CreateQuotePayload, Quote, QuoteDetail, QuoteFilter,
            QuoteStatistics, QuoteStatus, QuoteSummary, UpdateQuotePayload,
        },
    },
    services::{
        inventory_service::{InventoryService, StockReference},
        operation_service::OperationsService,
    },
};

pub fn conversion_notes(quote_number: &str, quote_notes: Option<&str>) -> String {
    match quote_notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => format!("Convertido do orçamento {quote_number}. {notes}"),
        None => format!("Convertido do orçamento {quote_number}."),
    }
}

fn ensure_editable(quote: &Quote) -> Result<(), AppError> {
    if quote.status == QuoteStatus::Converted {
        return Err(AppError::DocumentClosed);
    }
    Ok(())
}

#[derive(Clone)]
pub struct QuoteService {
    repo: QuoteRepository,
    line_repo: LineRepository,
    sequence_repo: SequenceRepository,
    settings_repo: SettingsRepository,
    registry_repo: RegistryRepository,
    operations_repo: OperationsRepository,
    crm_repo: CrmRepository,
    operations: OperationsService,
    inventory: InventoryService,
}

impl QuoteService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: QuoteRepository,
        line_repo: LineRepository,
        sequence_repo: SequenceRepository,
        settings_repo: SettingsRepository,
        registry_repo: RegistryRepository,
        operations_repo: OperationsRepository,
        crm_repo: CrmRepository,
        operations: OperationsService,
        inventory: InventoryService,
    ) -> Self {
        Self {
            repo,
            line_repo,
            sequence_repo,
            settings_repo,
            registry_repo,
            operations_repo,
            crm_repo,
            operations,
            inventory,
        }
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list<'e, E>(&self, executor: E, filter: &QuoteFilter) -> Result<Vec<QuoteSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_quotes(executor, filter).await
    }

    pub async fn statistics<'e, E>(&self, executor: E) -> Result<QuoteStatistics, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let by_status = self.repo.statistics_by_status(executor).await?;

        let total: i64 = by_status.iter().map(|s| s.count).sum();
        let total_value: Decimal = by_status.iter().map(|s| s.total_value).sum();
        let approved = by_status
            .iter()
            .find(|s| s.status == QuoteStatus::Approved)
            .map_or(0, |s| s.count);

        Ok(QuoteStatistics {
            total,
            total_value,
            by_status,
            conversion_rate: conversion_rate(approved, total),
        })
    }

    pub async fn detail<'e, E>(&self, executor: E, id: Uuid) -> Result<QuoteDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.load_detail(&mut *conn, id).await
    }

    /// Detalhe lido numa conexão já aberta.
    pub(crate) async fn load_detail(&self, conn: &mut PgConnection, id: Uuid) -> Result<QuoteDetail, AppError> {
        let quote = self.repo.find_quote(&mut *conn, id).await?;
        let party = self.repo.find_party(&mut *conn, id).await?;
        let services = self.line_repo.list_services(&mut *conn, &QUOTE_LINES, id).await?;
        let parts = self.line_repo.list_parts(&mut *conn, &QUOTE_LINES, id).await?;
        let expired = quote.status.is_expired_on(quote.valid_until, Utc::now().date_naive());

        Ok(QuoteDetail { quote, party, expired, services, parts })
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    /// Orçamento não reserva estoque; as peças só são validadas na conversão.
    pub async fn create<'e, E>(&self, executor: E, payload: &CreateQuotePayload) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let vehicle = self.registry_repo.find_vehicle(&mut *tx, payload.vehicle_id).await?;
        if vehicle.customer_id != payload.customer_id {
            return Err(AppError::BadRequest("vehicle_owner".to_string()));
        }

        let today = Utc::now().date_naive();
        let valid_until = match payload.valid_until {
            Some(date) => date,
            None => {
                let settings = self.settings_repo.get_settings(&mut *tx).await?;
                let days = u64::try_from(settings.quote_validity_days).unwrap_or_default();
                today.checked_add_days(Days::new(days)).unwrap_or(today)
            }
        };

        let number = self.sequence_repo.next_number(&mut *tx, prefix::QUOTE, today.year()).await?;
        let quote = self
            .repo
            .create_quote(
                &mut *tx,
                &number,
                &NewQuote {
                    customer_id: payload.customer_id,
                    vehicle_id: payload.vehicle_id,
                    problem_description: payload.problem_description.clone(),
                    notes: payload.notes.clone(),
                    valid_until,
                    discount: payload.discount.unwrap_or_default(),
                },
            )
            .await?;

        for service in &payload.services {
            self.line_repo.insert_service(&mut *tx, &QUOTE_LINES, quote.id, service).await?;
        }
        for part in &payload.parts {
            self.line_repo.insert_part(&mut *tx, &QUOTE_LINES, quote.id, part).await?;
        }
        self.line_repo.recompute_totals(&mut *tx, &QUOTE_LINES, quote.id).await?;

        let quote = self.repo.find_quote(&mut *tx, quote.id).await?;

        tx.commit().await?;

        tracing::info!("📝 Orçamento {} criado", quote.number);

        Ok(quote)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, payload: &UpdateQuotePayload) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let quote = self.repo.lock_quote(&mut *tx, id).await?;
        ensure_editable(&quote)?;

        self.repo.update_quote(&mut *tx, id, payload).await?;
        self.line_repo.recompute_totals(&mut *tx, &QUOTE_LINES, id).await?;
        let quote = self.repo.find_quote(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(quote)
    }

    pub async fn change_status<'e, E>(&self, executor: E, id: Uuid, next: QuoteStatus) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let quote = self.repo.lock_quote(&mut *tx, id).await?;
        quote.status.ensure_transition(next)?;
        let quote = self.repo.set_status(&mut *tx, id, next).await?;

        tx.commit().await?;
        Ok(quote)
    }

    pub async fn add_service_line<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &AddServiceLinePayload,
    ) -> Result<ServiceLine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        ensure_editable(&self.repo.lock_quote(&mut *tx, id).await?)?;
        let line = self.line_repo.insert_service(&mut *tx, &QUOTE_LINES, id, payload).await?;
        self.line_repo.recompute_totals(&mut *tx, &QUOTE_LINES, id).await?;

        tx.commit().await?;
        Ok(line)
    }

    pub async fn add_part_line<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &AddPartLinePayload,
    ) -> Result<PartLine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        ensure_editable(&self.repo.lock_quote(&mut *tx, id).await?)?;
        let line = self.line_repo.insert_part(&mut *tx, &QUOTE_LINES, id, payload).await?;
        self.line_repo.recompute_totals(&mut *tx, &QUOTE_LINES, id).await?;

        tx.commit().await?;
        Ok(line)
    }

    pub async fn remove_service_line<'e, E>(&self, executor: E, id: Uuid, line_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        ensure_editable(&self.repo.lock_quote(&mut *tx, id).await?)?;
        self.line_repo.delete_service(&mut *tx, &QUOTE_LINES, id, line_id).await?;
        self.line_repo.recompute_totals(&mut *tx, &QUOTE_LINES, id).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_part_line<'e, E>(&self, executor: E, id: Uuid, line_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        ensure_editable(&self.repo.lock_quote(&mut *tx, id).await?)?;
        self.line_repo.delete_part(&mut *tx, &QUOTE_LINES, id, line_id).await?;
        self.line_repo.recompute_totals(&mut *tx, &QUOTE_LINES, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  CONVERSÃO EM OS
    // =========================================================================

    /// Tudo ou nada: se alguma peça não tiver saldo, nenhuma OS é criada e o
    /// orçamento continua como estava.
    pub async fn convert<'e, E>(&self, executor: E, id: Uuid) -> Result<ConversionResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let quote = self.repo.lock_quote(&mut *tx, id).await?;
        if !quote.status.can_convert() {
            return Err(AppError::AlreadyConverted);
        }

        let services = self.line_repo.list_services(&mut *tx, &QUOTE_LINES, id).await?;
        let parts = self.line_repo.list_parts(&mut *tx, &QUOTE_LINES, id).await?;

        let order = self
            .operations
            .open(
                &mut tx,
                &NewServiceOrder {
                    customer_id: quote.customer_id,
                    vehicle_id: quote.vehicle_id,
                    mechanic_id: None,
                    quote_id: Some(quote.id),
                    problem_reported: quote.problem_description.clone(),
                    notes: Some(conversion_notes(&quote.number, quote.notes.as_deref())),
                    odometer_in: None,
                    expected_on: None,
                    discount: quote.discount,
                },
            )
            .await?;

        for line in &services {
            let payload = AddServiceLinePayload {
                service_type_id: line.service_type_id,
                mechanic_id: line.mechanic_id,
                description: line.description.clone(),
                quantity: Some(line.quantity),
                unit_price: line.unit_price,
            };
            self.line_repo.insert_service(&mut *tx, &ORDER_LINES, order.id, &payload).await?;
        }

        let reason = format!("Utilizado na OS {}", order.number);
        let origin = StockReference { kind: reference::SERVICE_ORDER, id: order.id };
        for line in &parts {
            self.inventory.consume(&mut tx, line.part_id, line.quantity, &reason, origin).await?;
            let payload = AddPartLinePayload {
                part_id: line.part_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            };
            self.line_repo.insert_part(&mut *tx, &ORDER_LINES, order.id, &payload).await?;
        }

        self.line_repo.recompute_totals(&mut *tx, &ORDER_LINES, order.id).await?;
        self.repo.mark_converted(&mut *tx, id, order.id).await?;
        self.crm_repo
            .insert_history(
                &mut *tx,
                &NewHistoryEntry::system(
                    quote.customer_id,
                    history_kind::QUOTE_CONVERTED,
                    format!("Orçamento {} convertido na OS {}", quote.number, order.number),
                    Some(order.id),
                ),
            )
            .await?;

        let order = self.operations_repo.find_order(&mut *tx, order.id).await?;

        tx.commit().await?;

        tracing::info!("📝 Orçamento {} convertido na OS {}", quote.number, order.number);

        Ok(ConversionResult {
            message: format!("Orçamento convertido na OS {}", order.number),
            order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::inventory::StockAdjustmentPayload, test_support};
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    #[test]
    fn conversion_notes_keep_original_notes() {
        assert_eq!(conversion_notes("ORC2026-0001", None), "Convertido do orçamento ORC2026-0001.");
        assert_eq!(conversion_notes("ORC2026-0001", Some("  ")), "Convertido do orçamento ORC2026-0001.");
        assert_eq!(
            conversion_notes("ORC2026-0001", Some("Cliente traz peça")),
            "Convertido do orçamento ORC2026-0001. Cliente traz peça"
        );
    }

    fn quote_payload(owner: &test_support::Owner, parts: Vec<AddPartLinePayload>) -> CreateQuotePayload {
        CreateQuotePayload {
            customer_id: owner.customer_id,
            vehicle_id: owner.vehicle_id,
            problem_description: None,
            notes: None,
            valid_until: None,
            discount: Some(dec!(0)),
            services: vec![],
            parts,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn second_conversion_fails_without_new_order(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;

        let quote = state.quote_service.create(&pool, &quote_payload(&owner, vec![])).await.unwrap();
        assert_eq!(quote.number, format!("ORC{}-0001", Utc::now().year()));

        state.quote_service.convert(&pool, quote.id).await.unwrap();
        let err = state.quote_service.convert(&pool, quote.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyConverted));

        let orders =
            test_support::count(&pool, "SELECT COUNT(*) FROM service_orders WHERE quote_id = $1", quote.id).await;
        assert_eq!(orders, 1);
    }

    // Estoque baixou entre o orçamento e a conversão
    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn conversion_without_stock_rolls_back(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let part_id = test_support::part_with_stock(&state, "PAST-01", 5).await;

        let lines = vec![AddPartLinePayload { part_id, quantity: 3, unit_price: dec!(10) }];
        let quote = state.quote_service.create(&pool, &quote_payload(&owner, lines)).await.unwrap();
        assert_eq!(test_support::stock_of(&pool, part_id).await, 5);

        state
            .inventory_service
            .adjust_stock(&pool, &StockAdjustmentPayload { part_id, quantity: -4, reason: "Perda".into() })
            .await
            .unwrap();

        let err = state.quote_service.convert(&pool, quote.id).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 1, .. }));

        let orders = test_support::count(&pool, "SELECT COUNT(*) FROM service_orders WHERE quote_id = $1", quote.id).await;
        assert_eq!(orders, 0);
        assert_eq!(test_support::stock_of(&pool, part_id).await, 1);

        let detail = state.quote_service.detail(&pool, quote.id).await.unwrap();
        assert_eq!(detail.quote.status, QuoteStatus::Pending);
        assert_eq!(detail.quote.service_order_id, None);
    }
}
