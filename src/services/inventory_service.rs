// src/services/inventory_service.rs

use chrono::{Datelike, Utc};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        inventory_repo::MovementRecord,
        sequence_repo::prefix,
        InventoryRepository, SequenceRepository, SettingsRepository,
    },
    models::{
        inventory::{
            reference, CreatePurchaseOrderPayload, MovementFilter, PeriodQuery, PurchaseOrder,
            PurchaseOrderDetail, PurchaseOrderFilter, PurchaseOrderStatus, StockAdjustmentPayload, StockAdjustmentResult,
            StockMovement, StockMovementKind, StockStatistics, TurnoverReport, TurnoverTotals,
        },
        lifecycle::StatusMachine,
    },
};

// Origem de uma movimentação gerada por outro módulo (OS, OC, ...)
#[derive(Debug, Clone, Copy)]
pub struct StockReference<'a> {
    pub kind: &'a str,
    pub id: Uuid,
}

/// Saldo depois de um ajuste manual. Nunca negativo nem além de `i32::MAX`.
pub fn resulting_stock(current: i32, delta: i32) -> Result<i32, AppError> {
    let after = current
        .checked_add(delta)
        .ok_or_else(|| AppError::BadRequest("quantity".to_string()))?;
    if after < 0 {
        return Err(AppError::NegativeStock { available: current });
    }
    Ok(after)
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    sequence_repo: SequenceRepository,
    settings_repo: SettingsRepository,
}

impl InventoryService {
    pub fn new(
        repo: InventoryRepository,
        sequence_repo: SequenceRepository,
        settings_repo: SettingsRepository,
    ) -> Self {
        Self { repo, sequence_repo, settings_repo }
    }

    // =========================================================================
    //  SALDO (chamado dentro da transação de quem movimenta)
    // =========================================================================

    /// Baixa `quantity` unidades. Falha sem alterar nada se o saldo não cobre.
    pub async fn consume(
        &self,
        conn: &mut PgConnection,
        part_id: Uuid,
        quantity: i32,
        reason: &str,
        origin: StockReference<'_>,
    ) -> Result<StockMovement, AppError> {
        let stock = self.repo.lock_part_stock(&mut *conn, part_id).await?;
        if stock.stock_quantity < quantity {
            return Err(AppError::InsufficientStock {
                part: stock.name,
                available: stock.stock_quantity,
            });
        }

        let change = self.repo.apply_stock_delta(&mut *conn, part_id, -quantity).await?;
        self.repo
            .record_movement(
                &mut *conn,
                MovementRecord {
                    part_id,
                    kind: StockMovementKind::Out,
                    quantity,
                    change,
                    reason,
                    reference_type: Some(origin.kind),
                    reference_id: Some(origin.id),
                },
            )
            .await
    }

    /// Devolve ao estoque o que uma linha de peça tinha consumido.
    pub async fn give_back(
        &self,
        conn: &mut PgConnection,
        part_id: Uuid,
        quantity: i32,
        reason: &str,
        origin: StockReference<'_>,
    ) -> Result<StockMovement, AppError> {
        self.repo.lock_part_stock(&mut *conn, part_id).await?;
        let change = self.repo.apply_stock_delta(&mut *conn, part_id, quantity).await?;
        self.repo
            .record_movement(
                &mut *conn,
                MovementRecord {
                    part_id,
                    kind: StockMovementKind::Return,
                    quantity,
                    change,
                    reason,
                    reference_type: Some(origin.kind),
                    reference_id: Some(origin.id),
                },
            )
            .await
    }

    // =========================================================================
    //  AJUSTE MANUAL
    // =========================================================================

    pub async fn adjust_stock<'e, E>(
        &self,
        executor: E,
        payload: &StockAdjustmentPayload,
    ) -> Result<StockAdjustmentResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.quantity == 0 {
            return Err(AppError::BadRequest("quantity".to_string()));
        }
        let reason = payload.reason.trim();
        if reason.is_empty() {
            return Err(AppError::MissingField("reason"));
        }

        let mut tx = executor.begin().await?;

        let stock = self.repo.lock_part_stock(&mut *tx, payload.part_id).await?;
        resulting_stock(stock.stock_quantity, payload.quantity)?;

        let change = self.repo.apply_stock_delta(&mut *tx, payload.part_id, payload.quantity).await?;
        let movement = self
            .repo
            .record_movement(
                &mut *tx,
                MovementRecord {
                    part_id: payload.part_id,
                    kind: StockMovementKind::for_delta(payload.quantity),
                    quantity: payload.quantity.abs(),
                    change,
                    reason,
                    reference_type: Some(reference::ADJUSTMENT),
                    reference_id: None,
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📦 Estoque ajustado: peça {} {} -> {}",
            payload.part_id,
            change.stock_before,
            change.stock_after
        );

        Ok(StockAdjustmentResult {
            part_id: payload.part_id,
            stock_before: change.stock_before,
            stock_after: change.stock_after,
            movement,
        })
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_movements(executor, filter, 100).await
    }

    pub async fn part_history<'e, E>(&self, executor: E, part_id: Uuid) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let filter = MovementFilter { peca_id: Some(part_id), ..Default::default() };
        self.repo.list_movements(executor, &filter, 50).await
    }

    pub async fn statistics<'e, E>(&self, executor: E, period: &PeriodQuery) -> Result<StockStatistics, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let settings = self.settings_repo.get_settings(&mut *conn).await?;
        let by_kind = self.repo.movement_stats_by_kind(&mut *conn, period).await?;
        let most_moved = self.repo.most_moved_parts(&mut *conn, period, 10).await?;
        let idle_parts = self.repo.idle_parts(&mut *conn, settings.stock_alert_days).await?;

        Ok(StockStatistics {
            by_kind,
            most_moved,
            idle_parts,
            idle_days: settings.stock_alert_days,
        })
    }

    pub async fn turnover<'e, E>(&self, executor: E, period: &PeriodQuery) -> Result<TurnoverReport, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let start = period.data_inicio.ok_or(AppError::MissingField("data_inicio"))?;
        let end = period.data_fim.ok_or(AppError::MissingField("data_fim"))?;

        let items = self.repo.turnover(executor, start, end).await?;
        let totals = TurnoverTotals::from_entries(&items);

        Ok(TurnoverReport { start, end, items, totals })
    }

    // =========================================================================
    //  ORDENS DE COMPRA
    // =========================================================================

    pub async fn create_purchase_order<'e, E>(
        &self,
        executor: E,
        payload: &CreatePurchaseOrderPayload,
    ) -> Result<PurchaseOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let supplier_name = self.repo.supplier_name(&mut *tx, payload.supplier_id).await?;
        let number = self
            .sequence_repo
            .next_number(&mut *tx, prefix::PURCHASE_ORDER, Utc::now().year())
            .await?;

        let order = self
            .repo
            .create_purchase_order(
                &mut *tx,
                &number,
                payload.supplier_id,
                payload.expected_on,
                payload.notes.as_deref(),
            )
            .await?;

        let mut items = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            items.push(self.repo.add_purchase_item(&mut *tx, order.id, item).await?);
        }
        let order = self.repo.refresh_purchase_total(&mut *tx, order.id).await?;

        tx.commit().await?;

        tracing::info!("🧾 Ordem de compra {} criada", order.number);

        Ok(PurchaseOrderDetail { order, supplier_name, items })
    }

    pub async fn list_purchase_orders<'e, E>(
        &self,
        executor: E,
        filter: &PurchaseOrderFilter,
    ) -> Result<Vec<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_purchase_orders(executor, filter.status).await
    }

    pub async fn purchase_order_detail<'e, E>(&self, executor: E, id: Uuid) -> Result<PurchaseOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let order = self.repo.find_purchase_order(&mut *conn, id).await?;
        let supplier_name = self.repo.supplier_name(&mut *conn, order.supplier_id).await?;
        let items = self.repo.list_purchase_items(&mut *conn, id).await?;

        Ok(PurchaseOrderDetail { order, supplier_name, items })
    }

    /// Muda o status da OC. Chegar em RECEIVED dá entrada nas peças.
    pub async fn change_purchase_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        next: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.repo.lock_purchase_order(&mut *tx, id).await?;
        current.status.ensure_transition(next)?;

        let received_at = (next == PurchaseOrderStatus::Received).then(Utc::now);
        if received_at.is_some() {
            let items = self.repo.list_purchase_items(&mut *tx, id).await?;
            for item in items {
                self.repo.lock_part_stock(&mut *tx, item.part_id).await?;
                let change = self.repo.apply_stock_delta(&mut *tx, item.part_id, item.quantity).await?;
                self.repo
                    .record_movement(
                        &mut *tx,
                        MovementRecord {
                            part_id: item.part_id,
                            kind: StockMovementKind::In,
                            quantity: item.quantity,
                            change,
                            reason: "Recebimento de Ordem de Compra",
                            reference_type: Some(reference::PURCHASE_ORDER),
                            reference_id: Some(id),
                        },
                    )
                    .await?;
            }
        }

        let order = self.repo.set_purchase_status(&mut *tx, id, next, received_at).await?;

        tx.commit().await?;

        tracing::info!("🧾 Ordem de compra {} -> {}", order.number, next.code());

        Ok(order)
    }

    pub async fn receive_purchase_order<'e, E>(&self, executor: E, id: Uuid) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.change_purchase_status(executor, id, PurchaseOrderStatus::Received).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RegistryRepository;
    use crate::models::registry::PartPayload;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    fn service() -> InventoryService {
        InventoryService::new(
            InventoryRepository::new(),
            SequenceRepository::new(),
            SettingsRepository::new(),
        )
    }

    async fn part_with_stock(pool: &PgPool, code: &str, stock: i32) -> Uuid {
        let payload = PartPayload {
            code: code.to_string(),
            name: format!("Peça {code}"),
            description: None,
            supplier_id: None,
            cost_price: Some(dec!(6)),
            sale_price: Some(dec!(10)),
            stock_quantity: Some(stock),
            min_stock: Some(1),
            location: None,
            is_active: None,
        };
        RegistryRepository::new().create_part(pool, &payload).await.unwrap().id
    }

    #[test]
    fn adjustment_result_is_bounded() {
        assert_eq!(resulting_stock(5, -5).unwrap(), 0);
        assert_eq!(resulting_stock(5, 3).unwrap(), 8);
        assert!(matches!(resulting_stock(5, -6), Err(AppError::NegativeStock { available: 5 })));
        assert!(matches!(resulting_stock(5, i32::MAX), Err(AppError::BadRequest(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn oversized_adjustment_is_rejected_without_touching_stock(pool: PgPool) {
        let part_id = part_with_stock(&pool, "FLT-02", 5).await;

        let huge = StockAdjustmentPayload { part_id, quantity: i32::MAX, reason: "Contagem".into() };
        let err = service().adjust_stock(&pool, &huge).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let stock: i32 = sqlx::query_scalar("SELECT stock_quantity FROM parts WHERE id = $1")
            .bind(part_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stock, 5);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn adjustment_cannot_drive_stock_negative(pool: PgPool) {
        let part_id = part_with_stock(&pool, "FLT-01", 3).await;

        let too_much = StockAdjustmentPayload { part_id, quantity: -4, reason: "Perda".into() };
        let err = service().adjust_stock(&pool, &too_much).await.unwrap_err();
        assert!(matches!(err, AppError::NegativeStock { available: 3 }));

        let ok = StockAdjustmentPayload { part_id, quantity: -3, reason: "Perda".into() };
        let result = service().adjust_stock(&pool, &ok).await.unwrap();
        assert_eq!((result.stock_before, result.stock_after), (3, 0));
        assert_eq!(result.movement.kind, StockMovementKind::Out);
        assert_eq!(result.movement.quantity, 3);
    }
}
