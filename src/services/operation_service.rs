// src/services/operation_service.rs

use chrono::{Datelike, Utc};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        line_repo::ORDER_LINES,
        operations_repo::NewServiceOrder,
        sequence_repo::prefix,
        CrmRepository, LineRepository, OperationsRepository, RegistryRepository, SequenceRepository,
    },
    models::{
        crm::{history_kind, NewHistoryEntry},
        inventory::reference,
        lifecycle::StatusMachine,
        operations::{
            AddPartLinePayload, AddServiceLinePayload, ChecklistItem, ChecklistStatus, Communication,
            CommunicationChannel, CommunicationPayload, CreateServiceOrderPayload, KanbanColumn,
            Pagination, PartLine, ServiceLine, ServiceOrder, ServiceOrderDetail, ServiceOrderFilter,
            ServiceOrderPage, ServiceOrderStatus, UpdateServiceOrderPayload,
        },
    },
    services::{
        inventory_service::{InventoryService, StockReference},
        order_events::{OrderEvents, OrderFinalized},
        upload_storage::UploadStorage,
    },
};

/// Linhas só mudam enquanto a OS não foi finalizada nem cancelada.
pub fn ensure_open(order: &ServiceOrder) -> Result<(), AppError> {
    if order.status.is_terminal() {
        return Err(AppError::DocumentClosed);
    }
    Ok(())
}

pub fn status_message(status: ServiceOrderStatus) -> String {
    format!("Status alterado para: {}", status.label())
}

// Foto enviada junto com o item de checklist
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct ChecklistInput {
    pub item: String,
    pub status: ChecklistStatus,
    pub notes: Option<String>,
    pub photo: Option<PhotoUpload>,
}

#[derive(Clone)]
pub struct OperationsService {
    repo: OperationsRepository,
    line_repo: LineRepository,
    sequence_repo: SequenceRepository,
    registry_repo: RegistryRepository,
    crm_repo: CrmRepository,
    inventory: InventoryService,
    events: OrderEvents,
    uploads: UploadStorage,
}

impl OperationsService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: OperationsRepository,
        line_repo: LineRepository,
        sequence_repo: SequenceRepository,
        registry_repo: RegistryRepository,
        crm_repo: CrmRepository,
        inventory: InventoryService,
        events: OrderEvents,
        uploads: UploadStorage,
    ) -> Self {
        Self { repo, line_repo, sequence_repo, registry_repo, crm_repo, inventory, events, uploads }
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list<'e, E>(&self, executor: E, filter: &ServiceOrderFilter) -> Result<ServiceOrderPage, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let data = self.repo.list_orders(&mut *conn, filter).await?;
        let total = self.repo.count_orders(&mut *conn, filter).await?;

        Ok(ServiceOrderPage {
            data,
            pagination: Pagination::new(filter.page(), filter.limit(), total),
        })
    }

    pub async fn kanban<'e, E>(&self, executor: E) -> Result<Vec<KanbanColumn>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let open = self.repo.list_open_orders(executor).await?;

        let columns = ServiceOrderStatus::OPEN
            .into_iter()
            .map(|status| KanbanColumn {
                status,
                label: status.label().to_string(),
                orders: open.iter().filter(|o| o.status == status).cloned().collect(),
            })
            .collect();

        Ok(columns)
    }

    pub async fn detail<'e, E>(&self, executor: E, id: Uuid) -> Result<ServiceOrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let order = self.repo.find_order(&mut *conn, id).await?;
        let party = self.repo.find_party(&mut *conn, id).await?;
        let services = self.line_repo.list_services(&mut *conn, &ORDER_LINES, id).await?;
        let parts = self.line_repo.list_parts(&mut *conn, &ORDER_LINES, id).await?;
        let checklist = self.repo.list_checklist(&mut *conn, id).await?;
        let history = self.repo.list_communications(&mut *conn, id).await?;

        Ok(ServiceOrderDetail { order, party, services, parts, checklist, history })
    }

    // =========================================================================
    //  ABERTURA E ATUALIZAÇÃO
    // =========================================================================

    /// Abre a OS dentro da transação do chamador (cadastro manual ou conversão de orçamento).
    pub async fn open(&self, conn: &mut PgConnection, new: &NewServiceOrder) -> Result<ServiceOrder, AppError> {
        let vehicle = self.registry_repo.find_vehicle(&mut *conn, new.vehicle_id).await?;
        if vehicle.customer_id != new.customer_id {
            return Err(AppError::BadRequest("vehicle_owner".to_string()));
        }

        let number = self
            .sequence_repo
            .next_number(&mut *conn, prefix::SERVICE_ORDER, Utc::now().year())
            .await?;
        let order = self.repo.create_order(&mut *conn, &number, new).await?;

        self.repo
            .add_communication(
                &mut *conn,
                order.id,
                CommunicationChannel::System,
                &format!("OS {} criada", order.number),
                None,
            )
            .await?;
        self.crm_repo
            .insert_history(
                &mut *conn,
                &NewHistoryEntry::system(
                    order.customer_id,
                    history_kind::ORDER_CREATED,
                    format!("OS {} aberta para o veículo {}", order.number, vehicle.plate),
                    Some(order.id),
                ),
            )
            .await?;

        if let Some(odometer) = new.odometer_in {
            self.registry_repo.bump_odometer(&mut *conn, vehicle.id, odometer).await?;
        }

        tracing::info!("🔧 OS {} criada", order.number);

        Ok(order)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateServiceOrderPayload) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .open(
                &mut tx,
                &NewServiceOrder {
                    customer_id: payload.customer_id,
                    vehicle_id: payload.vehicle_id,
                    mechanic_id: payload.mechanic_id,
                    quote_id: None,
                    problem_reported: payload.problem_reported.clone(),
                    notes: payload.notes.clone(),
                    odometer_in: payload.odometer_in,
                    expected_on: payload.expected_on,
                    discount: Default::default(),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateServiceOrderPayload,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.repo.lock_order(&mut *tx, id).await?;
        ensure_open(&order)?;

        self.repo.update_order(&mut *tx, id, payload).await?;
        self.line_repo.recompute_totals(&mut *tx, &ORDER_LINES, id).await?;
        let order = self.repo.find_order(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(order)
    }

    // =========================================================================
    //  STATUS
    // =========================================================================

    /// Cancelar devolve as peças ao estoque; finalizar publica `OrderFinalized`
    /// na mesma transação.
    pub async fn change_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        next: ServiceOrderStatus,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.repo.lock_order(&mut *tx, id).await?;
        current.status.ensure_transition(next)?;

        if next == ServiceOrderStatus::Cancelled {
            let reason = format!("Cancelamento da OS {}", current.number);
            let origin = StockReference { kind: reference::SERVICE_ORDER, id };
            for line in self.line_repo.list_parts(&mut *tx, &ORDER_LINES, id).await? {
                self.inventory.give_back(&mut tx, line.part_id, line.quantity, &reason, origin).await?;
            }
        }

        let closed_at = (next == ServiceOrderStatus::Finalized).then(Utc::now);
        let order = self.repo.set_status(&mut *tx, id, next, closed_at).await?;

        self.repo
            .add_communication(&mut *tx, id, CommunicationChannel::System, &status_message(next), None)
            .await?;

        if next == ServiceOrderStatus::Finalized {
            let party = self.repo.find_party(&mut *tx, id).await?;
            let service_names = self.repo.service_names(&mut *tx, id).await?;

            let event = OrderFinalized {
                order_id: order.id,
                order_number: order.number.clone(),
                customer_id: order.customer_id,
                customer_name: party.customer_name,
                vehicle_id: order.vehicle_id,
                odometer: order.odometer_in,
                total: order.total,
                service_names,
                finalized_at: order.closed_at.unwrap_or_else(Utc::now),
            };
            self.events.publish(&mut tx, &event).await?;
        }

        tx.commit().await?;

        tracing::info!("🔧 OS {}: {} -> {}", order.number, current.status.code(), next.code());

        Ok(order)
    }

    // =========================================================================
    //  LINHAS
    // =========================================================================

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

        let order = self.repo.lock_order(&mut *tx, id).await?;
        ensure_open(&order)?;

        let line = self.line_repo.insert_service(&mut *tx, &ORDER_LINES, id, payload).await?;
        self.line_repo.recompute_totals(&mut *tx, &ORDER_LINES, id).await?;

        tx.commit().await?;
        Ok(line)
    }

    /// Baixa o estoque junto com a linha; sem saldo nada é gravado.
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

        let order = self.repo.lock_order(&mut *tx, id).await?;
        ensure_open(&order)?;

        self.inventory
            .consume(
                &mut tx,
                payload.part_id,
                payload.quantity,
                &format!("Utilizado na OS {}", order.number),
                StockReference { kind: reference::SERVICE_ORDER, id },
            )
            .await?;
        let line = self.line_repo.insert_part(&mut *tx, &ORDER_LINES, id, payload).await?;
        self.line_repo.recompute_totals(&mut *tx, &ORDER_LINES, id).await?;

        tx.commit().await?;
        Ok(line)
    }

    pub async fn remove_service_line<'e, E>(&self, executor: E, id: Uuid, line_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.repo.lock_order(&mut *tx, id).await?;
        ensure_open(&order)?;

        self.line_repo.delete_service(&mut *tx, &ORDER_LINES, id, line_id).await?;
        self.line_repo.recompute_totals(&mut *tx, &ORDER_LINES, id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a linha e devolve exatamente a quantidade que ela consumiu.
    pub async fn remove_part_line<'e, E>(&self, executor: E, id: Uuid, line_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.repo.lock_order(&mut *tx, id).await?;
        ensure_open(&order)?;

        let removed = self.line_repo.delete_part(&mut *tx, &ORDER_LINES, id, line_id).await?;
        self.inventory
            .give_back(
                &mut tx,
                removed.part_id,
                removed.quantity,
                &format!("Removido da OS {}", order.number),
                StockReference { kind: reference::SERVICE_ORDER, id },
            )
            .await?;
        self.line_repo.recompute_totals(&mut *tx, &ORDER_LINES, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  CHECKLIST E COMUNICAÇÃO
    // =========================================================================

    pub async fn add_checklist_item<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: ChecklistInput,
    ) -> Result<ChecklistItem, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let item = input.item.trim();
        if item.is_empty() {
            return Err(AppError::MissingField("item"));
        }

        let mut conn = executor.acquire().await?;
        self.repo.find_order(&mut *conn, id).await?;

        let photo_path = match &input.photo {
            Some(photo) => Some(self.uploads.store_checklist_photo(&photo.file_name, &photo.bytes).await?),
            None => None,
        };

        self.repo
            .add_checklist_item(&mut *conn, id, item, input.status, input.notes.as_deref(), photo_path.as_deref())
            .await
    }

    pub async fn add_communication<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &CommunicationPayload,
    ) -> Result<Communication, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.repo.find_order(&mut *conn, id).await?;

        self.repo
            .add_communication(&mut *conn, id, payload.channel, &payload.message, payload.sent_by.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::sequence_repo::format_document_number, test_support};
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    #[test]
    fn status_message_uses_label() {
        assert_eq!(status_message(ServiceOrderStatus::InRepair), "Status alterado para: Em Reparo");
    }

    fn part_line(part_id: Uuid, quantity: i32) -> AddPartLinePayload {
        AddPartLinePayload { part_id, quantity, unit_price: dec!(10) }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn part_line_beyond_stock_changes_nothing(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let part_id = test_support::part_with_stock(&state, "VEL-001", 5).await;
        let order = test_support::open_order(&state, &owner).await;

        let err = state.operations_service.add_part_line(&pool, order.id, &part_line(part_id, 6)).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 5, .. }));

        assert_eq!(test_support::stock_of(&pool, part_id).await, 5);
        let detail = state.operations_service.detail(&pool, order.id).await.unwrap();
        assert!(detail.parts.is_empty());
        assert_eq!(detail.order.total, dec!(0));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn removing_part_line_gives_back_exactly_what_it_used(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let part_id = test_support::part_with_stock(&state, "VEL-001", 5).await;
        let order = test_support::open_order(&state, &owner).await;

        let first = state.operations_service.add_part_line(&pool, order.id, &part_line(part_id, 2)).await.unwrap();
        state.operations_service.add_part_line(&pool, order.id, &part_line(part_id, 1)).await.unwrap();
        assert_eq!(test_support::stock_of(&pool, part_id).await, 2);

        state.operations_service.remove_part_line(&pool, order.id, first.id).await.unwrap();

        assert_eq!(test_support::stock_of(&pool, part_id).await, 4);
        let detail = state.operations_service.detail(&pool, order.id).await.unwrap();
        assert_eq!(detail.parts.len(), 1);
        assert_eq!(detail.order.total, dec!(10));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn cancelled_order_returns_stock_and_closes(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let part_id = test_support::part_with_stock(&state, "VEL-001", 5).await;
        let order = test_support::open_order(&state, &owner).await;

        state.operations_service.add_part_line(&pool, order.id, &part_line(part_id, 3)).await.unwrap();
        assert_eq!(test_support::stock_of(&pool, part_id).await, 2);

        state.operations_service.change_status(&pool, order.id, ServiceOrderStatus::Cancelled).await.unwrap();

        assert_eq!(test_support::stock_of(&pool, part_id).await, 5);
        let returns = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM stock_movements WHERE part_id = $1 AND kind = 'RETURN'",
            part_id,
        )
        .await;
        assert_eq!(returns, 1);

        let err = state.operations_service.add_part_line(&pool, order.id, &part_line(part_id, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::DocumentClosed));
        let err = state
            .operations_service
            .change_status(&pool, order.id, ServiceOrderStatus::AwaitingApproval)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn order_numbers_follow_the_yearly_counter(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let year = Utc::now().year();

        let first = test_support::open_order(&state, &owner).await;
        let second = test_support::open_order(&state, &owner).await;

        assert_eq!(first.number, format_document_number(prefix::SERVICE_ORDER, year, 1));
        assert_eq!(second.number, format_document_number(prefix::SERVICE_ORDER, year, 2));
        assert_eq!(first.status, ServiceOrderStatus::AwaitingDiagnosis);
    }
}
