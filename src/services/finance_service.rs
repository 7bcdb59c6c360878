// src/services/finance_service.rs

use chrono::{NaiveDate, Utc};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        finance_repo::{NewCashFlowEntry, NewPayable, NewReceivable},
        FinanceRepository,
    },
    models::finance::{
        Account, CashFlowDay, CashFlowFilter, CashFlowKind, CreatePayablePayload,
        CreateReceivablePayload, FinanceSummary, Payable, PayableFilter, PayableStatus,
        Receivable, ReceivableFilter, ReceivableStatus, SettlementPayload,
        with_running_balance,
    },
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Só títulos em aberto (vencidos inclusive) aceitam baixa.
pub fn ensure_receivable_open(receivable: &Receivable) -> Result<(), AppError> {
    match receivable.status {
        ReceivableStatus::Open | ReceivableStatus::Overdue => Ok(()),
        ReceivableStatus::Received | ReceivableStatus::Cancelled => Err(AppError::DocumentClosed),
    }
}

pub fn ensure_payable_open(payable: &Payable) -> Result<(), AppError> {
    match payable.status {
        PayableStatus::Open | PayableStatus::Overdue => Ok(()),
        PayableStatus::Paid | PayableStatus::Cancelled => Err(AppError::DocumentClosed),
    }
}

#[derive(Clone)]
pub struct FinanceService {
    repo: FinanceRepository,
}

impl FinanceService {
    pub fn new(repo: FinanceRepository) -> Self {
        Self { repo }
    }

    pub async fn accounts<'e, E>(&self, executor: E) -> Result<Vec<Account>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_accounts(executor).await
    }

    // =========================================================================
    //  CONTAS A RECEBER
    // =========================================================================

    pub async fn list_receivables<'e, E>(
        &self,
        executor: E,
        filter: &ReceivableFilter,
    ) -> Result<Vec<Receivable>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_receivables(executor, filter).await
    }

    pub async fn create_receivable<'e, E>(
        &self,
        executor: E,
        payload: &CreateReceivablePayload,
    ) -> Result<Receivable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new = NewReceivable {
            description: payload.description.trim().to_string(),
            customer_id: payload.customer_id,
            service_order_id: payload.service_order_id,
            account_id: payload.account_id,
            amount: payload.amount,
            issued_on: payload.issued_on.unwrap_or_else(today),
            due_on: payload.due_on,
            notes: payload.notes.clone(),
        };
        self.repo.create_receivable(executor, &new).await
    }

    /// Baixa o título e lança a entrada no fluxo de caixa.
    pub async fn receive<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &SettlementPayload,
    ) -> Result<Receivable, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.repo.find_receivable(&mut *tx, id).await?;
        ensure_receivable_open(&current)?;

        let date = payload.date.unwrap_or_else(today);
        let receivable = self
            .repo
            .settle_receivable(&mut *tx, id, date, payload.payment_method.as_deref())
            .await?;

        self.repo
            .insert_cash_flow(
                &mut *tx,
                &NewCashFlowEntry {
                    kind: CashFlowKind::Inflow,
                    description: &receivable.description,
                    amount: receivable.amount,
                    entry_date: date,
                    account_id: receivable.account_id,
                    receivable_id: Some(receivable.id),
                    payable_id: None,
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("💰 Recebimento registrado: {} (R$ {})", receivable.description, receivable.amount);

        Ok(receivable)
    }

    // =========================================================================
    //  CONTAS A PAGAR
    // =========================================================================

    pub async fn list_payables<'e, E>(
        &self,
        executor: E,
        filter: &PayableFilter,
    ) -> Result<Vec<Payable>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_payables(executor, filter).await
    }

    pub async fn create_payable<'e, E>(
        &self,
        executor: E,
        payload: &CreatePayablePayload,
    ) -> Result<Payable, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new = NewPayable {
            description: payload.description.trim().to_string(),
            supplier_id: payload.supplier_id,
            purchase_order_id: payload.purchase_order_id,
            account_id: payload.account_id,
            amount: payload.amount,
            issued_on: payload.issued_on.unwrap_or_else(today),
            due_on: payload.due_on,
            notes: payload.notes.clone(),
        };
        self.repo.create_payable(executor, &new).await
    }

    pub async fn pay<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &SettlementPayload,
    ) -> Result<Payable, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self.repo.find_payable(&mut *tx, id).await?;
        ensure_payable_open(&current)?;

        let date = payload.date.unwrap_or_else(today);
        let payable = self
            .repo
            .settle_payable(&mut *tx, id, date, payload.payment_method.as_deref())
            .await?;

        self.repo
            .insert_cash_flow(
                &mut *tx,
                &NewCashFlowEntry {
                    kind: CashFlowKind::Outflow,
                    description: &payable.description,
                    amount: payable.amount,
                    entry_date: date,
                    account_id: payable.account_id,
                    receivable_id: None,
                    payable_id: Some(payable.id),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!("💸 Pagamento registrado: {} (R$ {})", payable.description, payable.amount);

        Ok(payable)
    }

    // =========================================================================
    //  FLUXO DE CAIXA E RESUMO
    // =========================================================================

    pub async fn cash_flow<'e, E>(
        &self,
        executor: E,
        filter: &CashFlowFilter,
    ) -> Result<Vec<CashFlowDay>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let days = self.repo.cash_flow_by_day(executor, filter).await?;
        Ok(with_running_balance(days))
    }

    pub async fn summary<'e, E>(&self, executor: E) -> Result<FinanceSummary, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let receivables = self.repo.receivable_totals(&mut *conn).await?;
        let payables = self.repo.payable_totals(&mut *conn).await?;
        let current_month = self.repo.month_cash_flow(&mut *conn).await?;

        Ok(FinanceSummary { receivables, payables, current_month })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn receivable(status: ReceivableStatus) -> Receivable {
        Receivable {
            id: Uuid::new_v4(),
            description: "OS OS2026-0001 - Jane".into(),
            customer_id: None,
            customer_name: None,
            service_order_id: None,
            service_order_number: None,
            account_id: None,
            account_name: None,
            amount: dec!(20),
            issued_on: today(),
            due_on: today(),
            received_on: None,
            status,
            payment_method: None,
            notes: None,
            created_at: Utc::now(),
            overdue: false,
            days_overdue: 0,
        }
    }

    #[test]
    fn only_open_receivables_can_be_settled() {
        assert!(ensure_receivable_open(&receivable(ReceivableStatus::Open)).is_ok());
        assert!(ensure_receivable_open(&receivable(ReceivableStatus::Overdue)).is_ok());
        assert!(matches!(
            ensure_receivable_open(&receivable(ReceivableStatus::Received)),
            Err(AppError::DocumentClosed)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn receiving_writes_an_inflow_entry(pool: sqlx::PgPool) {
        let service = FinanceService::new(FinanceRepository::new());
        let created = service
            .create_receivable(
                &pool,
                &CreateReceivablePayload {
                    description: "Serviço avulso".into(),
                    customer_id: None,
                    service_order_id: None,
                    account_id: None,
                    amount: dec!(150),
                    issued_on: None,
                    due_on: today(),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let received = service.receive(&pool, created.id, &SettlementPayload::default()).await.unwrap();
        assert_eq!(received.status, ReceivableStatus::Received);
        assert_eq!(received.received_on, Some(today()));

        let flow = service.cash_flow(&pool, &CashFlowFilter::default()).await.unwrap();
        assert_eq!(flow.last().map(|d| d.running_balance), Some(dec!(150)));

        let again = service.receive(&pool, created.id, &SettlementPayload::default()).await;
        assert!(matches!(again, Err(AppError::DocumentClosed)));
    }
}
