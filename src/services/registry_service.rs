// src/services/registry_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RegistryRepository,
    models::registry::{CustomerDetail, SearchHit, Vehicle, VehiclePayload},
};

// Termos menores que isso não disparam a busca rápida
const MIN_SEARCH_LEN: usize = 2;

/// Regras de cadastro que envolvem mais de uma tabela. O CRUD simples vai
/// direto ao repositório.
#[derive(Clone)]
pub struct RegistryService {
    repo: RegistryRepository,
}

impl RegistryService {
    pub fn new(repo: RegistryRepository) -> Self {
        Self { repo }
    }

    pub async fn customer_detail<'e, E>(&self, executor: E, id: Uuid) -> Result<CustomerDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let customer = self.repo.find_customer(&mut *conn, id).await?;
        let vehicles = self.repo.list_customer_vehicles(&mut *conn, id).await?;

        Ok(CustomerDetail { customer, vehicles })
    }

    pub async fn create_vehicle<'e, E>(&self, executor: E, payload: &VehiclePayload) -> Result<Vehicle, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.repo.find_customer(&mut *conn, payload.customer_id).await?;
        let vehicle = self.repo.create_vehicle(&mut *conn, payload).await?;

        tracing::info!("🚗 Veículo {} cadastrado", vehicle.plate);
        Ok(vehicle)
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.repo.find_customer(&mut *conn, payload.customer_id).await?;
        self.repo.update_vehicle(&mut *conn, id, payload).await
    }

    /// Veículo com OS vinculada não pode ser apagado.
    pub async fn delete_vehicle<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.repo.find_vehicle(&mut *tx, id).await?;
        if self.repo.count_vehicle_orders(&mut *tx, id).await? > 0 {
            return Err(AppError::VehicleHasOrders);
        }
        self.repo.delete_vehicle(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn quick_search<'e, E>(&self, executor: E, term: &str) -> Result<Vec<SearchHit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        self.repo.quick_search(executor, term).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registry::CustomerPayload;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn vehicle_with_orders_cannot_be_deleted(pool: PgPool) {
        let repo = RegistryRepository::new();
        let service = RegistryService::new(repo.clone());

        let customer = repo
            .create_customer(
                &pool,
                &CustomerPayload {
                    name: "Jane".into(),
                    tax_id: None,
                    phone: "555-0100".into(),
                    email: None,
                    address: None,
                    city: None,
                    state: None,
                    zip_code: None,
                    notes: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();

        let vehicle = service
            .create_vehicle(
                &pool,
                &VehiclePayload {
                    customer_id: customer.id,
                    plate: "abc-1234".into(),
                    make: "VW".into(),
                    model: "Gol".into(),
                    year: None,
                    color: None,
                    odometer: None,
                    notes: None,
                },
            )
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO service_orders (number, customer_id, vehicle_id) VALUES ('OS2026-0001', $1, $2)",
        )
        .bind(customer.id)
        .bind(vehicle.id)
        .execute(&pool)
        .await
        .unwrap();

        let err = service.delete_vehicle(&pool, vehicle.id).await.unwrap_err();
        assert!(matches!(err, AppError::VehicleHasOrders));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn short_terms_return_nothing(pool: PgPool) {
        let service = RegistryService::new(RegistryRepository::new());
        assert!(service.quick_search(&pool, " a ").await.unwrap().is_empty());
    }
}
