// src/db/registry_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::registry::{
        Customer, CustomerPayload, Mechanic, MechanicPayload, Part, PartPayload, RegistryFilter,
        SearchHit, ServiceCategory, ServiceCategoryPayload, ServiceType, ServiceTypePayload,
        Supplier, SupplierPayload, Vehicle, VehicleListEntry, VehiclePayload,
    },
};

const CUSTOMER_COLUMNS: &str = "id, name, tax_id, phone, email, address, city, state, zip_code, \
     notes, is_active, created_at, updated_at";

const VEHICLE_COLUMNS: &str =
    "id, customer_id, plate, make, model, year, color, odometer, notes, created_at, updated_at";

const PART_COLUMNS: &str = "id, code, name, description, supplier_id, cost_price, sale_price, \
     stock_quantity, min_stock, location, is_active, created_at, updated_at";

#[derive(Clone, Default)]
pub struct RegistryRepository;

impl RegistryRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        filter: &RegistryFilter,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE ($1::bool IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR tax_id ILIKE $2 OR phone ILIKE $2)
            ORDER BY name
            "#
        );

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(filter.ativo)
            .bind(filter.search_pattern())
            .fetch_all(executor)
            .await?;

        Ok(customers)
    }

    pub async fn find_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("customer"))
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO customers (name, tax_id, phone, email, address, city, state, zip_code, notes, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, TRUE))
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(payload.name.trim())
            .bind(blank_to_none(&payload.tax_id))
            .bind(payload.phone.trim())
            .bind(blank_to_none(&payload.email))
            .bind(&payload.address)
            .bind(&payload.city)
            .bind(&payload.state)
            .bind(&payload.zip_code)
            .bind(&payload.notes)
            .bind(payload.is_active)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE customers
            SET name = $2, tax_id = $3, phone = $4, email = $5, address = $6, city = $7,
                state = $8, zip_code = $9, notes = $10, is_active = COALESCE($11, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(payload.name.trim())
            .bind(blank_to_none(&payload.tax_id))
            .bind(payload.phone.trim())
            .bind(blank_to_none(&payload.email))
            .bind(&payload.address)
            .bind(&payload.city)
            .bind(&payload.state)
            .bind(&payload.zip_code)
            .bind(&payload.notes)
            .bind(payload.is_active)
            .fetch_optional(executor)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AppError::NotFound("customer"))
    }

    // Clientes nunca são apagados: só desativados
    pub async fn deactivate_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE customers SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("customer"));
        }
        Ok(())
    }

    // =========================================================================
    //  VEÍCULOS
    // =========================================================================

    pub async fn list_vehicles<'e, E>(
        &self,
        executor: E,
        filter: &RegistryFilter,
    ) -> Result<Vec<VehicleListEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vehicles = sqlx::query_as::<_, VehicleListEntry>(
            r#"
            SELECT v.id, v.customer_id, v.plate, v.make, v.model, v.year, v.color, v.odometer,
                   v.notes, v.created_at, v.updated_at, c.name AS customer_name
            FROM vehicles v
            JOIN customers c ON c.id = v.customer_id
            WHERE ($1::uuid IS NULL OR v.customer_id = $1)
              AND ($2::text IS NULL OR v.plate ILIKE $2 OR v.model ILIKE $2 OR c.name ILIKE $2)
            ORDER BY v.plate
            "#,
        )
        .bind(filter.cliente_id)
        .bind(filter.search_pattern())
        .fetch_all(executor)
        .await?;

        Ok(vehicles)
    }

    pub async fn list_customer_vehicles<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Vehicle>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE customer_id = $1 ORDER BY plate"
        );

        let vehicles = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(customer_id)
            .fetch_all(executor)
            .await?;

        Ok(vehicles)
    }

    pub async fn find_vehicle<'e, E>(&self, executor: E, id: Uuid) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");

        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("vehicle"))
    }

    pub async fn create_vehicle<'e, E>(
        &self,
        executor: E,
        payload: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO vehicles (customer_id, plate, make, model, year, color, odometer, notes)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), $8)
            RETURNING {VEHICLE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(payload.customer_id)
            .bind(normalize_plate(&payload.plate))
            .bind(payload.make.trim())
            .bind(payload.model.trim())
            .bind(payload.year)
            .bind(&payload.color)
            .bind(payload.odometer)
            .bind(&payload.notes)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)
    }

    pub async fn update_vehicle<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &VehiclePayload,
    ) -> Result<Vehicle, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE vehicles
            SET customer_id = $2, plate = $3, make = $4, model = $5, year = $6, color = $7,
                odometer = COALESCE($8, odometer), notes = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .bind(payload.customer_id)
            .bind(normalize_plate(&payload.plate))
            .bind(payload.make.trim())
            .bind(payload.model.trim())
            .bind(payload.year)
            .bind(&payload.color)
            .bind(payload.odometer)
            .bind(&payload.notes)
            .fetch_optional(executor)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AppError::NotFound("vehicle"))
    }

    /// Hodômetro só avança: leituras menores que a atual são ignoradas.
    pub async fn bump_odometer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        odometer: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE vehicles SET odometer = $2, updated_at = NOW() WHERE id = $1 AND odometer < $2",
        )
        .bind(id)
        .bind(odometer)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn count_vehicle_orders<'e, E>(&self, executor: E, id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM service_orders WHERE vehicle_id = $1")
                .bind(id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    pub async fn delete_vehicle<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("vehicle"));
        }
        Ok(())
    }

    // =========================================================================
    //  MECÂNICOS
    // =========================================================================

    pub async fn list_mechanics<'e, E>(
        &self,
        executor: E,
        filter: &RegistryFilter,
    ) -> Result<Vec<Mechanic>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mechanics = sqlx::query_as::<_, Mechanic>(
            r#"
            SELECT id, name, tax_id, phone, specialty, salary, commission_percent, is_active, created_at
            FROM mechanics
            WHERE ($1::bool IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR specialty ILIKE $2)
            ORDER BY name
            "#,
        )
        .bind(filter.ativo)
        .bind(filter.search_pattern())
        .fetch_all(executor)
        .await?;

        Ok(mechanics)
    }

    pub async fn find_mechanic<'e, E>(&self, executor: E, id: Uuid) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Mechanic>(
            r#"
            SELECT id, name, tax_id, phone, specialty, salary, commission_percent, is_active, created_at
            FROM mechanics WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("mechanic"))
    }

    pub async fn create_mechanic<'e, E>(
        &self,
        executor: E,
        payload: &MechanicPayload,
    ) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Mechanic>(
            r#"
            INSERT INTO mechanics (name, tax_id, phone, specialty, salary, commission_percent, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, TRUE))
            RETURNING id, name, tax_id, phone, specialty, salary, commission_percent, is_active, created_at
            "#,
        )
        .bind(payload.name.trim())
        .bind(blank_to_none(&payload.tax_id))
        .bind(&payload.phone)
        .bind(&payload.specialty)
        .bind(payload.salary)
        .bind(payload.commission_percent.unwrap_or(Decimal::ZERO))
        .bind(payload.is_active)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update_mechanic<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &MechanicPayload,
    ) -> Result<Mechanic, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Mechanic>(
            r#"
            UPDATE mechanics
            SET name = $2, tax_id = $3, phone = $4, specialty = $5, salary = $6,
                commission_percent = COALESCE($7, commission_percent),
                is_active = COALESCE($8, is_active)
            WHERE id = $1
            RETURNING id, name, tax_id, phone, specialty, salary, commission_percent, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(blank_to_none(&payload.tax_id))
        .bind(&payload.phone)
        .bind(&payload.specialty)
        .bind(payload.salary)
        .bind(payload.commission_percent)
        .bind(payload.is_active)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)?
        .ok_or(AppError::NotFound("mechanic"))
    }

    pub async fn deactivate_mechanic<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE mechanics SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("mechanic"));
        }
        Ok(())
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn list_suppliers<'e, E>(
        &self,
        executor: E,
        filter: &RegistryFilter,
    ) -> Result<Vec<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, tax_id, phone, email, contact_name, is_active, created_at
            FROM suppliers
            WHERE ($1::bool IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR tax_id ILIKE $2)
            ORDER BY name
            "#,
        )
        .bind(filter.ativo)
        .bind(filter.search_pattern())
        .fetch_all(executor)
        .await?;

        Ok(suppliers)
    }

    pub async fn find_supplier<'e, E>(&self, executor: E, id: Uuid) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, tax_id, phone, email, contact_name, is_active, created_at
            FROM suppliers WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("supplier"))
    }

    pub async fn create_supplier<'e, E>(
        &self,
        executor: E,
        payload: &SupplierPayload,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, tax_id, phone, email, contact_name, is_active)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
            RETURNING id, name, tax_id, phone, email, contact_name, is_active, created_at
            "#,
        )
        .bind(payload.name.trim())
        .bind(blank_to_none(&payload.tax_id))
        .bind(&payload.phone)
        .bind(blank_to_none(&payload.email))
        .bind(&payload.contact_name)
        .bind(payload.is_active)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn update_supplier<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &SupplierPayload,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $2, tax_id = $3, phone = $4, email = $5, contact_name = $6,
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING id, name, tax_id, phone, email, contact_name, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(blank_to_none(&payload.tax_id))
        .bind(&payload.phone)
        .bind(blank_to_none(&payload.email))
        .bind(&payload.contact_name)
        .bind(payload.is_active)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)?
        .ok_or(AppError::NotFound("supplier"))
    }

    pub async fn deactivate_supplier<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE suppliers SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("supplier"));
        }
        Ok(())
    }

    // =========================================================================
    //  PEÇAS
    // =========================================================================

    pub async fn list_parts<'e, E>(
        &self,
        executor: E,
        filter: &RegistryFilter,
    ) -> Result<Vec<Part>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {PART_COLUMNS}
            FROM parts
            WHERE ($1::bool IS NULL OR is_active = $1)
              AND ($2::text IS NULL OR code ILIKE $2 OR name ILIKE $2)
            ORDER BY name
            "#
        );

        let parts = sqlx::query_as::<_, Part>(&sql)
            .bind(filter.ativo)
            .bind(filter.search_pattern())
            .fetch_all(executor)
            .await?;

        Ok(parts)
    }

    // Peças ativas no ou abaixo do estoque mínimo
    pub async fn list_low_stock_parts<'e, E>(&self, executor: E) -> Result<Vec<Part>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {PART_COLUMNS}
            FROM parts
            WHERE is_active AND stock_quantity <= min_stock
            ORDER BY stock_quantity - min_stock, name
            "#
        );

        let parts = sqlx::query_as::<_, Part>(&sql).fetch_all(executor).await?;

        Ok(parts)
    }

    pub async fn find_part<'e, E>(&self, executor: E, id: Uuid) -> Result<Part, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PART_COLUMNS} FROM parts WHERE id = $1");

        sqlx::query_as::<_, Part>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::NotFound("part"))
    }

    pub async fn create_part<'e, E>(
        &self,
        executor: E,
        payload: &PartPayload,
    ) -> Result<Part, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO parts (
                code, name, description, supplier_id, cost_price, sale_price,
                stock_quantity, min_stock, location, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, TRUE))
            RETURNING {PART_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Part>(&sql)
            .bind(payload.code.trim())
            .bind(payload.name.trim())
            .bind(&payload.description)
            .bind(payload.supplier_id)
            .bind(payload.cost_price.unwrap_or(Decimal::ZERO))
            .bind(payload.sale_price.unwrap_or(Decimal::ZERO))
            .bind(payload.stock_quantity.unwrap_or(0))
            .bind(payload.min_stock.unwrap_or(0))
            .bind(&payload.location)
            .bind(payload.is_active)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)
    }

    // O estoque não é tocado aqui: só movimentações alteram a quantidade
    pub async fn update_part<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &PartPayload,
    ) -> Result<Part, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE parts
            SET code = $2, name = $3, description = $4, supplier_id = $5,
                cost_price = COALESCE($6, cost_price), sale_price = COALESCE($7, sale_price),
                min_stock = COALESCE($8, min_stock), location = $9,
                is_active = COALESCE($10, is_active), updated_at = NOW()
            WHERE id = $1
            RETURNING {PART_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Part>(&sql)
            .bind(id)
            .bind(payload.code.trim())
            .bind(payload.name.trim())
            .bind(&payload.description)
            .bind(payload.supplier_id)
            .bind(payload.cost_price)
            .bind(payload.sale_price)
            .bind(payload.min_stock)
            .bind(&payload.location)
            .bind(payload.is_active)
            .fetch_optional(executor)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AppError::NotFound("part"))
    }

    pub async fn deactivate_part<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("UPDATE parts SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(executor)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("part"));
        }
        Ok(())
    }

    // =========================================================================
    //  CATÁLOGO DE SERVIÇOS
    // =========================================================================

    pub async fn list_categories<'e, E>(&self, executor: E) -> Result<Vec<ServiceCategory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_as::<_, ServiceCategory>(
            "SELECT id, name, description FROM service_categories ORDER BY name",
        )
        .fetch_all(executor)
        .await?;

        Ok(categories)
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        payload: &ServiceCategoryPayload,
    ) -> Result<ServiceCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            INSERT INTO service_categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.description)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
    }

    pub async fn list_service_types<'e, E>(
        &self,
        executor: E,
        filter: &RegistryFilter,
    ) -> Result<Vec<ServiceType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let types = sqlx::query_as::<_, ServiceType>(
            r#"
            SELECT id, category_id, name, description, default_price, estimated_minutes, is_active, created_at
            FROM service_types
            WHERE ($1::bool IS NULL OR is_active = $1)
              AND ($2::uuid IS NULL OR category_id = $2)
              AND ($3::text IS NULL OR name ILIKE $3)
            ORDER BY name
            "#,
        )
        .bind(filter.ativo)
        .bind(filter.categoria_id)
        .bind(filter.search_pattern())
        .fetch_all(executor)
        .await?;

        Ok(types)
    }

    pub async fn find_service_type<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<ServiceType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceType>(
            r#"
            SELECT id, category_id, name, description, default_price, estimated_minutes, is_active, created_at
            FROM service_types WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("service_type"))
    }

    pub async fn create_service_type<'e, E>(
        &self,
        executor: E,
        payload: &ServiceTypePayload,
    ) -> Result<ServiceType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let service_type = sqlx::query_as::<_, ServiceType>(
            r#"
            INSERT INTO service_types (category_id, name, description, default_price, estimated_minutes, is_active)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
            RETURNING id, category_id, name, description, default_price, estimated_minutes, is_active, created_at
            "#,
        )
        .bind(payload.category_id)
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.default_price.unwrap_or(Decimal::ZERO))
        .bind(payload.estimated_minutes)
        .bind(payload.is_active)
        .fetch_one(executor)
        .await?;

        Ok(service_type)
    }

    pub async fn update_service_type<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &ServiceTypePayload,
    ) -> Result<ServiceType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ServiceType>(
            r#"
            UPDATE service_types
            SET category_id = $2, name = $3, description = $4,
                default_price = COALESCE($5, default_price), estimated_minutes = $6,
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING id, category_id, name, description, default_price, estimated_minutes, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(payload.category_id)
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.default_price)
        .bind(payload.estimated_minutes)
        .bind(payload.is_active)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound("service_type"))
    }

    pub async fn deactivate_service_type<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE service_types SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("service_type"));
        }
        Ok(())
    }

    // =========================================================================
    //  BUSCA RÁPIDA
    // =========================================================================

    pub async fn quick_search<'e, E>(
        &self,
        executor: E,
        term: &str,
    ) -> Result<Vec<SearchHit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = format!("%{}%", term.trim());

        let hits = sqlx::query_as::<_, SearchHit>(
            r#"
            (SELECT 'vehicle' AS kind, v.id, v.plate AS label,
                    v.make || ' ' || v.model || ' - ' || c.name AS detail
             FROM vehicles v JOIN customers c ON c.id = v.customer_id
             WHERE v.plate ILIKE $1
             ORDER BY v.plate LIMIT 10)
            UNION ALL
            (SELECT 'customer' AS kind, c.id, c.name AS label, c.phone AS detail
             FROM customers c
             WHERE c.is_active AND c.name ILIKE $1
             ORDER BY c.name LIMIT 10)
            UNION ALL
            (SELECT 'service_order' AS kind, so.id, so.number AS label, c.name AS detail
             FROM service_orders so JOIN customers c ON c.id = so.customer_id
             WHERE so.number ILIKE $1
             ORDER BY so.opened_at DESC LIMIT 10)
            "#,
        )
        .bind(pattern)
        .fetch_all(executor)
        .await?;

        Ok(hits)
    }
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// Placas são guardadas sem traço e em maiúsculas (ABC-1234 -> ABC1234)
fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plates_are_normalized() {
        assert_eq!(normalize_plate("abc-1234"), "ABC1234");
        assert_eq!(normalize_plate(" BRA2E19 "), "BRA2E19");
    }

    #[test]
    fn blank_optional_strings_become_null() {
        assert_eq!(blank_to_none(&Some("  ".into())), None);
        assert_eq!(blank_to_none(&None), None);
        assert_eq!(blank_to_none(&Some(" 123 ".into())), Some("123"));
    }
}
