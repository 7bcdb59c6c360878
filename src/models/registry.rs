// src/models/registry.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Filtro comum das listagens de cadastro
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistryFilter {
    /// Busca parcial por nome, documento, placa ou código
    pub busca: Option<String>,
    pub ativo: Option<bool>,
    pub cliente_id: Option<Uuid>,
    pub categoria_id: Option<Uuid>,
}

impl RegistryFilter {
    // Padrão ILIKE já com curingas, ou None quando a busca está vazia
    pub fn search_pattern(&self) -> Option<String> {
        self.busca
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub q: String,
}

// =============================================================================
//  CLIENTES E VEÍCULOS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "123.456.789-00")]
    pub tax_id: Option<String>,
    #[schema(example = "555-0100")]
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub tax_id: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub phone: String,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "ABC1234")]
    pub plate: String,
    #[schema(example = "Volkswagen")]
    pub make: String,
    #[schema(example = "Gol")]
    pub model: String,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub odometer: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListEntry {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub vehicle: Vehicle,
    pub customer_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub plate: String,
    #[validate(length(min = 1, message = "required"))]
    pub make: String,
    #[validate(length(min = 1, message = "required"))]
    pub model: String,
    pub year: Option<i32>,
    pub color: Option<String>,
    #[validate(range(min = 0, message = "positive"))]
    pub odometer: Option<i32>,
    pub notes: Option<String>,
}

// =============================================================================
//  EQUIPE E FORNECEDORES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mechanic {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Suspensão")]
    pub specialty: Option<String>,
    pub salary: Option<Decimal>,
    #[schema(example = "10.00")]
    pub commission_percent: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MechanicPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub salary: Option<Decimal>,
    pub commission_percent: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "email"))]
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
//  PEÇAS E CATÁLOGO DE SERVIÇOS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: Uuid,
    #[schema(example = "FLT-001")]
    pub code: String,
    #[schema(example = "Filtro de óleo")]
    pub name: String,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    #[schema(example = "18.50")]
    pub cost_price: Decimal,
    #[schema(example = "35.00")]
    pub sale_price: Decimal,
    #[schema(example = 12)]
    pub stock_quantity: i32,
    #[schema(example = 5)]
    pub min_stock: i32,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartPayload {
    #[validate(length(min = 1, message = "required"))]
    pub code: String,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub cost_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    // Só vale na criação. Depois disso o estoque muda por movimentação.
    #[validate(range(min = 0, message = "positive"))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0, message = "positive"))]
    pub min_stock: Option<i32>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceType {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    #[schema(example = "Troca de óleo")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "80.00")]
    pub default_price: Decimal,
    pub estimated_minutes: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypePayload {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    pub default_price: Option<Decimal>,
    pub estimated_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategoryPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub description: Option<String>,
}

// Busca rápida (placa, nome do cliente, número da OS)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[schema(example = "vehicle")]
    pub kind: String,
    pub id: Uuid,
    pub label: String,
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_ignored() {
        let filter = RegistryFilter { busca: Some("   ".into()), ..Default::default() };
        assert_eq!(filter.search_pattern(), None);

        let filter = RegistryFilter { busca: Some(" abc1234 ".into()), ..Default::default() };
        assert_eq!(filter.search_pattern().as_deref(), Some("%abc1234%"));
    }

    #[test]
    fn customer_payload_requires_name_and_phone() {
        let payload = CustomerPayload {
            name: String::new(),
            tax_id: None,
            phone: String::new(),
            email: Some("nao-e-email".into()),
            address: None,
            city: None,
            state: None,
            zip_code: None,
            notes: None,
            is_active: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("email"));
    }
}
