// src/test_support.rs

use std::sync::Arc;

use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::{AppConfig, AppState},
    models::{
        operations::{CreateServiceOrderPayload, ServiceOrder, ServiceOrderStatus},
        registry::{CustomerPayload, PartPayload, ServiceTypePayload, VehiclePayload},
    },
    services::notification_sender::RecordingSender,
};

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        bind_addr: "127.0.0.1:0".into(),
        upload_dir: std::env::temp_dir().join("tgest-uploads").display().to_string(),
        fonts_dir: "./fonts".into(),
    }
}

pub fn app_state(pool: &PgPool) -> AppState {
    AppState::build(pool.clone(), &test_config(), Arc::new(RecordingSender::delivering()))
}

pub struct Owner {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
}

pub async fn customer_with_vehicle(state: &AppState, plate: &str) -> Owner {
    let customer = state
        .registry_repo
        .create_customer(
            &state.db_pool,
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

    let vehicle = state
        .registry_service
        .create_vehicle(
            &state.db_pool,
            &VehiclePayload {
                customer_id: customer.id,
                plate: plate.into(),
                make: "Fiat".into(),
                model: "Uno".into(),
                year: None,
                color: None,
                odometer: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    Owner { customer_id: customer.id, vehicle_id: vehicle.id }
}

pub async fn part_with_stock(state: &AppState, code: &str, stock: i32) -> Uuid {
    state
        .registry_repo
        .create_part(
            &state.db_pool,
            &PartPayload {
                code: code.into(),
                name: format!("Peça {code}"),
                description: None,
                supplier_id: None,
                cost_price: Some(dec!(6)),
                sale_price: Some(dec!(10)),
                stock_quantity: Some(stock),
                min_stock: None,
                location: None,
                is_active: None,
            },
        )
        .await
        .unwrap()
        .id
}

pub async fn service_type(state: &AppState, name: &str) -> Uuid {
    state
        .registry_repo
        .create_service_type(
            &state.db_pool,
            &ServiceTypePayload {
                category_id: None,
                name: name.into(),
                description: None,
                default_price: Some(dec!(120)),
                estimated_minutes: None,
                is_active: None,
            },
        )
        .await
        .unwrap()
        .id
}

pub async fn open_order(state: &AppState, owner: &Owner) -> ServiceOrder {
    state
        .operations_service
        .create(
            &state.db_pool,
            &CreateServiceOrderPayload {
                customer_id: owner.customer_id,
                vehicle_id: owner.vehicle_id,
                mechanic_id: None,
                expected_on: None,
                odometer_in: Some(42_000),
                problem_reported: None,
                notes: None,
            },
        )
        .await
        .unwrap()
}

/// Leva a OS pelo caminho completo até FINALIZED.
pub async fn finalize(state: &AppState, order_id: Uuid) {
    for next in [
        ServiceOrderStatus::AwaitingApproval,
        ServiceOrderStatus::InRepair,
        ServiceOrderStatus::ReadyForPickup,
        ServiceOrderStatus::Finalized,
    ] {
        state.operations_service.change_status(&state.db_pool, order_id, next).await.unwrap();
    }
}

pub async fn stock_of(pool: &PgPool, part_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM parts WHERE id = $1")
        .bind(part_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}
