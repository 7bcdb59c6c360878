// src/handlers/registry.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::registry::{
        Customer, CustomerDetail, CustomerPayload, Mechanic, MechanicPayload, Part, PartPayload,
        RegistryFilter, SearchHit, SearchQuery, ServiceCategory, ServiceCategoryPayload,
        ServiceType, ServiceTypePayload, Supplier, SupplierPayload, Vehicle, VehicleListEntry,
        VehiclePayload,
    },
};

// =============================================================================
//  CLIENTES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Cadastros",
    params(RegistryFilter),
    responses((status = 200, description = "Clientes", body = Vec<Customer>))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .registry_repo
        .list_customers(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com seus veículos", body = CustomerDetail),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .registry_service
        .customer_detail(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    post,
    path = "/api/clientes",
    tag = "Cadastros",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 409, description = "Documento já cadastrado")
    )
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .registry_repo
        .create_customer(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses((status = 200, description = "Cliente atualizado", body = Customer))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .registry_repo
        .update_customer(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// Exclusão lógica: o cliente some das listagens mas o histórico fica
#[utoipa::path(
    delete,
    path = "/api/clientes/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 204, description = "Cliente desativado"))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .registry_repo
        .deactivate_customer(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/clientes/{id}/veiculos",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Veículos do cliente", body = Vec<Vehicle>))
)]
pub async fn list_customer_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicles = app_state
        .registry_repo
        .list_customer_vehicles(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicles)))
}

// =============================================================================
//  VEÍCULOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/veiculos",
    tag = "Cadastros",
    params(RegistryFilter),
    responses((status = 200, description = "Veículos com o nome do dono", body = Vec<VehicleListEntry>))
)]
pub async fn list_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicles = app_state
        .registry_repo
        .list_vehicles(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicles)))
}

#[utoipa::path(
    get,
    path = "/api/veiculos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do veículo")),
    responses((status = 200, description = "Veículo", body = Vehicle))
)]
pub async fn get_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let vehicle = app_state
        .registry_repo
        .find_vehicle(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

#[utoipa::path(
    post,
    path = "/api/veiculos",
    tag = "Cadastros",
    request_body = VehiclePayload,
    responses(
        (status = 201, description = "Veículo criado", body = Vehicle),
        (status = 409, description = "Placa já cadastrada")
    )
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<VehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .registry_service
        .create_vehicle(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

#[utoipa::path(
    put,
    path = "/api/veiculos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do veículo")),
    request_body = VehiclePayload,
    responses((status = 200, description = "Veículo atualizado", body = Vehicle))
)]
pub async fn update_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<VehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .registry_service
        .update_vehicle(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(vehicle)))
}

#[utoipa::path(
    delete,
    path = "/api/veiculos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do veículo")),
    responses(
        (status = 204, description = "Veículo excluído"),
        (status = 409, description = "Veículo possui ordens de serviço")
    )
)]
pub async fn delete_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .registry_service
        .delete_vehicle(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  MECÂNICOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/mecanicos",
    tag = "Cadastros",
    params(RegistryFilter),
    responses((status = 200, description = "Mecânicos", body = Vec<Mechanic>))
)]
pub async fn list_mechanics(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mechanics = app_state
        .registry_repo
        .list_mechanics(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanics)))
}

#[utoipa::path(
    get,
    path = "/api/mecanicos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do mecânico")),
    responses((status = 200, description = "Mecânico", body = Mechanic))
)]
pub async fn get_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mechanic = app_state
        .registry_repo
        .find_mechanic(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanic)))
}

#[utoipa::path(
    post,
    path = "/api/mecanicos",
    tag = "Cadastros",
    request_body = MechanicPayload,
    responses((status = 201, description = "Mecânico criado", body = Mechanic))
)]
pub async fn create_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<MechanicPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mechanic = app_state
        .registry_repo
        .create_mechanic(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(mechanic)))
}

#[utoipa::path(
    put,
    path = "/api/mecanicos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do mecânico")),
    request_body = MechanicPayload,
    responses((status = 200, description = "Mecânico atualizado", body = Mechanic))
)]
pub async fn update_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<MechanicPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mechanic = app_state
        .registry_repo
        .update_mechanic(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mechanic)))
}

#[utoipa::path(
    delete,
    path = "/api/mecanicos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do mecânico")),
    responses((status = 204, description = "Mecânico desativado"))
)]
pub async fn delete_mechanic(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .registry_repo
        .deactivate_mechanic(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FORNECEDORES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/fornecedores",
    tag = "Cadastros",
    params(RegistryFilter),
    responses((status = 200, description = "Fornecedores", body = Vec<Supplier>))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .registry_repo
        .list_suppliers(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(suppliers)))
}

#[utoipa::path(
    get,
    path = "/api/fornecedores/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses((status = 200, description = "Fornecedor", body = Supplier))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .registry_repo
        .find_supplier(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(supplier)))
}

#[utoipa::path(
    post,
    path = "/api/fornecedores",
    tag = "Cadastros",
    request_body = SupplierPayload,
    responses((status = 201, description = "Fornecedor criado", body = Supplier))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .registry_repo
        .create_supplier(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    put,
    path = "/api/fornecedores/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    request_body = SupplierPayload,
    responses((status = 200, description = "Fornecedor atualizado", body = Supplier))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .registry_repo
        .update_supplier(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(supplier)))
}

#[utoipa::path(
    delete,
    path = "/api/fornecedores/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses((status = 204, description = "Fornecedor desativado"))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .registry_repo
        .deactivate_supplier(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  PEÇAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/pecas",
    tag = "Cadastros",
    params(RegistryFilter),
    responses((status = 200, description = "Peças", body = Vec<Part>))
)]
pub async fn list_parts(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let parts = app_state
        .registry_repo
        .list_parts(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(parts)))
}

#[utoipa::path(
    get,
    path = "/api/pecas/alertas",
    tag = "Cadastros",
    responses((status = 200, description = "Peças no estoque mínimo ou abaixo dele", body = Vec<Part>))
)]
pub async fn list_low_stock_parts(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let parts = app_state
        .registry_repo
        .list_low_stock_parts(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(parts)))
}

#[utoipa::path(
    get,
    path = "/api/pecas/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID da peça")),
    responses((status = 200, description = "Peça", body = Part))
)]
pub async fn get_part(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let part = app_state
        .registry_repo
        .find_part(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(part)))
}

#[utoipa::path(
    post,
    path = "/api/pecas",
    tag = "Cadastros",
    request_body = PartPayload,
    responses(
        (status = 201, description = "Peça criada", body = Part),
        (status = 409, description = "Código já cadastrado")
    )
)]
pub async fn create_part(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PartPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let part = app_state
        .registry_repo
        .create_part(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(part)))
}

#[utoipa::path(
    put,
    path = "/api/pecas/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID da peça")),
    request_body = PartPayload,
    responses((status = 200, description = "Peça atualizada", body = Part))
)]
pub async fn update_part(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let part = app_state
        .registry_repo
        .update_part(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(part)))
}

#[utoipa::path(
    delete,
    path = "/api/pecas/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID da peça")),
    responses((status = 204, description = "Peça desativada"))
)]
pub async fn delete_part(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .registry_repo
        .deactivate_part(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CATÁLOGO DE SERVIÇOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/servicos/categorias",
    tag = "Cadastros",
    responses((status = 200, description = "Categorias de serviço", body = Vec<ServiceCategory>))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .registry_repo
        .list_categories(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(categories)))
}

#[utoipa::path(
    post,
    path = "/api/servicos/categorias",
    tag = "Cadastros",
    request_body = ServiceCategoryPayload,
    responses((status = 201, description = "Categoria criada", body = ServiceCategory))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ServiceCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .registry_repo
        .create_category(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/api/servicos",
    tag = "Cadastros",
    params(RegistryFilter),
    responses((status = 200, description = "Tipos de serviço", body = Vec<ServiceType>))
)]
pub async fn list_service_types(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<RegistryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .registry_repo
        .list_service_types(&app_state.db_pool, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(services)))
}

#[utoipa::path(
    get,
    path = "/api/servicos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do tipo de serviço")),
    responses((status = 200, description = "Tipo de serviço", body = ServiceType))
)]
pub async fn get_service_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = app_state
        .registry_repo
        .find_service_type(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

#[utoipa::path(
    post,
    path = "/api/servicos",
    tag = "Cadastros",
    request_body = ServiceTypePayload,
    responses((status = 201, description = "Tipo de serviço criado", body = ServiceType))
)]
pub async fn create_service_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ServiceTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .registry_repo
        .create_service_type(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

#[utoipa::path(
    put,
    path = "/api/servicos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do tipo de serviço")),
    request_body = ServiceTypePayload,
    responses((status = 200, description = "Tipo de serviço atualizado", body = ServiceType))
)]
pub async fn update_service_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ServiceTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .registry_repo
        .update_service_type(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(service)))
}

#[utoipa::path(
    delete,
    path = "/api/servicos/{id}",
    tag = "Cadastros",
    params(("id" = Uuid, Path, description = "ID do tipo de serviço")),
    responses((status = 204, description = "Tipo de serviço desativado"))
)]
pub async fn delete_service_type(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .registry_repo
        .deactivate_service_type(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  BUSCA RÁPIDA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/busca",
    tag = "Cadastros",
    params(SearchQuery),
    responses((status = 200, description = "Placas, clientes e OS que casam com o termo", body = Vec<SearchHit>))
)]
pub async fn quick_search(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let hits = app_state
        .registry_service
        .quick_search(&app_state.db_pool, &query.q)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(hits)))
}
