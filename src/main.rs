//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::services::upload_storage::MAX_UPLOAD_BYTES;

// Folga para os campos de texto que acompanham a foto no multipart
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📚 Documentação em /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    let customer_routes = Router::new()
        .route("/", get(handlers::registry::list_customers).post(handlers::registry::create_customer))
        .route(
            "/{id}",
            get(handlers::registry::get_customer)
                .put(handlers::registry::update_customer)
                .delete(handlers::registry::delete_customer),
        )
        .route("/{id}/veiculos", get(handlers::registry::list_customer_vehicles));

    let vehicle_routes = Router::new()
        .route("/", get(handlers::registry::list_vehicles).post(handlers::registry::create_vehicle))
        .route(
            "/{id}",
            get(handlers::registry::get_vehicle)
                .put(handlers::registry::update_vehicle)
                .delete(handlers::registry::delete_vehicle),
        );

    let mechanic_routes = Router::new()
        .route("/", get(handlers::registry::list_mechanics).post(handlers::registry::create_mechanic))
        .route(
            "/{id}",
            get(handlers::registry::get_mechanic)
                .put(handlers::registry::update_mechanic)
                .delete(handlers::registry::delete_mechanic),
        );

    let supplier_routes = Router::new()
        .route("/", get(handlers::registry::list_suppliers).post(handlers::registry::create_supplier))
        .route(
            "/{id}",
            get(handlers::registry::get_supplier)
                .put(handlers::registry::update_supplier)
                .delete(handlers::registry::delete_supplier),
        );

    let part_routes = Router::new()
        .route("/", get(handlers::registry::list_parts).post(handlers::registry::create_part))
        .route("/alertas", get(handlers::registry::list_low_stock_parts))
        .route(
            "/{id}",
            get(handlers::registry::get_part)
                .put(handlers::registry::update_part)
                .delete(handlers::registry::delete_part),
        );

    let service_catalog_routes = Router::new()
        .route("/", get(handlers::registry::list_service_types).post(handlers::registry::create_service_type))
        .route("/categorias", get(handlers::registry::list_categories).post(handlers::registry::create_category))
        .route(
            "/{id}",
            get(handlers::registry::get_service_type)
                .put(handlers::registry::update_service_type)
                .delete(handlers::registry::delete_service_type),
        );

    let order_routes = Router::new()
        .route("/", get(handlers::operations::list_orders).post(handlers::operations::create_order))
        .route("/kanban", get(handlers::operations::kanban))
        .route("/{id}", get(handlers::operations::get_order).put(handlers::operations::update_order))
        .route("/{id}/status", patch(handlers::operations::change_status))
        .route("/{id}/servicos", post(handlers::operations::add_service_line))
        .route("/{id}/servicos/{line_id}", delete(handlers::operations::remove_service_line))
        .route("/{id}/pecas", post(handlers::operations::add_part_line))
        .route("/{id}/pecas/{line_id}", delete(handlers::operations::remove_part_line))
        .route(
            "/{id}/checklist",
            post(handlers::operations::add_checklist_item)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/{id}/comunicacoes", post(handlers::operations::add_communication));

    let quote_routes = Router::new()
        .route("/", get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote))
        .route("/estatisticas", get(handlers::quotes::quote_statistics))
        .route("/{id}", get(handlers::quotes::get_quote).put(handlers::quotes::update_quote))
        .route("/{id}/status", patch(handlers::quotes::change_quote_status))
        .route("/{id}/servicos", post(handlers::quotes::add_quote_service))
        .route("/{id}/servicos/{line_id}", delete(handlers::quotes::remove_quote_service))
        .route("/{id}/pecas", post(handlers::quotes::add_quote_part))
        .route("/{id}/pecas/{line_id}", delete(handlers::quotes::remove_quote_part))
        .route("/{id}/converter", post(handlers::quotes::convert_quote))
        .route("/{id}/pdf", get(handlers::quotes::quote_pdf));

    let inventory_routes = Router::new()
        .route("/movimentacoes", get(handlers::inventory::list_movements))
        .route("/pecas/{id}/historico", get(handlers::inventory::part_history))
        .route("/ajuste", post(handlers::inventory::adjust_stock))
        .route("/estatisticas", get(handlers::inventory::statistics))
        .route("/giro", get(handlers::inventory::turnover))
        .route(
            "/compras",
            get(handlers::inventory::list_purchase_orders).post(handlers::inventory::create_purchase_order),
        )
        .route("/compras/{id}", get(handlers::inventory::get_purchase_order))
        .route("/compras/{id}/status", patch(handlers::inventory::change_purchase_status))
        .route("/compras/{id}/receber", post(handlers::inventory::receive_purchase_order));

    let finance_routes = Router::new()
        .route("/contas", get(handlers::finance::list_accounts))
        .route(
            "/receber",
            get(handlers::finance::list_receivables).post(handlers::finance::create_receivable),
        )
        .route("/receber/{id}/receber", patch(handlers::finance::receive))
        .route("/pagar", get(handlers::finance::list_payables).post(handlers::finance::create_payable))
        .route("/pagar/{id}/pagar", patch(handlers::finance::pay))
        .route("/fluxo-caixa", get(handlers::finance::cash_flow))
        .route("/resumo", get(handlers::finance::summary));

    let report_routes = Router::new()
        .route("/rentabilidade", get(handlers::reports::profitability))
        .route("/categorias", get(handlers::reports::categories))
        .route("/mecanicos", get(handlers::reports::mechanics))
        .route("/abc/clientes", get(handlers::reports::abc_customers))
        .route("/abc/pecas", get(handlers::reports::abc_parts))
        .route("/dashboard", get(handlers::reports::dashboard));

    let crm_routes = Router::new()
        .route("/dashboard", get(handlers::crm::dashboard))
        .route("/retencao", get(handlers::crm::retention))
        .route("/clientes/{id}/perfil", get(handlers::crm::profile))
        .route(
            "/clientes/{id}/historico",
            get(handlers::crm::history).post(handlers::crm::add_history),
        )
        .route("/clientes/{id}/risco", get(handlers::crm::risk))
        .route(
            "/clientes/{id}/preferencias",
            get(handlers::crm::preferences).put(handlers::crm::update_preferences),
        );

    let reminder_routes = Router::new()
        .route("/", get(handlers::reminders::list_reminders).post(handlers::reminders::create_reminder))
        .route("/vencidos", get(handlers::reminders::overdue_reminders))
        .route("/auto-criar", post(handlers::reminders::auto_create))
        .route(
            "/{id}",
            get(handlers::reminders::get_reminder)
                .put(handlers::reminders::update_reminder)
                .delete(handlers::reminders::delete_reminder),
        )
        .route("/{id}/status", patch(handlers::reminders::change_reminder_status))
        .route("/{id}/enviar", post(handlers::reminders::send_reminder));

    let survey_routes = Router::new()
        .route("/", get(handlers::surveys::list_surveys))
        .route("/pendentes", get(handlers::surveys::pending_surveys))
        .route("/estatisticas", get(handlers::surveys::survey_statistics))
        .route("/nps", get(handlers::surveys::nps))
        .route("/token/{token}", get(handlers::surveys::public_survey))
        .route("/responder/{token}", post(handlers::surveys::answer_survey))
        .route("/{id}", get(handlers::surveys::get_survey).delete(handlers::surveys::delete_survey))
        .route("/{id}/enviar", post(handlers::surveys::send_survey));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/pendentes", get(handlers::notifications::pending_notifications))
        .route("/estatisticas", get(handlers::notifications::notification_statistics))
        .route("/enviar", post(handlers::notifications::send_notification))
        .route("/enviar-lote", post(handlers::notifications::send_batch))
        .route("/{id}", get(handlers::notifications::get_notification))
        .route("/{id}/reenviar", post(handlers::notifications::resend_notification));

    let uploads_dir = app_state.uploads.dir().to_path_buf();

    Router::new()
        .route("/api/health", get(handlers::settings::health))
        .route("/api/busca", get(handlers::registry::quick_search))
        .route(
            "/api/configuracoes",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/pesquisa/{token}",
            get(handlers::surveys::public_survey).post(handlers::surveys::answer_survey),
        )
        .nest("/api/clientes", customer_routes)
        .nest("/api/veiculos", vehicle_routes)
        .nest("/api/mecanicos", mechanic_routes)
        .nest("/api/fornecedores", supplier_routes)
        .nest("/api/pecas", part_routes)
        .nest("/api/servicos", service_catalog_routes)
        .nest("/api/ordens-servico", order_routes)
        .nest("/api/orcamentos", quote_routes)
        .nest("/api/estoque", inventory_routes)
        .nest("/api/financeiro", finance_routes)
        .nest("/api/relatorios", report_routes)
        .nest("/api/crm", crm_routes)
        .nest("/api/lembretes", reminder_routes)
        .nest("/api/pesquisas", survey_routes)
        .nest("/api/notificacoes", notification_routes)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
