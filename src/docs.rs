// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "tGest API", description = "Gestão de oficina mecânica"),
    paths(
        // --- Sistema ---
        handlers::settings::health,
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Cadastros ---
        handlers::registry::list_customers,
        handlers::registry::get_customer,
        handlers::registry::create_customer,
        handlers::registry::update_customer,
        handlers::registry::delete_customer,
        handlers::registry::list_customer_vehicles,
        handlers::registry::list_vehicles,
        handlers::registry::get_vehicle,
        handlers::registry::create_vehicle,
        handlers::registry::update_vehicle,
        handlers::registry::delete_vehicle,
        handlers::registry::list_mechanics,
        handlers::registry::get_mechanic,
        handlers::registry::create_mechanic,
        handlers::registry::update_mechanic,
        handlers::registry::delete_mechanic,
        handlers::registry::list_suppliers,
        handlers::registry::get_supplier,
        handlers::registry::create_supplier,
        handlers::registry::update_supplier,
        handlers::registry::delete_supplier,
        handlers::registry::list_parts,
        handlers::registry::list_low_stock_parts,
        handlers::registry::get_part,
        handlers::registry::create_part,
        handlers::registry::update_part,
        handlers::registry::delete_part,
        handlers::registry::list_categories,
        handlers::registry::create_category,
        handlers::registry::list_service_types,
        handlers::registry::get_service_type,
        handlers::registry::create_service_type,
        handlers::registry::update_service_type,
        handlers::registry::delete_service_type,
        handlers::registry::quick_search,

        // --- Ordens de Serviço ---
        handlers::operations::list_orders,
        handlers::operations::kanban,
        handlers::operations::get_order,
        handlers::operations::create_order,
        handlers::operations::update_order,
        handlers::operations::change_status,
        handlers::operations::add_service_line,
        handlers::operations::remove_service_line,
        handlers::operations::add_part_line,
        handlers::operations::remove_part_line,
        handlers::operations::add_checklist_item,
        handlers::operations::add_communication,

        // --- Orçamentos ---
        handlers::quotes::list_quotes,
        handlers::quotes::quote_statistics,
        handlers::quotes::get_quote,
        handlers::quotes::create_quote,
        handlers::quotes::update_quote,
        handlers::quotes::change_quote_status,
        handlers::quotes::add_quote_service,
        handlers::quotes::remove_quote_service,
        handlers::quotes::add_quote_part,
        handlers::quotes::remove_quote_part,
        handlers::quotes::convert_quote,
        handlers::quotes::quote_pdf,

        // --- Estoque ---
        handlers::inventory::list_movements,
        handlers::inventory::part_history,
        handlers::inventory::adjust_stock,
        handlers::inventory::statistics,
        handlers::inventory::turnover,
        handlers::inventory::list_purchase_orders,
        handlers::inventory::get_purchase_order,
        handlers::inventory::create_purchase_order,
        handlers::inventory::change_purchase_status,
        handlers::inventory::receive_purchase_order,

        // --- Financeiro ---
        handlers::finance::list_accounts,
        handlers::finance::list_receivables,
        handlers::finance::create_receivable,
        handlers::finance::receive,
        handlers::finance::list_payables,
        handlers::finance::create_payable,
        handlers::finance::pay,
        handlers::finance::cash_flow,
        handlers::finance::summary,

        // --- Relatórios ---
        handlers::reports::profitability,
        handlers::reports::categories,
        handlers::reports::mechanics,
        handlers::reports::abc_customers,
        handlers::reports::abc_parts,
        handlers::reports::dashboard,

        // --- CRM ---
        handlers::crm::profile,
        handlers::crm::history,
        handlers::crm::add_history,
        handlers::crm::retention,
        handlers::crm::risk,
        handlers::crm::preferences,
        handlers::crm::update_preferences,
        handlers::crm::dashboard,

        // --- Lembretes ---
        handlers::reminders::list_reminders,
        handlers::reminders::overdue_reminders,
        handlers::reminders::get_reminder,
        handlers::reminders::create_reminder,
        handlers::reminders::auto_create,
        handlers::reminders::update_reminder,
        handlers::reminders::change_reminder_status,
        handlers::reminders::send_reminder,
        handlers::reminders::delete_reminder,

        // --- Pesquisas ---
        handlers::surveys::list_surveys,
        handlers::surveys::pending_surveys,
        handlers::surveys::survey_statistics,
        handlers::surveys::nps,
        handlers::surveys::get_survey,
        handlers::surveys::send_survey,
        handlers::surveys::delete_survey,
        handlers::surveys::public_survey,
        handlers::surveys::answer_survey,

        // --- Notificações ---
        handlers::notifications::list_notifications,
        handlers::notifications::pending_notifications,
        handlers::notifications::notification_statistics,
        handlers::notifications::get_notification,
        handlers::notifications::send_notification,
        handlers::notifications::send_batch,
        handlers::notifications::resend_notification,
    ),
    components(
        schemas(
            // --- Status e enums ---
            models::operations::ServiceOrderStatus,
            models::operations::ChecklistStatus,
            models::operations::CommunicationChannel,
            models::quotes::QuoteStatus,
            models::inventory::StockMovementKind,
            models::inventory::PurchaseOrderStatus,
            models::finance::AccountKind,
            models::finance::ReceivableStatus,
            models::finance::PayableStatus,
            models::finance::CashFlowKind,
            models::reminders::ReminderKind,
            models::reminders::ReminderStatus,
            models::reminders::ReminderPriority,
            models::reminders::ReminderUrgency,
            models::surveys::SurveyStatus,
            models::surveys::NpsBand,
            models::notifications::NotificationKind,
            models::notifications::NotificationChannel,
            models::notifications::NotificationStatus,
            models::crm::RetentionStatus,
            models::crm::RiskLevel,
            models::reports::AbcClass,
        )
    ),
    tags(
        (name = "Sistema", description = "Saúde do serviço"),
        (name = "Configurações", description = "Dados da oficina e parâmetros"),
        (name = "Cadastros", description = "Clientes, veículos, mecânicos, fornecedores, peças e serviços"),
        (name = "Ordens de Serviço", description = "Ciclo de vida da OS"),
        (name = "Orçamentos", description = "Orçamentos e conversão em OS"),
        (name = "Estoque", description = "Movimentações, indicadores e ordens de compra"),
        (name = "Financeiro", description = "Contas a receber, a pagar e fluxo de caixa"),
        (name = "Relatórios", description = "Rentabilidade, desempenho e curvas ABC"),
        (name = "CRM", description = "Relacionamento e retenção de clientes"),
        (name = "Lembretes", description = "Lembretes de manutenção"),
        (name = "Pesquisas", description = "Pesquisas de satisfação e NPS"),
        (name = "Notificações", description = "Envio e histórico de notificações")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_survey_route_is_documented() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/pesquisa/{token}"));
        assert!(doc.paths.paths.contains_key("/api/ordens-servico/{id}/status"));
    }
}
