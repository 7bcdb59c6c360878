// src/common/i18n.rs

use std::collections::HashMap;

pub const FALLBACK_LANG: &str = "pt";

// Catálogo de mensagens da API, carregado uma vez no AppState.
// Idiomas sem tradução caem para o português; chaves desconhecidas voltam como estão.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

const PT: &[(&str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos."),
    ("error.missing_field", "Campo obrigatório: {field}"),
    ("error.insufficient_stock", "Estoque insuficiente para {part}. Disponível: {available}"),
    ("error.negative_stock", "Estoque não pode ficar negativo. Disponível: {available}"),
    ("error.invalid_transition", "Transição de status não permitida: {from} -> {to}"),
    ("error.already_converted", "Orçamento já foi convertido em OS"),
    ("error.document_closed", "Documento encerrado não pode ser alterado"),
    ("error.vehicle_has_orders", "Não é possível excluir veículo com ordens de serviço vinculadas"),
    ("error.survey_answered", "Pesquisa já foi respondida"),
    ("error.survey_expired", "Pesquisa expirada"),
    ("error.survey_locked", "Não é possível excluir pesquisa já respondida"),
    ("error.missing_contact", "Cliente não possui contato para {channel}"),
    ("error.opt_out", "Cliente optou por não receber {kind}"),
    ("error.already_sent", "Notificação já foi enviada"),
    ("error.retry_limit", "Limite de tentativas atingido"),
    ("error.invalid_upload", "Arquivo inválido: {reason}"),
    ("error.internal", "Ocorreu um erro inesperado."),
    ("not_found.customer", "Cliente não encontrado"),
    ("not_found.vehicle", "Veículo não encontrado"),
    ("not_found.mechanic", "Mecânico não encontrado"),
    ("not_found.supplier", "Fornecedor não encontrado"),
    ("not_found.part", "Peça não encontrada"),
    ("not_found.service_type", "Tipo de serviço não encontrado"),
    ("not_found.service_order", "Ordem de serviço não encontrada"),
    ("not_found.service_line", "Serviço não encontrado na OS"),
    ("not_found.part_line", "Peça não encontrada na OS"),
    ("not_found.quote", "Orçamento não encontrado"),
    ("not_found.quote_line", "Item não encontrado no orçamento"),
    ("not_found.purchase_order", "Ordem de compra não encontrada"),
    ("not_found.receivable", "Conta a receber não encontrada"),
    ("not_found.payable", "Conta a pagar não encontrada"),
    ("not_found.account", "Conta contábil não encontrada"),
    ("not_found.reminder", "Lembrete não encontrado"),
    ("not_found.survey", "Pesquisa não encontrada"),
    ("not_found.notification", "Notificação não encontrada"),
    ("conflict.customer_tax_id", "CPF/CNPJ já cadastrado"),
    ("conflict.vehicle_plate", "Placa já cadastrada"),
    ("conflict.part_code", "Código já cadastrado"),
    ("conflict.mechanic_tax_id", "CPF já cadastrado"),
    ("conflict.supplier_tax_id", "CNPJ já cadastrado"),
    ("conflict.category_name", "Categoria já cadastrada"),
    ("conflict.generic", "Registro duplicado"),
    ("validation.required", "Campo obrigatório"),
    ("validation.rating", "A nota deve estar entre 1 e 5"),
    ("validation.positive", "O valor deve ser maior que zero"),
    ("validation.email", "E-mail inválido"),
    ("validation.url", "URL inválida"),
];

const EN: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.missing_field", "Required field: {field}"),
    ("error.insufficient_stock", "Insufficient stock for {part}. Available: {available}"),
    ("error.negative_stock", "Stock cannot go negative. Available: {available}"),
    ("error.invalid_transition", "Status transition not allowed: {from} -> {to}"),
    ("error.already_converted", "Quote has already been converted"),
    ("error.document_closed", "Closed documents cannot be changed"),
    ("error.vehicle_has_orders", "Cannot delete a vehicle with service orders"),
    ("error.survey_answered", "Survey has already been answered"),
    ("error.survey_expired", "Survey has expired"),
    ("error.survey_locked", "Answered surveys cannot be deleted"),
    ("error.missing_contact", "Customer has no contact for {channel}"),
    ("error.opt_out", "Customer opted out of {kind}"),
    ("error.already_sent", "Notification was already sent"),
    ("error.retry_limit", "Retry limit reached"),
    ("error.invalid_upload", "Invalid file: {reason}"),
    ("error.internal", "An unexpected error occurred."),
    ("not_found.customer", "Customer not found"),
    ("not_found.vehicle", "Vehicle not found"),
    ("not_found.mechanic", "Mechanic not found"),
    ("not_found.supplier", "Supplier not found"),
    ("not_found.part", "Part not found"),
    ("not_found.service_type", "Service type not found"),
    ("not_found.service_order", "Service order not found"),
    ("not_found.service_line", "Service line not found"),
    ("not_found.part_line", "Part line not found"),
    ("not_found.quote", "Quote not found"),
    ("not_found.quote_line", "Quote line not found"),
    ("not_found.purchase_order", "Purchase order not found"),
    ("not_found.receivable", "Receivable not found"),
    ("not_found.payable", "Payable not found"),
    ("not_found.account", "Account not found"),
    ("not_found.reminder", "Reminder not found"),
    ("not_found.survey", "Survey not found"),
    ("not_found.notification", "Notification not found"),
    ("conflict.customer_tax_id", "Tax id already registered"),
    ("conflict.vehicle_plate", "Plate already registered"),
    ("conflict.part_code", "Part code already registered"),
    ("conflict.mechanic_tax_id", "Tax id already registered"),
    ("conflict.supplier_tax_id", "Tax id already registered"),
    ("conflict.category_name", "Category already registered"),
    ("conflict.generic", "Duplicate record"),
    ("validation.required", "Required field"),
    ("validation.rating", "Rating must be between 1 and 5"),
    ("validation.positive", "Value must be greater than zero"),
    ("validation.email", "Invalid e-mail"),
    ("validation.url", "Invalid URL"),
];

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("pt", PT.iter().copied().collect());
        catalogs.insert("en", EN.iter().copied().collect());
        Self { catalogs }
    }

    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(FALLBACK_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        let mut message = template.to_string();
        for (name, value) in args {
            message = message.replace(&format!("{{{name}}}"), value);
        }
        message
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "not_found.part", &[]), "Peça não encontrada");
    }

    #[test]
    fn placeholders_are_filled() {
        let store = I18nStore::new();
        let msg = store.translate("en", "error.negative_stock", &[("available", "4".into())]);
        assert_eq!(msg, "Stock cannot go negative. Available: 4");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "nao.existe", &[]), "nao.existe");
    }

    #[test]
    fn both_catalogs_have_the_same_keys() {
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(pt, en);
    }
}
