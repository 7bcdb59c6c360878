// src/services/document_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::{quotes::QuoteDetail, settings::WorkshopSettings},
    services::quote_service::QuoteService,
};

const FONT_FAMILY: &str = "Roboto";

pub fn quote_file_name(number: &str) -> String {
    format!("orcamento-{number}.pdf")
}

fn money(value: Decimal) -> String {
    format!("R$ {:.2}", value)
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

pub struct RenderedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct DocumentService {
    quotes: QuoteService,
    settings_repo: SettingsRepository,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(quotes: QuoteService, settings_repo: SettingsRepository, fonts_dir: impl Into<PathBuf>) -> Self {
        Self { quotes, settings_repo, fonts_dir: fonts_dir.into() }
    }

    pub async fn quote_pdf<'e, E>(&self, executor: E, quote_id: Uuid) -> Result<RenderedPdf, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let detail = self.quotes.load_detail(&mut *conn, quote_id).await?;
        let settings = self.settings_repo.get_settings(&mut *conn).await?;
        drop(conn);

        let bytes = self.render_quote(&settings, &detail)?;
        tracing::info!("📄 PDF do orçamento {} gerado", detail.quote.number);

        Ok(RenderedPdf { file_name: quote_file_name(&detail.quote.number), bytes })
    }

    fn render_quote(&self, settings: &WorkshopSettings, detail: &QuoteDetail) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte {} não encontrada em {}", FONT_FAMILY, self.fonts_dir.display()))
        })?;

        let quote = &detail.quote;
        let party = &detail.party;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Orçamento {}", quote.number));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO DA OFICINA ---
        let company = settings.company_name.clone().unwrap_or_else(|| "tGest".to_string());
        doc.push(elements::Paragraph::new(company).styled(style::Style::new().bold().with_font_size(18)));

        let contact: Vec<&str> = [&settings.document_number, &settings.address, &settings.phone, &settings.email]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .collect();
        if !contact.is_empty() {
            doc.push(elements::Paragraph::new(contact.join(" | ")).styled(style::Style::new().with_font_size(9)));
        }

        doc.push(elements::Break::new(1.5));

        doc.push(
            elements::Paragraph::new(format!("ORÇAMENTO {}", quote.number))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Emitido em {} - Válido até {}",
            quote.created_at.format("%d/%m/%Y"),
            quote.valid_until.format("%d/%m/%Y")
        )));
        doc.push(elements::Paragraph::new(format!("Cliente: {} ({})", party.customer_name, party.customer_phone)));
        doc.push(elements::Paragraph::new(format!(
            "Veículo: {} {} - Placa {}",
            party.make, party.model, party.plate
        )));
        if let Some(problem) = quote.problem_description.as_deref() {
            doc.push(elements::Paragraph::new(format!("Problema relatado: {problem}")));
        }

        doc.push(elements::Break::new(1.5));

        // --- ITENS ---
        let bold = style::Style::new().bold();
        let mut table = elements::TableLayout::new(vec![5, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        table
            .row()
            .element(elements::Paragraph::new("Item").styled(bold))
            .element(elements::Paragraph::new("Qtd").styled(bold))
            .element(elements::Paragraph::new("Unitário").styled(bold))
            .element(elements::Paragraph::new("Total").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for line in &detail.services {
            table
                .row()
                .element(elements::Paragraph::new(format!("Serviço: {}", line.service_name)))
                .element(elements::Paragraph::new(line.quantity.to_string()))
                .element(elements::Paragraph::new(money(line.unit_price)))
                .element(elements::Paragraph::new(money(line.line_total)))
                .push()
                .map_err(pdf_error)?;
        }

        for line in &detail.parts {
            table
                .row()
                .element(elements::Paragraph::new(format!("Peça: {} ({})", line.part_name, line.part_code)))
                .element(elements::Paragraph::new(line.quantity.to_string()))
                .element(elements::Paragraph::new(money(line.unit_price)))
                .element(elements::Paragraph::new(money(line.line_total)))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(1.5));

        // --- TOTAIS ---
        for (label, value) in [
            ("Serviços", quote.services_total),
            ("Peças", quote.parts_total),
            ("Desconto", quote.discount),
        ] {
            let mut line = elements::Paragraph::new(format!("{label}: {}", money(value)));
            line.set_alignment(genpdf::Alignment::Right);
            doc.push(line);
        }

        let mut total = elements::Paragraph::new(format!("TOTAL: {}", money(quote.total)));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

        if let Some(notes) = quote.notes.as_deref() {
            doc.push(elements::Break::new(2));
            doc.push(elements::Paragraph::new(notes).styled(style::Style::new().italic().with_font_size(8)));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::quotes::CreateQuotePayload, test_support};
    use sqlx::PgPool;

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn file_name_carries_quote_number() {
        assert_eq!(quote_file_name("ORC2026-0007"), "orcamento-ORC2026-0007.pdf");
    }

    #[test]
    fn money_uses_two_decimals() {
        assert_eq!(money(Decimal::new(3505, 1)), "R$ 350.50");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn quote_pdf_loads_the_quote_before_looking_for_fonts(pool: PgPool) {
        let state = test_support::app_state(&pool);
        let owner = test_support::customer_with_vehicle(&state, "ABC1234").await;
        let quote = state
            .quote_service
            .create(
                &pool,
                &CreateQuotePayload {
                    customer_id: owner.customer_id,
                    vehicle_id: owner.vehicle_id,
                    problem_description: None,
                    notes: None,
                    valid_until: None,
                    discount: None,
                    services: vec![],
                    parts: vec![],
                },
            )
            .await
            .unwrap();

        // O handler do axum exige um future Send
        let rendering = state.document_service.quote_pdf(&pool, quote.id);
        assert_send(&rendering);

        let err = rendering.await.err().unwrap();
        assert!(matches!(err, AppError::FontNotFound(_)));
    }
}
