// src/services/document_service.rs

use std::path::{Path, PathBuf};

use genpdf::{elements, style, Element};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrganizationRepository,
    models::quotes::QuoteDetail,
    services::quote_service::QuoteService,
};

const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct DocumentService {
    organization_repo: OrganizationRepository,
    quote_service: QuoteService,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(organization_repo: OrganizationRepository, quote_service: QuoteService, fonts_dir: PathBuf) -> Self {
        Self { organization_repo, quote_service, fonts_dir }
    }

    pub async fn generate_quote_pdf(&self, organization_id: Uuid, quote_id: Uuid) -> Result<Vec<u8>, AppError> {
        // 1. Busca os dados
        let organization = self.organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Organization".into()))?;
        let detail = self.quote_service.get_detail(organization_id, quote_id).await?;

        // 2. Renderiza fora do runtime (lê fontes do disco e é CPU-bound)
        let fonts_dir = self.fonts_dir.clone();
        let pdf = tokio::task::spawn_blocking(move || render_quote_pdf(&fonts_dir, &organization.name, &detail))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de geração do PDF: {}", e))??;

        tracing::debug!("PDF do orçamento {} gerado ({} bytes)", quote_id, pdf.len());
        Ok(pdf)
    }
}

fn render_quote_pdf(fonts_dir: &Path, organization_name: &str, detail: &QuoteDetail) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None)
        .map_err(|_| AppError::FontNotFound(format!("{}/{}-*.ttf", fonts_dir.display(), FONT_FAMILY)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Quote {}", short_id(detail.header.id)));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(elements::Paragraph::new(organization_name).styled(style::Style::new().bold().with_font_size(18)));
    doc.push(elements::Break::new(1.5));

    doc.push(
        elements::Paragraph::new(format!("QUOTE #{}", short_id(detail.header.id)))
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    doc.push(elements::Paragraph::new(format!("Date: {}", detail.header.created_at.format("%Y-%m-%d"))));
    doc.push(elements::Paragraph::new(format!("Status: {}", detail.header.status.as_str())));
    doc.push(elements::Paragraph::new(format!(
        "Customer: {}",
        detail.customer_name.as_deref().unwrap_or("Walk-in")
    )));
    doc.push(elements::Paragraph::new(format!("Delivery distance: {} miles", detail.header.distance)));

    doc.push(elements::Break::new(2));

    // --- TABELA DE LINHAS ---
    // Pesos: Produto (4), Caixas (1), Preço/caixa (2), Frete (2), Total (2)
    let mut table = elements::TableLayout::new(vec![4, 1, 2, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    table.row()
        .element(elements::Paragraph::new("Product").styled(style_bold))
        .element(elements::Paragraph::new("Cases").styled(style_bold))
        .element(elements::Paragraph::new("Per case").styled(style_bold))
        .element(elements::Paragraph::new("Freight").styled(style_bold))
        .element(elements::Paragraph::new("Total").styled(style_bold))
        .push()
        .map_err(pdf_error)?;

    for item in &detail.items {
        let name = if item.is_bipoc {
            format!("{} *", item.product_name)
        } else {
            item.product_name.clone()
        };
        table.row()
            .element(elements::Paragraph::new(name))
            .element(elements::Paragraph::new(item.cases.to_string()))
            .element(elements::Paragraph::new(money(item.unit_price)))
            .element(elements::Paragraph::new(money(item.freight_cost)))
            .element(elements::Paragraph::new(money(item.line_total)))
            .push()
            .map_err(pdf_error)?;
    }

    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- TOTAIS ---
    let mut total_paragraph = elements::Paragraph::new(format!("TOTAL: {}", money(detail.header.total_amount)));
    total_paragraph.set_alignment(genpdf::Alignment::Right);
    doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));

    doc.push(elements::Paragraph::new(format!(
        "{} cases, {}% of lines from BIPOC growers (*)",
        detail.summary.total_cases,
        detail.summary.bipoc_percent()
    )).styled(style::Style::new().with_font_size(9)));

    // --- RODAPÉ ---
    if let Some(notes) = &detail.header.notes {
        doc.push(elements::Break::new(2));
        doc.push(elements::Paragraph::new(notes.as_str()).styled(style::Style::new().italic().with_font_size(8)));
    }

    // 3. Renderiza para buffer em memória
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;

    Ok(buffer)
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao montar o PDF: {}", e))
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value)
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::quotes::{Quote, QuoteStatus},
        pricing::summarize,
    };
    use chrono::Utc;

    fn empty_quote() -> QuoteDetail {
        QuoteDetail {
            header: Quote {
                id: Uuid::new_v4(),
                organization_id: Uuid::nil(),
                customer_id: None,
                created_by: None,
                status: QuoteStatus::Draft,
                distance: Decimal::ZERO,
                region: None,
                notes: None,
                total_amount: Decimal::ZERO,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            customer_name: None,
            customer_type: None,
            items: vec![],
            summary: summarize(&[]),
        }
    }

    #[test]
    fn missing_fonts_are_reported() {
        let dir = std::env::temp_dir().join(format!("no-fonts-{}", Uuid::new_v4()));
        let err = render_quote_pdf(&dir, "Piedmont Food Hub", &empty_quote()).unwrap_err();
        assert!(matches!(err, AppError::FontNotFound(path) if path.contains("Roboto")));
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money("3672.84".parse().unwrap()), "$3672.84");
        assert_eq!(money(Decimal::from(75)), "$75.00");
    }

    #[test]
    fn short_id_is_eight_uppercase_chars() {
        let id: Uuid = "5f0c2e7a-9b1d-4c3e-8f2a-1b2c3d4e5f60".parse().unwrap();
        assert_eq!(short_id(id), "5F0C2E7A");
    }
}
