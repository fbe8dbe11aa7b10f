// src/services/quote_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, ProductRepository, QuoteRepository},
    models::{
        products::Product,
        quotes::{
            CreateQuotePayload, NewQuoteLine, PricingPreviewPayload, Quote, QuoteDetail, QuoteHeaderRow,
            QuoteItemPayload, QuoteLineItem, QuoteStatus, UpdateQuotePayload,
        },
        settings::{PricingSettings, DEFAULT_MARGIN_KEY},
    },
    pricing::{max_distance, price_line, round_money, summarize, LinePrice, PricingError},
    services::settings_service::SettingsService,
};

/// Dados do cabeçalho que entram no cálculo de cada linha.
#[derive(Debug, Clone, PartialEq)]
struct QuoteContext {
    customer_type: String,
    distance: Decimal,
    region: Option<String>,
}

#[derive(Clone)]
pub struct QuoteService {
    quote_repo: QuoteRepository,
    product_repo: ProductRepository,
    customer_repo: CustomerRepository,
    settings_service: SettingsService,
    pool: PgPool,
}

impl QuoteService {
    pub fn new(
        quote_repo: QuoteRepository,
        product_repo: ProductRepository,
        customer_repo: CustomerRepository,
        settings_service: SettingsService,
        pool: PgPool,
    ) -> Self {
        Self { quote_repo, product_repo, customer_repo, settings_service, pool }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list(&self, organization_id: Uuid, status: Option<QuoteStatus>) -> Result<Vec<Quote>, AppError> {
        self.quote_repo.list(organization_id, status).await
    }

    pub async fn get_detail(&self, organization_id: Uuid, quote_id: Uuid) -> Result<QuoteDetail, AppError> {
        let header = self.quote_repo
            .find_header(&self.pool, organization_id, quote_id)
            .await?
            .ok_or_else(quote_not_found)?;
        let items = self.quote_repo.list_items(&self.pool, organization_id, quote_id).await?;

        Ok(build_detail(header, items))
    }

    /// Calcula uma linha sem gravar nada.
    pub async fn preview(&self, organization_id: Uuid, payload: &PricingPreviewPayload) -> Result<LinePrice, AppError> {
        let settings = self.settings_service.pricing_settings(organization_id).await?.settings;

        let mut context = self
            .resolve_context(organization_id, payload.customer_id, payload.distance, payload.region.as_deref(), &settings)
            .await?;
        if let (None, Some(customer_type)) = (payload.customer_id, &payload.customer_type) {
            context.customer_type = customer_type.clone();
        }

        let product = self.find_product(&self.pool, organization_id, payload.product_id).await?;
        let price = price_line(
            &product,
            payload.cases,
            &context.customer_type,
            context.distance,
            stored_margin(payload.margin_percent),
            &settings,
        )?;

        Ok(price.rounded())
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    /// Cria o orçamento já com as linhas calculadas, tudo numa transação.
    pub async fn create_quote(
        &self,
        organization_id: Uuid,
        created_by: Uuid,
        payload: &CreateQuotePayload,
    ) -> Result<QuoteDetail, AppError> {
        let settings = self.settings_service.pricing_settings(organization_id).await?.settings;
        let context = self
            .resolve_context(organization_id, payload.customer_id, payload.distance, payload.region.as_deref(), &settings)
            .await?;

        // Calcula tudo antes de abrir a transação; um item inválido aborta sem escrever
        let mut lines = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            lines.push(self.price_item(organization_id, item, &context, &settings).await?);
        }

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let quote = self.quote_repo
            .create_quote(
                &mut *tx,
                organization_id,
                payload.customer_id,
                created_by,
                context.distance,
                context.region.as_deref(),
                payload.notes.as_deref(),
            )
            .await?;

        for (position, line) in (0_i32..).zip(lines.iter()) {
            self.quote_repo.add_item(&mut *tx, organization_id, quote.id, position, line).await?;
        }

        let total = self.quote_repo.recalculate_total(&mut *tx, organization_id, quote.id).await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("🧾 Orçamento {} criado com {} linha(s), total {}", quote.id, lines.len(), total);

        self.get_detail(organization_id, quote.id).await
    }

    /// Troca cliente/distância/região/notas e recalcula as linhas com o novo contexto.
    pub async fn update_header(
        &self,
        organization_id: Uuid,
        quote_id: Uuid,
        payload: &UpdateQuotePayload,
    ) -> Result<QuoteDetail, AppError> {
        let settings = self.settings_service.pricing_settings(organization_id).await?.settings;
        let context = self
            .resolve_context(organization_id, payload.customer_id, payload.distance, payload.region.as_deref(), &settings)
            .await?;

        let mut tx = self.pool.begin().await?;

        self.editable_header(&mut tx, organization_id, quote_id).await?;

        self.quote_repo
            .update_header(
                &mut *tx,
                organization_id,
                quote_id,
                payload.customer_id,
                context.distance,
                context.region.as_deref(),
                payload.notes.as_deref(),
            )
            .await?;

        self.reprice_lines(&mut tx, organization_id, quote_id, &context, &settings).await?;
        self.quote_repo.recalculate_total(&mut *tx, organization_id, quote_id).await?;

        tx.commit().await?;

        self.get_detail(organization_id, quote_id).await
    }

    pub async fn add_item(
        &self,
        organization_id: Uuid,
        quote_id: Uuid,
        item: &QuoteItemPayload,
    ) -> Result<QuoteDetail, AppError> {
        let settings = self.settings_service.pricing_settings(organization_id).await?.settings;

        let mut tx = self.pool.begin().await?;

        let header = self.editable_header(&mut tx, organization_id, quote_id).await?;
        let context = context_from_header(&header);

        let line = self.price_item(organization_id, item, &context, &settings).await?;
        let position = self.quote_repo.next_position(&mut *tx, organization_id, quote_id).await?;
        self.quote_repo.add_item(&mut *tx, organization_id, quote_id, position, &line).await?;
        self.quote_repo.recalculate_total(&mut *tx, organization_id, quote_id).await?;

        tx.commit().await?;

        self.get_detail(organization_id, quote_id).await
    }

    pub async fn remove_item(
        &self,
        organization_id: Uuid,
        quote_id: Uuid,
        item_id: Uuid,
    ) -> Result<QuoteDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        self.editable_header(&mut tx, organization_id, quote_id).await?;

        let removed = self.quote_repo.delete_item(&mut *tx, organization_id, quote_id, item_id).await?;
        if !removed {
            return Err(AppError::ResourceNotFound("Quote item".into()));
        }
        self.quote_repo.recalculate_total(&mut *tx, organization_id, quote_id).await?;

        tx.commit().await?;

        self.get_detail(organization_id, quote_id).await
    }

    /// Recalcula todas as linhas com os produtos e a configuração atuais.
    /// A margem gravada em cada linha é mantida.
    pub async fn reprice(&self, organization_id: Uuid, quote_id: Uuid) -> Result<QuoteDetail, AppError> {
        let settings = self.settings_service.pricing_settings(organization_id).await?.settings;

        let mut tx = self.pool.begin().await?;

        let header = self.editable_header(&mut tx, organization_id, quote_id).await?;
        let context = context_from_header(&header);

        let repriced = self.reprice_lines(&mut tx, organization_id, quote_id, &context, &settings).await?;
        let total = self.quote_repo.recalculate_total(&mut *tx, organization_id, quote_id).await?;

        tx.commit().await?;

        tracing::info!("🔁 Orçamento {} recalculado ({} linha(s)), total {}", quote_id, repriced, total);

        self.get_detail(organization_id, quote_id).await
    }

    pub async fn transition_status(
        &self,
        organization_id: Uuid,
        quote_id: Uuid,
        next: QuoteStatus,
    ) -> Result<Quote, AppError> {
        let mut tx = self.pool.begin().await?;

        let header = self.quote_repo
            .lock_header(&mut *tx, organization_id, quote_id)
            .await?
            .ok_or_else(quote_not_found)?;

        let current = header.quote.status;
        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition { from: current, to: next });
        }

        let quote = self.quote_repo.update_status(&mut *tx, organization_id, quote_id, next).await?;
        tx.commit().await?;

        tracing::info!("📨 Orçamento {}: {} -> {}", quote_id, current.as_str(), next.as_str());

        Ok(quote)
    }

    pub async fn delete(&self, organization_id: Uuid, quote_id: Uuid) -> Result<(), AppError> {
        if !self.quote_repo.delete(organization_id, quote_id).await? {
            return Err(quote_not_found());
        }
        Ok(())
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn resolve_context(
        &self,
        organization_id: Uuid,
        customer_id: Option<Uuid>,
        distance: Option<Decimal>,
        region: Option<&str>,
        settings: &PricingSettings,
    ) -> Result<QuoteContext, AppError> {
        let customer = match customer_id {
            Some(id) => Some(
                self.customer_repo
                    .find_by_id(&self.pool, organization_id, id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Customer".into()))?,
            ),
            None => None,
        };

        let region = region
            .map(str::to_owned)
            .or_else(|| customer.as_ref().and_then(|c| c.region.clone()));
        let distance = resolve_distance(distance, region.as_deref(), settings)?;
        let customer_type = customer
            .map(|c| c.customer_type)
            .unwrap_or_else(|| DEFAULT_MARGIN_KEY.to_string());

        Ok(QuoteContext { customer_type, distance, region })
    }

    async fn find_product<'e, E>(&self, executor: E, organization_id: Uuid, product_id: Uuid) -> Result<Product, AppError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        self.product_repo
            .find_by_id(executor, organization_id, product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Product".into()))
    }

    async fn price_item(
        &self,
        organization_id: Uuid,
        item: &QuoteItemPayload,
        context: &QuoteContext,
        settings: &PricingSettings,
    ) -> Result<NewQuoteLine, AppError> {
        let product = self.find_product(&self.pool, organization_id, item.product_id).await?;
        if !product.is_available {
            return Err(PricingError::InvalidInput(format!("product '{}' is not available", product.name)).into());
        }

        let price = price_line(
            &product,
            item.cases,
            &context.customer_type,
            context.distance,
            stored_margin(item.margin_percent),
            settings,
        )?;

        Ok(snapshot(&product, &price.rounded()))
    }

    async fn editable_header(
        &self,
        conn: &mut PgConnection,
        organization_id: Uuid,
        quote_id: Uuid,
    ) -> Result<QuoteHeaderRow, AppError> {
        // Trava o orçamento: status e posições não mudam até o commit
        let header = self.quote_repo
            .lock_header(&mut *conn, organization_id, quote_id)
            .await?
            .ok_or_else(quote_not_found)?;

        if !header.quote.status.is_editable() {
            return Err(AppError::QuoteLocked(header.quote.status));
        }
        Ok(header)
    }

    async fn reprice_lines(
        &self,
        conn: &mut PgConnection,
        organization_id: Uuid,
        quote_id: Uuid,
        context: &QuoteContext,
        settings: &PricingSettings,
    ) -> Result<usize, AppError> {
        let items = self.quote_repo.list_items(&mut *conn, organization_id, quote_id).await?;
        let mut repriced = 0;

        for item in items {
            // Produto apagado: a linha fica com a foto antiga
            let Some(product_id) = item.product_id else {
                tracing::warn!("Linha {} sem produto; mantendo os valores gravados", item.id);
                continue;
            };
            let Some(product) = self.product_repo.find_by_id(&mut *conn, organization_id, product_id).await? else {
                tracing::warn!("Produto {} não existe mais; linha {} mantida", product_id, item.id);
                continue;
            };

            let price = price_line(
                &product,
                Decimal::from(item.cases),
                &context.customer_type,
                context.distance,
                Some(item.margin_percent),
                settings,
            )?;

            self.quote_repo
                .update_item_pricing(&mut *conn, organization_id, item.id, &snapshot(&product, &price.rounded()))
                .await?;
            repriced += 1;
        }

        Ok(repriced)
    }
}

fn quote_not_found() -> AppError {
    AppError::ResourceNotFound("Quote".into())
}

/// Distância explícita vence; sem ela, usa a milhagem da região; sem região, zero.
/// Sai já arredondada como a coluna `quotes.distance` guarda, para que um
/// recálculo a partir do cabeçalho gravado dê o mesmo resultado.
fn resolve_distance(
    explicit: Option<Decimal>,
    region: Option<&str>,
    settings: &PricingSettings,
) -> Result<Decimal, PricingError> {
    let distance = match (explicit, region) {
        (Some(distance), _) => distance,
        (None, Some(name)) => settings
            .region_distance(name)
            .ok_or_else(|| PricingError::InvalidInput(format!("unknown region '{}'", name)))?,
        (None, None) => Decimal::ZERO,
    };

    if distance < Decimal::ZERO {
        return Err(PricingError::InvalidInput("distance must not be negative".into()));
    }
    if distance > max_distance() {
        return Err(PricingError::InvalidInput(format!("distance must not exceed {}", max_distance())));
    }
    Ok(round_money(distance))
}

/// Margem informada na linha, na precisão de `quote_line_items.margin_percent`.
fn stored_margin(margin: Option<Decimal>) -> Option<Decimal> {
    margin.map(round_money)
}

fn context_from_header(header: &QuoteHeaderRow) -> QuoteContext {
    QuoteContext {
        customer_type: header
            .customer_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MARGIN_KEY.to_string()),
        distance: header.quote.distance,
        region: header.quote.region.clone(),
    }
}

fn snapshot(product: &Product, price: &LinePrice) -> NewQuoteLine {
    NewQuoteLine {
        product_id: product.id,
        product_name: product.name.clone(),
        is_bipoc: product.is_bipoc,
        cases: price.cases,
        margin_percent: price.margin_percent,
        unit_cost: price.unit_cost,
        unit_price: price.unit_price,
        freight_cost: price.freight_cost,
        line_total: price.line_total,
    }
}

fn build_detail(header: QuoteHeaderRow, items: Vec<QuoteLineItem>) -> QuoteDetail {
    let summary = summarize(&items);
    QuoteDetail {
        header: header.quote,
        customer_name: header.customer_name,
        customer_type: header.customer_type,
        items,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn settings() -> PricingSettings {
        PricingSettings::bundled_default().unwrap()
    }

    fn tomatoes() -> Product {
        Product {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Heirloom Tomatoes".into(),
            unit: "25 lb case".into(),
            cases_per_pallet: 49,
            cost_per_case: d("26.95"),
            weight_per_case: None,
            farm: Some("Sunrise Acres".into()),
            location: None,
            is_bipoc: true,
            is_gap_certified: false,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn header(status: QuoteStatus, customer_type: Option<&str>) -> QuoteHeaderRow {
        QuoteHeaderRow {
            quote: Quote {
                id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                customer_id: None,
                created_by: None,
                status,
                distance: d("40"),
                region: Some("Metro".into()),
                notes: None,
                total_amount: Decimal::ZERO,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            customer_name: customer_type.map(|_| "Green Table Bistro".to_string()),
            customer_type: customer_type.map(str::to_owned),
        }
    }

    #[test]
    fn explicit_distance_wins_over_region() {
        let distance = resolve_distance(Some(d("12.5")), Some("Extended"), &settings()).unwrap();
        assert_eq!(distance, d("12.5"));
    }

    #[test]
    fn region_mileage_is_used_without_distance() {
        assert_eq!(resolve_distance(None, Some("Metro"), &settings()).unwrap(), d("40"));
        assert_eq!(resolve_distance(None, None, &settings()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn unknown_region_and_negative_distance_are_rejected() {
        assert!(matches!(
            resolve_distance(None, Some("Atlantis"), &settings()),
            Err(PricingError::InvalidInput(msg)) if msg.contains("Atlantis")
        ));
        assert!(resolve_distance(Some(d("-1")), None, &settings()).is_err());
    }

    #[test]
    fn resolved_distance_matches_its_stored_form() {
        let s = settings();
        let distance = resolve_distance(Some(d("40.126")), None, &s).unwrap();
        assert_eq!(distance, d("40.13"));
        assert_eq!(distance, distance.round_dp(2));

        // Precificar com a distância resolvida e com a lida do cabeçalho dá o mesmo valor
        let mut stored = header(QuoteStatus::Draft, Some("grocery"));
        stored.quote.distance = distance;
        let context = context_from_header(&stored);
        let product = tomatoes();
        let at_creation = price_line(&product, d("75"), "grocery", distance, None, &s).unwrap().rounded();
        let on_reprice = price_line(&product, d("75"), &context.customer_type, context.distance, None, &s)
            .unwrap()
            .rounded();
        assert_eq!(at_creation, on_reprice);
    }

    #[test]
    fn distance_beyond_column_range_is_rejected() {
        let err = resolve_distance(Some(d("100000000000000000000")), None, &settings()).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(msg) if msg.contains("exceed")));
    }

    #[test]
    fn line_margin_is_kept_at_stored_precision() {
        assert_eq!(stored_margin(Some(d("12.345"))), Some(d("12.35")));
        assert_eq!(stored_margin(None), None);
    }

    #[test]
    fn header_without_customer_prices_with_default_margin() {
        let context = context_from_header(&header(QuoteStatus::Draft, None));
        assert_eq!(context.customer_type, DEFAULT_MARGIN_KEY);
        assert_eq!(context.distance, d("40"));

        let context = context_from_header(&header(QuoteStatus::Draft, Some("grocery")));
        assert_eq!(context.customer_type, "grocery");
    }

    #[test]
    fn snapshot_freezes_product_and_rounded_price() {
        let product = tomatoes();
        let price = price_line(&product, d("100"), "grocery", d("40"), None, &settings())
            .unwrap()
            .rounded();
        let line = snapshot(&product, &price);

        assert_eq!(line.product_id, product.id);
        assert_eq!(line.product_name, "Heirloom Tomatoes");
        assert!(line.is_bipoc);
        assert_eq!(line.cases, 100);
        assert_eq!(line.margin_percent, d("20"));
        assert_eq!(line.unit_price, d("32.34"));
        assert_eq!(line.freight_cost, d("439.74"));
        assert_eq!(line.line_total, d("3673.74"));
    }

    #[test]
    fn detail_carries_summary_of_its_lines() {
        let header = header(QuoteStatus::Sent, Some("restaurant"));
        let quote_id = header.quote.id;
        let organization_id = header.quote.organization_id;
        let item = |cases: i32, total: Decimal, is_bipoc: bool| QuoteLineItem {
            id: Uuid::new_v4(),
            organization_id,
            quote_id,
            product_id: None,
            product_name: "Collards".into(),
            is_bipoc,
            position: 0,
            cases,
            margin_percent: d("25"),
            unit_cost: d("10"),
            unit_price: d("12.5"),
            freight_cost: d("75"),
            line_total: total,
            created_at: Utc::now(),
        };

        let detail = build_detail(header, vec![item(10, d("200"), true), item(30, d("450"), false)]);

        assert_eq!(detail.customer_type.as_deref(), Some("restaurant"));
        assert_eq!(detail.summary.total_cases, 40);
        assert_eq!(detail.summary.total_value, d("650"));
        assert_eq!(detail.summary.bipoc_fraction, d("0.5"));
    }
}
