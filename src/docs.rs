// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::pricing;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::list_users,
        handlers::auth::create_user,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,

        // --- Settings ---
        handlers::settings::get_pricing_settings,
        handlers::settings::update_pricing_settings,

        // --- Pricing ---
        handlers::pricing::preview_line,

        // --- Quotes ---
        handlers::quotes::list_quotes,
        handlers::quotes::create_quote,
        handlers::quotes::get_quote,
        handlers::quotes::update_quote,
        handlers::quotes::delete_quote,
        handlers::quotes::add_item,
        handlers::quotes::remove_item,
        handlers::quotes::reprice_quote,
        handlers::quotes::update_status,
        handlers::documents::quote_pdf,

        // --- Assistant ---
        handlers::assistant::chat,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- Catálogo e clientes ---
            models::customers::Customer,
            models::customers::CustomerPayload,
            models::products::Product,
            models::products::ProductPayload,

            // --- Settings ---
            models::settings::VolumeTier,
            models::settings::PricingSettings,
            models::settings::PricingSettingsResponse,

            // --- Quotes ---
            models::quotes::QuoteStatus,
            models::quotes::Quote,
            models::quotes::QuoteLineItem,
            models::quotes::QuoteDetail,
            models::quotes::QuoteItemPayload,
            models::quotes::CreateQuotePayload,
            models::quotes::UpdateQuotePayload,
            models::quotes::UpdateQuoteStatusPayload,
            models::quotes::PricingPreviewPayload,
            pricing::LinePrice,
            pricing::QuoteSummary,

            // --- Assistant ---
            models::assistant::ChatRole,
            models::assistant::ChatTurn,
            models::assistant::ChatPayload,
            models::assistant::ChatResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários da Organização"),
        (name = "Customers", description = "Clientes (tipo define a margem padrão)"),
        (name = "Products", description = "Catálogo de Produtos"),
        (name = "Settings", description = "Configuração de Preços"),
        (name = "Pricing", description = "Cálculo Avulso de Linhas"),
        (name = "Quotes", description = "Orçamentos, Linhas e Status"),
        (name = "Assistant", description = "Assistente de Preços (IA)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_quote_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/quotes/{id}/reprice"));
        assert!(doc.paths.paths.contains_key("/api/pricing/preview"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(components.schemas.contains_key("PricingSettings"));
    }
}
