// src/main.rs

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod pricing;
mod services;

use crate::config::{AppConfig, AppState};
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();

    let config = AppConfig::from_env()?;
    let server_addr = config.server_addr.clone();

    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    let listener = TcpListener::bind(&server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE]);

    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(openapi_json))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    // Rotas protegidas (auth_guard injeta usuário e organização)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_me))
        .route(
            "/api/users",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        )
        // Clientes
        .route(
            "/api/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/api/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        // Catálogo
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        // Preços
        .route(
            "/api/settings/pricing",
            get(handlers::settings::get_pricing_settings).put(handlers::settings::update_pricing_settings),
        )
        .route("/api/pricing/preview", post(handlers::pricing::preview_line))
        // Orçamentos
        .route(
            "/api/quotes",
            get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote),
        )
        .route(
            "/api/quotes/{id}",
            get(handlers::quotes::get_quote)
                .put(handlers::quotes::update_quote)
                .delete(handlers::quotes::delete_quote),
        )
        .route("/api/quotes/{id}/items", post(handlers::quotes::add_item))
        .route("/api/quotes/{id}/items/{item_id}", delete(handlers::quotes::remove_item))
        .route("/api/quotes/{id}/reprice", post(handlers::quotes::reprice_quote))
        .route("/api/quotes/{id}/status", patch(handlers::quotes::update_status))
        .route("/api/quotes/{id}/pdf", get(handlers::documents::quote_pdf))
        // Assistente
        .route("/api/assistant/chat", post(handlers::assistant::chat))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(docs::ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppConfig::for_tests().lazy_state())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app()
            .oneshot(Request::builder().uri("/api/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["paths"]["/api/quotes"].is_object());
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized_and_localized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/quotes")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Token de autenticação inválido ou ausente.");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_before_touching_the_database() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/settings/pricing")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Authentication token is invalid or missing.");
    }

    #[tokio::test]
    async fn register_validates_payload_first() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"organizationName":"Piedmont Food Hub","fullName":"Ana","email":"nope","password":"short"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["password"].is_array());
    }
}
