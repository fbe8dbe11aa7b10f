// src/services/assistant_service.rs

use std::{fmt::Write as _, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AssistantConfig,
    db::OrganizationRepository,
    models::{
        assistant::{ChatPayload, ChatResponse, ChatRole, ChatTurn},
        quotes::QuoteDetail,
        settings::PricingSettings,
    },
    services::{quote_service::QuoteService, settings_service::SettingsService},
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Modelo de linguagem que responde perguntas sobre preços.
#[async_trait]
pub trait PricingAssistant: Send + Sync {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String, AppError>;

    fn model(&self) -> &str;
}

// --- Cliente HTTP (API de mensagens estilo Anthropic) ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct HttpAssistantClient {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl HttpAssistantClient {
    pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl PricingAssistant for HttpAssistantClient {
    async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String, AppError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: turns,
        };

        let response = self.http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AssistantError(format!("HTTP {}: {}", status, body)));
        }

        let parsed: MessagesResponse = response.json().await?;
        extract_text(parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn extract_text(response: MessagesResponse) -> Result<String, AppError> {
    let text: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(AppError::AssistantError("response had no text content".into()));
    }
    Ok(text.join("\n"))
}

// --- Serviço ---

#[derive(Clone)]
pub struct AssistantService {
    client: Option<Arc<dyn PricingAssistant>>,
    organization_repo: OrganizationRepository,
    settings_service: SettingsService,
    quote_service: QuoteService,
}

impl AssistantService {
    pub fn new(
        client: Option<Arc<dyn PricingAssistant>>,
        organization_repo: OrganizationRepository,
        settings_service: SettingsService,
        quote_service: QuoteService,
    ) -> Self {
        Self { client, organization_repo, settings_service, quote_service }
    }

    /// Sem chave de API configurada o serviço existe, mas responde 503.
    pub fn from_config(
        config: &AssistantConfig,
        organization_repo: OrganizationRepository,
        settings_service: SettingsService,
        quote_service: QuoteService,
    ) -> Result<Self, AppError> {
        let client: Option<Arc<dyn PricingAssistant>> = match &config.api_key {
            Some(key) => Some(Arc::new(HttpAssistantClient::new(config, key.clone())?)),
            None => {
                tracing::warn!("ASSISTANT_API_KEY não definida; assistente de preços desativado");
                None
            }
        };

        Ok(Self::new(client, organization_repo, settings_service, quote_service))
    }

    pub async fn chat(&self, organization_id: Uuid, payload: &ChatPayload) -> Result<ChatResponse, AppError> {
        let client = self.client.as_ref().ok_or(AppError::AssistantUnavailable)?;

        let organization = self.organization_repo
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Organization".into()))?;
        let settings = self.settings_service.pricing_settings(organization_id).await?.settings;

        let quote = match payload.quote_id {
            Some(quote_id) => Some(self.quote_service.get_detail(organization_id, quote_id).await?),
            None => None,
        };

        let system = build_system_prompt(&organization.name, &settings, quote.as_ref());

        let mut turns = payload.history.clone();
        turns.push(ChatTurn { role: ChatRole::User, content: payload.message.clone() });

        let reply = client.complete(&system, &turns).await?;
        tracing::debug!("Assistente respondeu {} caracteres", reply.len());

        Ok(ChatResponse { reply, model: client.model().to_string() })
    }
}

/// Texto de sistema com a configuração de preços e, se houver, o orçamento em pauta.
pub fn build_system_prompt(organization_name: &str, settings: &PricingSettings, quote: Option<&QuoteDetail>) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a pricing assistant for {}, a regional food hub that sells farm produce by the case. \
         Answer questions about quotes, freight and margins concisely, using the figures below.",
        organization_name
    );

    let _ = writeln!(prompt, "\nFreight settings:");
    let _ = writeln!(prompt, "- Base freight per pallet: ${}", settings.base_freight_rate);
    let _ = writeln!(prompt, "- Per-mile rate per pallet: ${}", settings.per_mile_rate);
    let _ = writeln!(prompt, "- Partial pallet surcharge: {}%", settings.pallet_break_surcharge);
    let _ = writeln!(prompt, "- Minimum freight per line: ${}", settings.min_freight);

    let _ = writeln!(prompt, "\nDefault margins by customer type:");
    for (customer_type, margin) in &settings.margins {
        let _ = writeln!(prompt, "- {}: {}%", customer_type, margin);
    }

    let _ = writeln!(prompt, "\nFreight discounts by volume:");
    for tier in &settings.volume_tiers {
        match tier.max_cases {
            Some(max) => {
                let _ = writeln!(prompt, "- {} to {} cases: {}%", tier.min_cases, max, tier.discount_percent);
            }
            None => {
                let _ = writeln!(prompt, "- {}+ cases: {}%", tier.min_cases, tier.discount_percent);
            }
        }
    }

    if !settings.regions.is_empty() {
        let _ = writeln!(prompt, "\nDelivery regions:");
        for (region, miles) in &settings.regions {
            let _ = writeln!(prompt, "- {}: {} miles", region, miles);
        }
    }

    if let Some(quote) = quote {
        let _ = writeln!(
            prompt,
            "\nCurrent quote ({}) for {} ({}), {} miles, status {}:",
            quote.header.id,
            quote.customer_name.as_deref().unwrap_or("no customer"),
            quote.customer_type.as_deref().unwrap_or("default pricing"),
            quote.header.distance,
            quote.header.status.as_str(),
        );
        for item in &quote.items {
            let _ = writeln!(
                prompt,
                "- {} x {}: ${}/case at {}% margin, freight ${}, line total ${}{}",
                item.cases,
                item.product_name,
                item.unit_price,
                item.margin_percent,
                item.freight_cost,
                item.line_total,
                if item.is_bipoc { " (BIPOC grower)" } else { "" },
            );
        }
        let _ = writeln!(
            prompt,
            "Totals: {} cases, ${}, {}% of lines from BIPOC growers.",
            quote.summary.total_cases,
            quote.summary.total_value,
            quote.summary.bipoc_percent(),
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        models::quotes::{Quote, QuoteLineItem, QuoteStatus},
        pricing::summarize,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct FakeAssistant {
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl PricingAssistant for FakeAssistant {
        async fn complete(&self, system: &str, turns: &[ChatTurn]) -> Result<String, AppError> {
            self.seen.lock().unwrap().push((system.to_string(), turns.len()));
            Ok("Freight looks fine.".into())
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    fn settings() -> PricingSettings {
        PricingSettings::bundled_default().unwrap()
    }

    fn quote() -> QuoteDetail {
        let quote_id = Uuid::new_v4();
        let items = vec![QuoteLineItem {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            quote_id,
            product_id: None,
            product_name: "Heirloom Tomatoes".into(),
            is_bipoc: true,
            position: 0,
            cases: 100,
            margin_percent: Decimal::from(20),
            unit_cost: "26.95".parse().unwrap(),
            unit_price: "32.34".parse().unwrap(),
            freight_cost: "439.74".parse().unwrap(),
            line_total: "3673.74".parse().unwrap(),
            created_at: Utc::now(),
        }];
        let summary = summarize(&items);

        QuoteDetail {
            header: Quote {
                id: quote_id,
                organization_id: Uuid::nil(),
                customer_id: Some(Uuid::new_v4()),
                created_by: None,
                status: QuoteStatus::Draft,
                distance: Decimal::from(40),
                region: None,
                notes: None,
                total_amount: "3673.74".parse().unwrap(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            customer_name: Some("Green Table Bistro".into()),
            customer_type: Some("restaurant".into()),
            items,
            summary,
        }
    }

    #[test]
    fn prompt_describes_settings() {
        let prompt = build_system_prompt("Piedmont Food Hub", &settings(), None);

        assert!(prompt.contains("Piedmont Food Hub"));
        assert!(prompt.contains("Base freight per pallet: $125"));
        assert!(prompt.contains("- restaurant: 25%"));
        assert!(prompt.contains("- 301+ cases: 15%"));
        assert!(prompt.contains("- Metro: 40 miles"));
        assert!(!prompt.contains("Current quote"));
    }

    #[test]
    fn prompt_includes_quote_lines_and_summary() {
        let prompt = build_system_prompt("Piedmont Food Hub", &settings(), Some(&quote()));

        assert!(prompt.contains("Green Table Bistro (restaurant)"));
        assert!(prompt.contains("100 x Heirloom Tomatoes"));
        assert!(prompt.contains("(BIPOC grower)"));
        assert!(prompt.contains("Totals: 100 cases, $3673.74"));
        assert!(prompt.contains("% of lines from BIPOC growers"));
    }

    #[test]
    fn text_blocks_are_joined() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Hello"},{"type":"tool_use","id":"x"},{"type":"text","text":"there"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello\nthere");

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(extract_text(empty), Err(AppError::AssistantError(_))));
    }

    #[test]
    fn request_body_uses_lowercase_roles() {
        let turns = vec![ChatTurn { role: ChatRole::User, content: "Hi".into() }];
        let body = serde_json::to_value(MessagesRequest {
            model: "m",
            max_tokens: 512,
            system: "s",
            messages: &turns,
        })
        .unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 512);
    }

    #[tokio::test]
    async fn chat_without_client_is_unavailable() {
        let state = AppConfig::for_tests().lazy_state();
        let payload = ChatPayload { message: "Hi".into(), quote_id: None, history: vec![] };

        let err = state.assistant_service.chat(Uuid::new_v4(), &payload).await.unwrap_err();
        assert!(matches!(err, AppError::AssistantUnavailable));
    }

    #[tokio::test]
    async fn fake_client_is_usable_behind_the_trait() {
        let fake = Arc::new(FakeAssistant { seen: Mutex::new(vec![]) });
        let client: Arc<dyn PricingAssistant> = fake.clone();
        assert_eq!(client.model(), "fake-model");

        let turns = vec![ChatTurn { role: ChatRole::User, content: "Hi".into() }];
        let reply = client.complete("system", &turns).await.unwrap();

        assert_eq!(reply, "Freight looks fine.");
        assert_eq!(fake.seen.lock().unwrap()[0], ("system".to_string(), 1));
    }
}
