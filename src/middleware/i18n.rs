// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::DEFAULT_LANGUAGE;

// Idioma preferido da requisição ("en", "pt", ...)
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_header(value: Option<&str>) -> Self {
        let lang = value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Locale(lang)
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_header(
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok()),
        )
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANGUAGE.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_primary_language_of_first_tag() {
        assert_eq!(Locale::from_header(Some("pt-BR,pt;q=0.9,en;q=0.8")).0, "pt");
        assert_eq!(Locale::from_header(Some("en-US")).0, "en");
    }

    #[test]
    fn defaults_to_english() {
        assert_eq!(Locale::from_header(None).0, "en");
        assert_eq!(Locale::default().0, "en");
    }
}
