// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANGUAGE: &str = "en";

// Os pacotes de mensagens vão embutidos no binário
const BUNDLES: [(&str, &str); 2] = [
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas, indexadas por idioma e chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    bundles: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();
        for (lang, raw) in BUNDLES {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("pacote de idioma '{}' inválido", lang))?;
            bundles.insert(lang.to_string(), messages);
        }
        Ok(Self { bundles })
    }

    /// Traduz `key`; cai para inglês e, por fim, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, key))
            .unwrap_or(key)
            .to_string()
    }

    /// Igual a `translate`, trocando `{0}`, `{1}`... pelos argumentos.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.translate(lang, key), |message, (i, arg)| {
                message.replace(&format!("{{{}}}", i), arg)
            })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.bundles.get(lang)?.get(key).map(String::as_str)
    }
}
