//! Run configuration: API credentials from the environment and the
//! enrichment/render options.

use std::env;
use std::time::Duration;

use crate::logger::warn;
use crate::quran_api::{PICKTHALL_ID, SAHEEH_ID};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Verse text variants requested from the API.
pub const DEFAULT_TEXT_FIELDS: [&str; 3] = ["text_indopak", "text_uthmani", "text_imlaei"];

/// Pickthall, Saheeh International, Transliteration.
pub const DEFAULT_TRANSLATION_IDS: [u32; 3] = [PICKTHALL_ID, SAHEEH_ID, 57];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiEnvironment {
    #[default]
    Live,
    Test,
}

impl ApiEnvironment {
    fn suffix(&self) -> &'static str {
        match self {
            ApiEnvironment::Live => "LIVE",
            ApiEnvironment::Test => "TEST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuranApiConfig {
    pub oauth_base: String,
    pub api_base: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl QuranApiConfig {
    /// Read `END_POINT_*`, `URL_API_*`, `CLIENT_ID_*` and `CLIENT_SECRET_*`.
    ///
    /// Returns `None` when any of them is missing.
    pub fn from_env(environment: ApiEnvironment) -> Option<Self> {
        let suffix = environment.suffix();
        let var = |prefix: &str| {
            let name = format!("{}_{}", prefix, suffix);
            let value = non_empty_var(&name);
            if value.is_none() {
                warn(&format!("API setting {} is not set", name));
            }
            value
        };

        let oauth_base = var("END_POINT");
        let api_base = var("URL_API");
        let client_id = var("CLIENT_ID");
        let client_secret = var("CLIENT_SECRET");

        Some(QuranApiConfig {
            oauth_base: oauth_base?,
            api_base: api_base?,
            client_id: client_id?,
            client_secret: client_secret?,
            timeout: timeout_from_env(),
        })
    }
}

/// `QURAN_API_TIMEOUT_SECS`, or the default when unset or invalid.
pub fn timeout_from_env() -> Duration {
    let secs = match non_empty_var("QURAN_API_TIMEOUT_SECS") {
        Some(v) => v.parse::<u64>().unwrap_or_else(|_| {
            warn(&format!("Invalid QURAN_API_TIMEOUT_SECS '{}', using {}", v, DEFAULT_TIMEOUT_SECS));
            DEFAULT_TIMEOUT_SECS
        }),
        None => DEFAULT_TIMEOUT_SECS,
    };
    Duration::from_secs(secs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Context verses before each exercise verse.
    pub context_before: u32,
    /// Context verses after each exercise verse.
    pub context_after: u32,
    /// Skip sources an entry already has, so enriching twice is harmless.
    pub dedupe_sources: bool,
    pub text_fields: Vec<String>,
    pub translation_ids: Vec<u32>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        EnrichOptions {
            context_before: 1,
            context_after: 1,
            dedupe_sources: false,
            text_fields: DEFAULT_TEXT_FIELDS.iter().map(|s| s.to_string()).collect(),
            translation_ids: DEFAULT_TRANSLATION_IDS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub title: String,
    pub author: String,
    /// Translation printed for the context verses of an exercise. `None` hides the context.
    pub context_translation: Option<String>,
    pub show_transliteration: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            title: "Arabic Textbook".to_string(),
            author: String::new(),
            context_translation: Some("M. Pickthall".to_string()),
            show_transliteration: false,
        }
    }
}

/// Options for the reading-session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterlinearOptions {
    pub title: String,
    pub author: String,
    /// Translations printed under each verse, in this order.
    pub translation_ids: Vec<u32>,
}

impl Default for InterlinearOptions {
    fn default() -> Self {
        InterlinearOptions {
            title: "Quran Readings: Pickthall and Saheeh International".to_string(),
            author: String::new(),
            translation_ids: vec![PICKTHALL_ID, SAHEEH_ID],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_defaults() {
        let opts = EnrichOptions::default();
        assert_eq!(opts.context_before, 1);
        assert_eq!(opts.context_after, 1);
        assert!(!opts.dedupe_sources);
        assert_eq!(opts.translation_ids, vec![19, 20, 57]);
    }

    #[test]
    fn test_render_defaults() {
        let opts = RenderOptions::default();
        assert_eq!(opts.context_translation.as_deref(), Some("M. Pickthall"));
        assert!(!opts.show_transliteration);
    }
}
