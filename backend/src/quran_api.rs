//! Quran.com content API: one access token per run, verses fetched by key.

use anyhow::{anyhow, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::QuranApiConfig;
use crate::logger::debug;
use crate::quran_data::{ayah_count, VerseKey};

pub const SOURCE_NAME: &str = "quran.com";

/// Resource id of the Pickthall translation.
pub const PICKTHALL_ID: u32 = 19;
/// Resource id of the Saheeh International translation.
pub const SAHEEH_ID: u32 = 20;

/// Display name of a translation resource. Unknown ids give an empty name.
pub fn translation_name(resource_id: u32) -> &'static str {
    match resource_id {
        85 => "M.A.S. Abdel Haleem",
        84 => "T. Usmani",
        95 => "A. Maududi (Tafhim commentary)",
        22 => "A. Yusuf Ali",
        203 => "Al-Hilali & Khan",
        19 => "M. Pickthall",
        20 => "Saheeh Intl.",
        57 => "Transliteration",
        _ => "",
    }
}

pub fn verse_url(key: VerseKey) -> String {
    format!("https://quran.com/{}?startingVerse={}", key.surah, key.ayah)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationText {
    #[serde(default)]
    pub resource_id: u32,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseData {
    #[serde(default)]
    pub text_indopak: Option<String>,
    #[serde(default)]
    pub text_uthmani: Option<String>,
    #[serde(default)]
    pub text_imlaei: Option<String>,
    #[serde(default)]
    pub translations: Vec<TranslationText>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseResponse {
    pub verse: VerseData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedName {
    #[serde(default)]
    pub name: String,
}

/// Surah metadata as returned by the chapters endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterData {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name_complex: String,
    #[serde(default)]
    pub translated_name: TranslatedName,
    #[serde(default)]
    pub verses_count: u32,
    /// 0 when unknown.
    #[serde(default)]
    pub revelation_order: u32,
    #[serde(default)]
    pub revelation_place: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterResponse {
    pub chapter: ChapterData,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Source of verse texts. The enrichment step only talks to this.
pub trait VerseFetcher {
    fn access_token(&self) -> Result<String>;
    fn fetch_verse(&self, token: &str, key: VerseKey) -> Result<VerseResponse>;

    /// Surah metadata. Without a chapters endpoint only the verse count is known.
    fn fetch_chapter(&self, _token: &str, surah: u32) -> Result<ChapterData> {
        let verses_count = ayah_count(surah).ok_or_else(|| anyhow!("Chapter {} is invalid", surah))?;
        Ok(ChapterData {
            id: surah,
            verses_count,
            ..Default::default()
        })
    }
}

pub struct QuranComClient {
    config: QuranApiConfig,
    client: reqwest::blocking::Client,
    text_fields: Vec<String>,
    translation_ids: Vec<u32>,
}

impl QuranComClient {
    pub fn new(config: QuranApiConfig, text_fields: Vec<String>, translation_ids: Vec<u32>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(QuranComClient {
            config,
            client,
            text_fields,
            translation_ids,
        })
    }

    fn verse_query(&self) -> String {
        let mut parts = Vec::new();
        if !self.text_fields.is_empty() {
            parts.push(format!("fields={}", self.text_fields.join(",")));
        }
        if !self.translation_ids.is_empty() {
            let ids: Vec<String> = self.translation_ids.iter().map(|i| i.to_string()).collect();
            parts.push(format!("translations={}", ids.join(",")));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}

impl VerseFetcher for QuranComClient {
    fn access_token(&self) -> Result<String> {
        let url = format!("{}/oauth2/token", self.config.oauth_base.trim_end_matches('/'));
        debug(&format!("Requesting access token from {}", url));

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials&scope=content")
            .send()
            .map_err(|e| anyhow!("Failed to request access token: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Token endpoint returned error status: {}", response.status()));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| anyhow!("Failed to parse token response: {}", e))?;

        Ok(token.access_token)
    }

    fn fetch_verse(&self, token: &str, key: VerseKey) -> Result<VerseResponse> {
        let url = format!(
            "{}/content/api/v4/verses/by_key/{}{}",
            self.config.api_base.trim_end_matches('/'),
            key,
            self.verse_query()
        );

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header("x-auth-token", token)
            .header("x-client-id", &self.config.client_id)
            .send()
            .map_err(|e| anyhow!("Failed to fetch verse {}: {}", key, e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Verse {} request returned error status: {}", key, response.status()));
        }

        response
            .json()
            .map_err(|e| anyhow!("Failed to parse verse {} response: {}", key, e))
    }

    fn fetch_chapter(&self, token: &str, surah: u32) -> Result<ChapterData> {
        let url = format!(
            "{}/content/api/v4/chapters/{}?language=en",
            self.config.api_base.trim_end_matches('/'),
            surah
        );
        debug(&format!("Requesting chapter {} from {}", surah, url));

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header("x-auth-token", token)
            .header("x-client-id", &self.config.client_id)
            .send()
            .map_err(|e| anyhow!("Failed to fetch chapter {}: {}", surah, e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Chapter {} request returned error status: {}", surah, response.status()));
        }

        let chapter: ChapterResponse = response
            .json()
            .map_err(|e| anyhow!("Failed to parse chapter {} response: {}", surah, e))?;
        Ok(chapter.chapter)
    }
}
