//! HTTP client for the hosted PostgREST-style backend.
//!
//! Three tables and one RPC cover everything the core reads:
//! `rpc/search_dictionary` for ranked fuzzy search, `root_words`,
//! `word_forms` (with embedded form-type metadata), and
//! `example_sentences`. Queries carry Czech text verbatim; accent folding
//! and trigram matching happen server-side.

use crate::model::{ExampleSentence, RootWord, SearchResult, WordForm};
use crate::store::{SearchService, StoreError, WordStore};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::env;
use std::time::Duration;
use tracing::debug;

const FORM_SELECT: &str =
    "id,form_in_czech,form_type_id,gender,plurality,person,tense,is_primary,\
     form_type:word_form_types(name,category,explanation)";
const ROOT_SELECT: &str = "id,in_czech,in_english,word_type,word_aspect,note";
const EXAMPLE_SELECT: &str = "id,czech_sentence,english_sentence,explanation,word_form_id";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    /// Access token of the signed-in user; falls back to the API key.
    pub bearer: Option<String>,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Reads `SLOVI_BACKEND_URL`, `SLOVI_API_KEY`, and optionally
    /// `SLOVI_BEARER`.
    pub fn from_env() -> Result<Self, StoreError> {
        let base_url = env::var("SLOVI_BACKEND_URL")
            .map_err(|_| StoreError::Config("SLOVI_BACKEND_URL is not set".to_string()))?;
        let api_key = env::var("SLOVI_API_KEY")
            .map_err(|_| StoreError::Config("SLOVI_API_KEY is not set".to_string()))?;
        let mut config = Self::new(base_url, api_key);
        if let Ok(token) = env::var("SLOVI_BEARER") {
            config.bearer = Some(token);
        }
        Ok(config)
    }
}

pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn rest_url(&self, path: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .config
            .bearer
            .as_deref()
            .unwrap_or(&self.config.api_key);
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let url = self.rest_url(path);
        debug!(%url, "backend read");
        let response = self
            .authed(self.client.get(url).query(query))
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        decode_rows(response).await
    }
}

async fn decode_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Backend(format!("{status}: {body}")));
    }
    response
        .json()
        .await
        .map_err(|err| StoreError::Decode(err.to_string()))
}

/// PostgREST `in.(...)` filter over a set of ids.
fn in_filter(ids: &[i64]) -> String {
    let list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({list})")
}

impl SearchService for HttpBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        let url = self.rest_url("rpc/search_dictionary");
        debug!(%url, query, limit, "search_dictionary rpc");
        let response = self
            .authed(
                self.client
                    .post(url)
                    .json(&json!({ "p_query": query, "p_limit": limit })),
            )
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        decode_rows(response).await
    }
}

impl WordStore for HttpBackend {
    async fn root_word(&self, id: i64) -> Result<RootWord, StoreError> {
        let rows: Vec<RootWord> = self
            .get_rows(
                "root_words",
                &[
                    ("id", format!("eq.{id}")),
                    ("select", ROOT_SELECT.to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        rows.into_iter().next().ok_or(StoreError::NotFound {
            what: "root word",
            id,
        })
    }

    async fn word_forms(&self, root_word_id: i64) -> Result<Vec<WordForm>, StoreError> {
        self.get_rows(
            "word_forms",
            &[
                ("root_word_id", format!("eq.{root_word_id}")),
                ("select", FORM_SELECT.to_string()),
                ("order", "form_type_id".to_string()),
            ],
        )
        .await
    }

    async fn example_sentences(
        &self,
        form_ids: &[i64],
    ) -> Result<Vec<ExampleSentence>, StoreError> {
        if form_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_rows(
            "example_sentences",
            &[
                ("word_form_id", in_filter(form_ids)),
                ("select", EXAMPLE_SELECT.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_tolerates_trailing_slash() {
        let backend =
            HttpBackend::new(BackendConfig::new("https://db.example.com/", "key")).unwrap();
        assert_eq!(
            backend.rest_url("root_words"),
            "https://db.example.com/rest/v1/root_words"
        );
        assert_eq!(
            backend.rest_url("rpc/search_dictionary"),
            "https://db.example.com/rest/v1/rpc/search_dictionary"
        );
    }

    #[test]
    fn in_filter_joins_ids() {
        assert_eq!(in_filter(&[71, 72, 74]), "in.(71,72,74)");
        assert_eq!(in_filter(&[5]), "in.(5)");
    }

    #[test]
    fn bearer_falls_back_to_api_key() {
        let plain = BackendConfig::new("https://db.example.com", "anon-key");
        assert!(plain.bearer.is_none());
        let with_token = plain.clone().with_bearer("user-jwt");
        assert_eq!(with_token.bearer.as_deref(), Some("user-jwt"));
    }

    #[test]
    fn word_forms_response_decodes_with_embedded_form_type() {
        let payload = r#"[{
            "id": 91,
            "form_in_czech": "čtu",
            "form_type_id": 10,
            "gender": null,
            "plurality": "singular",
            "person": "1",
            "tense": "present",
            "is_primary": true,
            "form_type": { "name": "present", "category": "tense", "explanation": null }
        }]"#;
        let rows: Vec<WordForm> = serde_json::from_str(payload).unwrap();
        assert_eq!(rows[0].form_in_czech, "čtu");
        assert_eq!(
            rows[0].form_type.category,
            crate::model::FormCategory::Tense
        );
    }
}
