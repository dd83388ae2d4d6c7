//! Contracts for the hosted dictionary backend.
//!
//! The backend owns persistence, ranking, accent folding, and fuzzy matching;
//! this crate only issues independent, idempotent reads against it. The two
//! traits split along the consumer seam: the search coordinator needs
//! [`SearchService`], the detail presenter needs [`WordStore`]. A real
//! deployment uses [`crate::backend::HttpBackend`] for both; tests and the
//! demo CLI use [`MemoryBackend`].

use crate::model::{ExampleSentence, RootWord, SearchResult, WordForm};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The request never produced a usable response (network, TLS, timeout).
    Transport(String),
    /// The backend answered with an error status or error payload.
    Backend(String),
    /// A lookup by id matched no record.
    NotFound { what: &'static str, id: i64 },
    /// The response arrived but could not be decoded into the schema types.
    Decode(String),
    /// Client-side configuration is missing or malformed.
    Config(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "transport error: {msg}"),
            StoreError::Backend(msg) => write!(f, "backend error: {msg}"),
            StoreError::NotFound { what, id } => write!(f, "no {what} found for id {id}"),
            StoreError::Decode(msg) => write!(f, "malformed response: {msg}"),
            StoreError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Ranked fuzzy search over every stored surface form.
pub trait SearchService: Send + Sync {
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchResult>, StoreError>> + Send;
}

/// Record-level reads backing the word-detail view.
pub trait WordStore: Send + Sync {
    fn root_word(&self, id: i64) -> impl Future<Output = Result<RootWord, StoreError>> + Send;

    /// All forms of a root word, ordered by form-type id. That fetch order is
    /// the base presentation order for every category except tense.
    fn word_forms(
        &self,
        root_word_id: i64,
    ) -> impl Future<Output = Result<Vec<WordForm>, StoreError>> + Send;

    fn example_sentences(
        &self,
        form_ids: &[i64],
    ) -> impl Future<Output = Result<Vec<ExampleSentence>, StoreError>> + Send;
}

#[derive(Default)]
struct MemoryInner {
    words: HashMap<i64, RootWord>,
    forms: HashMap<i64, Vec<WordForm>>,
    examples: Vec<ExampleSentence>,
    search_rows: Vec<SearchResult>,
    search_delays: HashMap<String, Duration>,
    failing_queries: HashSet<String>,
}

/// Deterministic in-memory stand-in for the hosted backend.
///
/// Search matches a query against the matched form and both headword
/// translations, case-insensitively, and returns rows ordered by rank. Delays
/// and forced failures can be injected per query to exercise the
/// coordinator's race and error paths.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<MemoryInner>,
    search_log: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small Czech dataset ("pes"/"kočka"/"číst") shared by tests and the
    /// demo CLI mode.
    pub fn with_fixtures() -> Self {
        let backend = Self::new();
        crate::fixtures::populate(&backend);
        backend
    }

    pub fn insert_word(&self, word: RootWord) {
        self.inner.write().words.insert(word.id, word);
    }

    pub fn insert_form(&self, root_word_id: i64, form: WordForm) {
        let mut inner = self.inner.write();
        let forms = inner.forms.entry(root_word_id).or_default();
        forms.push(form);
        forms.sort_by_key(|f| f.form_type_id);
    }

    pub fn insert_example(&self, example: ExampleSentence) {
        self.inner.write().examples.push(example);
    }

    pub fn index_search_row(&self, row: SearchResult) {
        self.inner.write().search_rows.push(row);
    }

    /// Delays every search for `query` by `latency`, simulating a slow
    /// backend response for that term.
    pub fn set_search_delay(&self, query: impl Into<String>, latency: Duration) {
        self.inner.write().search_delays.insert(query.into(), latency);
    }

    /// Makes every search for `query` fail with a backend error.
    pub fn fail_search(&self, query: impl Into<String>) {
        self.inner.write().failing_queries.insert(query.into());
    }

    /// Queries that actually reached the backend, in call order.
    pub fn search_log(&self) -> Vec<String> {
        self.search_log.lock().clone()
    }
}

impl SearchService for MemoryBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        self.search_log.lock().push(query.to_string());
        let (delay, should_fail) = {
            let inner = self.inner.read();
            (
                inner.search_delays.get(query).copied(),
                inner.failing_queries.contains(query),
            )
        };
        if let Some(latency) = delay {
            tokio::time::sleep(latency).await;
        }
        if should_fail {
            return Err(StoreError::Backend(format!(
                "search_dictionary failed for {query:?}"
            )));
        }
        let needle = query.to_lowercase();
        let mut rows: Vec<SearchResult> = self
            .inner
            .read()
            .search_rows
            .iter()
            .filter(|row| {
                row.matched_form.to_lowercase().contains(&needle)
                    || row.root_word_czech.to_lowercase().contains(&needle)
                    || row.root_word_english.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(std::cmp::Ordering::Equal));
        rows.truncate(limit);
        Ok(rows)
    }
}

impl WordStore for MemoryBackend {
    async fn root_word(&self, id: i64) -> Result<RootWord, StoreError> {
        self.inner
            .read()
            .words
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                what: "root word",
                id,
            })
    }

    async fn word_forms(&self, root_word_id: i64) -> Result<Vec<WordForm>, StoreError> {
        Ok(self
            .inner
            .read()
            .forms
            .get(&root_word_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn example_sentences(&self, form_ids: &[i64]) -> Result<Vec<ExampleSentence>, StoreError> {
        let wanted: HashSet<i64> = form_ids.iter().copied().collect();
        Ok(self
            .inner
            .read()
            .examples
            .iter()
            .filter(|e| wanted.contains(&e.word_form_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_search_ranks_and_truncates() {
        let backend = MemoryBackend::with_fixtures();
        let rows = backend.search("pes", 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].root_word_czech, "pes");
        assert_eq!(backend.search_log(), vec!["pes".to_string()]);
    }

    #[tokio::test]
    async fn memory_search_matches_inflected_forms() {
        let backend = MemoryBackend::with_fixtures();
        let rows = backend.search("psa", 10).await.unwrap();
        assert!(rows.iter().any(|r| r.matched_form == "psa"));
    }

    #[tokio::test]
    async fn missing_root_word_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.root_word(99).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                what: "root word",
                id: 99
            }
        );
    }

    #[tokio::test]
    async fn forced_failure_surfaces_as_backend_error() {
        let backend = MemoryBackend::with_fixtures();
        backend.fail_search("pes");
        let err = backend.search("pes", 10).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn example_filter_respects_id_set() {
        let backend = MemoryBackend::with_fixtures();
        let all_forms = backend.word_forms(7).await.unwrap();
        let ids: Vec<i64> = all_forms.iter().map(|f| f.id).collect();
        let examples = backend.example_sentences(&ids).await.unwrap();
        assert!(!examples.is_empty());
        let none = backend.example_sentences(&[]).await.unwrap();
        assert!(none.is_empty());
    }
}
