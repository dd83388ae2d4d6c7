//! Debounced search coordination.
//!
//! [`SearchCoordinator`] owns the raw input text and turns bursts of
//! keystrokes into at most one committed query per quiet period
//! (trailing-edge debounce: the commit fires `quiet_period` after the *last*
//! edit of a burst, and only the last value ever commits). Committed values
//! shorter than the minimum length clear results without touching the
//! network. Lookups run as spawned tasks and report back through a channel;
//! a generation counter guarantees that a response for a superseded query is
//! never displayed, no matter what order completions arrive in.

use crate::model::SearchResult;
use crate::store::{SearchService, StoreError};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

const CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Quiet period after the last keystroke before a value commits.
    pub quiet_period: Duration,
    /// Maximum number of rows requested from the backend.
    pub limit: usize,
    /// Committed values shorter than this never issue a request.
    pub min_query_len: usize,
    /// Freshness window for cached result sets.
    pub cache_ttl: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(300),
            limit: 10,
            min_query_len: 2,
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Exposed coordinator state. `Idle` covers both "nothing typed yet" and
/// "committed value below the minimum length".
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Loading,
    Ready(Vec<SearchResult>),
    Failed(String),
}

struct Pending {
    value: String,
    due: Instant,
}

struct Completion {
    generation: u64,
    query: String,
    limit: usize,
    outcome: Result<Vec<SearchResult>, StoreError>,
}

struct CacheSlot {
    fetched_at: Instant,
    rows: Vec<SearchResult>,
}

pub struct SearchCoordinator<S> {
    service: Arc<S>,
    options: SearchOptions,
    raw: String,
    committed: String,
    pending: Option<Pending>,
    generation: u64,
    state: SearchState,
    cache: LruCache<(String, usize), CacheSlot>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<S: SearchService + 'static> SearchCoordinator<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_options(service, SearchOptions::default())
    }

    pub fn with_options(service: Arc<S>, options: SearchOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            options,
            raw: String::new(),
            committed: String::new(),
            pending: None,
            generation: 0,
            state: SearchState::Idle,
            cache: LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap()),
            tx,
            rx,
        }
    }

    /// Raw text as typed, updated immediately on every [`set_input`] call.
    ///
    /// [`set_input`]: SearchCoordinator::set_input
    pub fn input(&self) -> &str {
        &self.raw
    }

    /// Result rows for the most recently committed qualifying query. Empty
    /// while idle, loading, or failed.
    pub fn results(&self) -> &[SearchResult] {
        match &self.state {
            SearchState::Ready(rows) => rows,
            _ => &[],
        }
    }

    /// True only while a qualifying request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SearchState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SearchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Updates the raw text and re-arms the single pending commit. Calling
    /// again before the quiet period elapses replaces the pending value and
    /// restarts the timer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.raw.clone_from(&text);
        self.pending = Some(Pending {
            due: Instant::now() + self.options.quiet_period,
            value: text,
        });
    }

    /// Clears raw and committed text and the result list synchronously.
    /// In-flight lookups are orphaned and their completions discarded.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.committed.clear();
        self.pending = None;
        self.generation += 1;
        self.state = SearchState::Idle;
    }

    /// Performs the next internal transition: the pending commit once its
    /// quiet period elapses, or the application of a finished lookup,
    /// whichever happens first. Returns `false` when there is nothing left
    /// to drive.
    pub async fn step(&mut self) -> bool {
        // Drain completions that finished while the caller was away; stale
        // ones are discarded inside apply().
        while let Ok(done) = self.rx.try_recv() {
            self.apply(done);
        }
        let due = self.pending.as_ref().map(|p| p.due);
        match (due, self.is_loading()) {
            (Some(due), true) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(due) => self.commit(),
                    Some(done) = self.rx.recv() => self.apply(done),
                }
                true
            }
            (Some(due), false) => {
                tokio::time::sleep_until(due).await;
                self.commit();
                true
            }
            (None, true) => {
                if let Some(done) = self.rx.recv().await {
                    self.apply(done);
                }
                true
            }
            (None, false) => false,
        }
    }

    /// Drives [`step`] until the coordinator is idle: no pending commit and
    /// no in-flight lookup for the current generation.
    ///
    /// [`step`]: SearchCoordinator::step
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn commit(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let value = pending.value;
        self.committed.clone_from(&value);
        // Any lookup still in flight belongs to an older committed value now.
        self.generation += 1;
        if value.chars().count() < self.options.min_query_len {
            self.state = SearchState::Idle;
            return;
        }
        let key = (value.clone(), self.options.limit);
        if let Some(slot) = self.cache.get(&key) {
            if slot.fetched_at.elapsed() <= self.options.cache_ttl {
                debug!(query = %value, "search cache hit");
                self.state = SearchState::Ready(slot.rows.clone());
                return;
            }
        }
        self.state = SearchState::Loading;
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let generation = self.generation;
        let limit = self.options.limit;
        tokio::spawn(async move {
            let outcome = service.search(&value, limit).await;
            let _ = tx.send(Completion {
                generation,
                query: value,
                limit,
                outcome,
            });
        });
    }

    fn apply(&mut self, done: Completion) {
        // Successful responses are worth caching even when superseded; a
        // retyped query within the freshness window hits them.
        if let Ok(rows) = &done.outcome {
            self.cache.put(
                (done.query.clone(), done.limit),
                CacheSlot {
                    fetched_at: Instant::now(),
                    rows: rows.clone(),
                },
            );
        }
        if done.generation != self.generation {
            debug!(query = %done.query, "discarding superseded search response");
            return;
        }
        self.state = match done.outcome {
            Ok(rows) => SearchState::Ready(rows),
            Err(err) => SearchState::Failed(err.to_string()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use tokio::time::advance;

    fn coordinator(backend: Arc<MemoryBackend>) -> SearchCoordinator<MemoryBackend> {
        SearchCoordinator::new(backend)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_commits_only_final_value() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("p");
        advance(Duration::from_millis(100)).await;
        search.set_input("pe");
        advance(Duration::from_millis(100)).await;
        search.set_input("pes");
        search.settle().await;

        assert_eq!(backend.search_log(), vec!["pes".to_string()]);
        assert_eq!(search.input(), "pes");
        assert!(!search.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sub_threshold_input_is_quiescent() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("p");
        search.settle().await;

        assert!(backend.search_log().is_empty());
        assert!(search.results().is_empty());
        assert!(!search.is_loading());
        assert!(search.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn diacritics_count_as_single_characters_for_gating() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = coordinator(Arc::clone(&backend));

        // Two characters, four bytes. Must qualify.
        search.set_input("čt");
        search.settle().await;

        assert_eq!(backend.search_log(), vec!["čt".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_query_wins_over_slower_older_response() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        backend.set_search_delay("ps", Duration::from_millis(500));
        backend.set_search_delay("pes", Duration::from_millis(50));
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("ps");
        // First step commits "ps" after the quiet period; its lookup hangs.
        assert!(search.step().await);
        assert!(search.is_loading());

        search.set_input("pes");
        search.settle().await;
        let displayed: Vec<String> = search
            .results()
            .iter()
            .map(|r| r.matched_form.clone())
            .collect();
        assert!(displayed.iter().any(|f| f == "pes"));

        // The "ps" response is still in flight when settle() returns. Let it
        // arrive and confirm it is discarded, not displayed.
        advance(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        search.step().await;
        let after: Vec<String> = search
            .results()
            .iter()
            .map(|r| r.matched_form.clone())
            .collect();
        assert_eq!(displayed, after);
        assert_eq!(backend.search_log(), vec!["ps".to_string(), "pes".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_query_within_ttl_hits_cache() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("pes");
        search.settle().await;
        assert_eq!(backend.search_log().len(), 1);

        search.set_input("kočka");
        search.settle().await;
        search.set_input("pes");
        search.settle().await;
        // "pes" served from cache; only "kočka" added a call.
        assert_eq!(backend.search_log().len(), 2);
        assert!(!search.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cache_entry_expires_after_ttl() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("pes");
        search.settle().await;
        assert_eq!(backend.search_log().len(), 1);

        advance(Duration::from_secs(6 * 60)).await;
        search.set_input("pes");
        search.settle().await;
        assert_eq!(backend.search_log().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_synchronously_and_orphans_inflight_lookup() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        backend.set_search_delay("pes", Duration::from_millis(200));
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("pes");
        assert!(search.step().await);
        assert!(search.is_loading());

        search.reset();
        assert_eq!(search.input(), "");
        assert!(search.results().is_empty());
        assert!(!search.is_loading());

        advance(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        search.step().await;
        assert!(search.results().is_empty());
        assert_eq!(*search.state(), SearchState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_surfaces_message_and_clears_results() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = coordinator(Arc::clone(&backend));

        search.set_input("pes");
        search.settle().await;
        assert!(!search.results().is_empty());

        backend.fail_search("kočka");
        search.set_input("kočka");
        search.settle().await;
        assert!(search.results().is_empty());
        let message = search.error().expect("error message");
        assert!(message.contains("kočka"));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_tracks_inflight_request_only() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        backend.set_search_delay("pes", Duration::from_millis(100));
        let mut search = coordinator(Arc::clone(&backend));

        assert!(!search.is_loading());
        search.set_input("pes");
        assert!(!search.is_loading());
        assert!(search.step().await);
        assert!(search.is_loading());
        search.settle().await;
        assert!(!search.is_loading());
    }
}
