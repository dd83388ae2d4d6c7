//! Process-local usage stats and tracing setup.
//!
//! Nothing here leaves the process: view counters feed the "trending" strip
//! on the web home page and per-visitor recents power "your recent lookups".
//! Bounded collections keep memory flat under unbounded visitor churn.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_RECENT_PER_VISITOR: usize = 8;
const MAX_VISITORS: usize = 1024;

#[cfg(any(feature = "cli", feature = "web"))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingWord {
    pub root_word_id: i64,
    pub word: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentLookup {
    pub root_word_id: i64,
    pub word: String,
}

#[derive(Default)]
struct ViewEntry {
    word: String,
    views: u64,
}

#[derive(Default)]
struct VisitorEntry {
    recent: VecDeque<RecentLookup>,
    last_seen: u64,
}

#[derive(Default)]
struct StatsInner {
    views: HashMap<i64, ViewEntry>,
    visitors: HashMap<String, VisitorEntry>,
}

#[derive(Default)]
pub struct LookupStats {
    inner: RwLock<StatsInner>,
}

impl LookupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_view(&self, visitor: &str, root_word_id: i64, word: &str) {
        let now = now_ts();
        let mut inner = self.inner.write();
        let entry = inner.views.entry(root_word_id).or_default();
        entry.views += 1;
        if entry.word.is_empty() {
            entry.word = word.to_string();
        }

        if !inner.visitors.contains_key(visitor) && inner.visitors.len() >= MAX_VISITORS {
            evict_stalest_visitor(&mut inner.visitors);
        }
        let visitor_entry = inner.visitors.entry(visitor.to_string()).or_default();
        visitor_entry.last_seen = now;
        visitor_entry
            .recent
            .retain(|lookup| lookup.root_word_id != root_word_id);
        visitor_entry.recent.push_front(RecentLookup {
            root_word_id,
            word: word.to_string(),
        });
        visitor_entry.recent.truncate(MAX_RECENT_PER_VISITOR);
    }

    /// Most-viewed words, ties broken alphabetically.
    pub fn trending(&self, limit: usize) -> Vec<TrendingWord> {
        let inner = self.inner.read();
        let mut rows: Vec<TrendingWord> = inner
            .views
            .iter()
            .map(|(&root_word_id, entry)| TrendingWord {
                root_word_id,
                word: entry.word.clone(),
                views: entry.views,
            })
            .collect();
        rows.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.word.cmp(&b.word)));
        rows.truncate(limit);
        rows
    }

    /// Latest lookups of one visitor, newest first.
    pub fn recent(&self, visitor: &str, limit: usize) -> Vec<RecentLookup> {
        let inner = self.inner.read();
        inner
            .visitors
            .get(visitor)
            .map(|entry| entry.recent.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

fn evict_stalest_visitor(visitors: &mut HashMap<String, VisitorEntry>) {
    if let Some(stalest) = visitors
        .iter()
        .min_by_key(|(_, entry)| entry.last_seen)
        .map(|(id, _)| id.clone())
    {
        visitors.remove(&stalest);
    }
}

fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trending_sorts_by_views_then_word() {
        let stats = LookupStats::new();
        stats.record_view("v1", 7, "pes");
        stats.record_view("v2", 7, "pes");
        stats.record_view("v1", 8, "kočka");
        let trending = stats.trending(10);
        assert_eq!(trending[0].word, "pes");
        assert_eq!(trending[0].views, 2);
        assert_eq!(trending[1].word, "kočka");
    }

    #[test]
    fn recent_is_per_visitor_and_deduplicated() {
        let stats = LookupStats::new();
        stats.record_view("v1", 7, "pes");
        stats.record_view("v1", 8, "kočka");
        stats.record_view("v1", 7, "pes");
        let recent = stats.recent("v1", 10);
        let words: Vec<&str> = recent.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["pes", "kočka"]);
        assert!(stats.recent("v2", 10).is_empty());
    }

    #[test]
    fn recent_list_is_bounded() {
        let stats = LookupStats::new();
        for id in 0..20 {
            stats.record_view("v1", id, &format!("slovo{id}"));
        }
        assert_eq!(stats.recent("v1", 100).len(), MAX_RECENT_PER_VISITOR);
    }
}
