//! Core of a Czech-English dictionary app: debounced incremental search,
//! word-detail assembly with grammar-aware grouping, and thin backend
//! clients. The optional `web` feature serves the same core over HTTP and
//! the optional `cli` feature drives it from a terminal.

pub mod backend;
pub mod detail;
mod fixtures;
pub mod model;
pub mod search;
pub mod session;
pub mod store;
pub mod telemetry;
#[cfg(feature = "web")]
pub mod web;

pub use backend::{BackendConfig, HttpBackend};
pub use detail::{DetailPresenter, FormEntry, FormSection, PREVIEW_COUNT, WordDetails};
pub use model::{
    ExampleSentence, FormCategory, FormType, Gender, Person, Plurality, RootWord, SearchResult,
    Tense, WordAspect, WordForm, WordType,
};
pub use search::{SearchCoordinator, SearchOptions, SearchState};
pub use session::{
    SessionProvider, StaticSession, UserIdentity, Vocabulary, VocabularyError, VocabularyStub,
};
pub use store::{MemoryBackend, SearchService, StoreError, WordStore};
pub use telemetry::{LookupStats, RecentLookup, TrendingWord};
