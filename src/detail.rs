//! Word-detail assembly: fetch, group, sort, and enrich a root word's forms.
//!
//! The view-model is rebuilt from scratch on every load. Grouping keys are
//! the raw form-type categories, so `voice` forms keep their own section even
//! though the display layer labels it "Other". Only the tense section is
//! re-sorted; every other section keeps the backend's form-type-id order.

use crate::model::{
    ExampleSentence, FormCategory, Person, Plurality, RootWord, WordForm,
};
use crate::store::{StoreError, WordStore};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Visible prefix of each section before the reader expands it.
pub const PREVIEW_COUNT: usize = 3;

const DETAIL_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryMeta {
    pub label: &'static str,
    pub icon: &'static str,
}

pub fn category_meta(category: FormCategory) -> CategoryMeta {
    match category {
        FormCategory::Case => CategoryMeta { label: "Cases", icon: "layers" },
        FormCategory::Tense => CategoryMeta { label: "Tenses", icon: "timer" },
        FormCategory::Mood => CategoryMeta { label: "Moods", icon: "book-open" },
        FormCategory::Participle => CategoryMeta { label: "Participles", icon: "file-text" },
        FormCategory::Degree => CategoryMeta { label: "Degrees", icon: "trending-up" },
        FormCategory::VerbalNoun => CategoryMeta { label: "Verbal Noun", icon: "type" },
        FormCategory::Voice | FormCategory::Other => {
            CategoryMeta { label: "Other", icon: "more-horizontal" }
        }
    }
}

/// Human-readable grammatical summary of a form: ordinal person, gender,
/// plurality, tense, in that fixed order, absent fields omitted.
pub fn describe_form(form: &WordForm) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(person) = form.person {
        parts.push(format!("{} Person", person.ordinal()));
    }
    if let Some(gender) = form.gender {
        parts.push(gender.to_string());
    }
    if form.plurality != Plurality::Unspecified {
        parts.push(form.plurality.to_string());
    }
    if let Some(tense) = form.tense {
        parts.push(tense.to_string());
    }
    parts.join(" ")
}

/// One form enriched for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormEntry {
    pub form: WordForm,
    pub description: String,
    pub example: Option<ExampleSentence>,
}

/// A per-category grouping of forms with a strict preview/remainder split
/// and independent expand/collapse state (default collapsed).
#[derive(Debug, Clone, PartialEq)]
pub struct FormSection {
    category: FormCategory,
    meta: CategoryMeta,
    forms: Vec<FormEntry>,
    expanded: bool,
}

impl FormSection {
    pub fn category(&self) -> FormCategory {
        self.category
    }

    pub fn meta(&self) -> CategoryMeta {
        self.meta
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// The full sorted form list.
    pub fn forms(&self) -> &[FormEntry] {
        &self.forms
    }

    /// First [`PREVIEW_COUNT`] entries (fewer when the section is smaller).
    pub fn preview(&self) -> &[FormEntry] {
        &self.forms[..self.forms.len().min(PREVIEW_COUNT)]
    }

    /// Everything past the preview; empty when the section fits entirely.
    pub fn remainder(&self) -> &[FormEntry] {
        if self.forms.len() <= PREVIEW_COUNT {
            &[]
        } else {
            &self.forms[PREVIEW_COUNT..]
        }
    }

    /// Whether a toggle control should be offered at all.
    pub fn has_remainder(&self) -> bool {
        self.forms.len() > PREVIEW_COUNT
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Entries currently visible given the expansion state.
    pub fn visible(&self) -> &[FormEntry] {
        if self.expanded {
            &self.forms
        } else {
            self.preview()
        }
    }
}

/// Fully assembled detail view-model for one root word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordDetails {
    pub root: RootWord,
    sections: Vec<FormSection>,
}

impl WordDetails {
    /// Groups, sorts, and enriches the fetched records. Section order is
    /// first-encounter order of categories in the base fetch order.
    pub fn assemble(
        root: RootWord,
        forms: Vec<WordForm>,
        examples: Vec<ExampleSentence>,
    ) -> Self {
        let mut examples_by_form: HashMap<i64, ExampleSentence> = HashMap::new();
        for example in examples {
            // Last one wins on duplicate ids; each form shows at most one.
            examples_by_form.insert(example.word_form_id, example);
        }

        let mut order: Vec<FormCategory> = Vec::new();
        let mut grouped: HashMap<FormCategory, Vec<WordForm>> = HashMap::new();
        for form in forms {
            let category = form.form_type.category;
            if !grouped.contains_key(&category) {
                order.push(category);
            }
            grouped.entry(category).or_default().push(form);
        }

        let sections = order
            .into_iter()
            .map(|category| {
                let mut group = grouped.remove(&category).unwrap_or_default();
                if category == FormCategory::Tense {
                    sort_tense_forms(&mut group);
                }
                let forms = group
                    .into_iter()
                    .map(|form| FormEntry {
                        description: describe_form(&form),
                        example: examples_by_form.get(&form.id).cloned(),
                        form,
                    })
                    .collect();
                FormSection {
                    category,
                    meta: category_meta(category),
                    forms,
                    expanded: false,
                }
            })
            .collect();

        Self { root, sections }
    }

    pub fn sections(&self) -> &[FormSection] {
        &self.sections
    }

    pub fn section(&self, category: FormCategory) -> Option<&FormSection> {
        self.sections.iter().find(|s| s.category == category)
    }

    /// Toggles one section's remainder visibility without touching the
    /// others. Returns `false` when the section is missing or offers no
    /// toggle (empty remainder).
    pub fn toggle(&mut self, category: FormCategory) -> bool {
        match self.sections.iter_mut().find(|s| s.category == category) {
            Some(section) if section.has_remainder() => {
                section.expanded = !section.expanded;
                true
            }
            _ => false,
        }
    }

    pub fn expand_all(&mut self) {
        for section in &mut self.sections {
            if section.has_remainder() {
                section.expanded = true;
            }
        }
    }
}

/// Conjugation-table order: singular before plural, then person 1, 2, 3.
/// Unrecognized plurality and absent person both sort last in their tier.
fn sort_tense_forms(forms: &mut [WordForm]) {
    forms.sort_by_key(|form| (plurality_rank(form.plurality), person_rank(form.person)));
}

fn plurality_rank(plurality: Plurality) -> u8 {
    match plurality {
        Plurality::Singular => 0,
        Plurality::Plural => 1,
        Plurality::Unspecified => 2,
    }
}

fn person_rank(person: Option<Person>) -> u8 {
    match person {
        Some(Person::First) => 0,
        Some(Person::Second) => 1,
        Some(Person::Third) => 2,
        None => 3,
    }
}

struct DetailSlot {
    fetched_at: Instant,
    details: WordDetails,
}

/// Loads and caches assembled word details.
///
/// Root word and form list are fetched concurrently; example sentences
/// depend on the fetched form ids and run after. Any failed fetch aborts the
/// whole load, so a partially assembled view-model is never observable.
pub struct DetailPresenter<W> {
    store: Arc<W>,
    cache_ttl: Duration,
    cache: Mutex<LruCache<i64, DetailSlot>>,
}

impl<W: WordStore> DetailPresenter<W> {
    pub fn new(store: Arc<W>) -> Self {
        Self::with_cache_ttl(store, Duration::from_secs(10 * 60))
    }

    pub fn with_cache_ttl(store: Arc<W>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache_ttl,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(DETAIL_CACHE_CAPACITY).unwrap(),
            )),
        }
    }

    pub async fn load(&self, root_word_id: i64) -> Result<WordDetails, StoreError> {
        if let Some(slot) = self.cache.lock().get(&root_word_id) {
            if slot.fetched_at.elapsed() <= self.cache_ttl {
                debug!(root_word_id, "detail cache hit");
                return Ok(slot.details.clone());
            }
        }
        let (root, forms) = tokio::try_join!(
            self.store.root_word(root_word_id),
            self.store.word_forms(root_word_id),
        )?;
        let form_ids: Vec<i64> = forms.iter().map(|f| f.id).collect();
        let examples = self.store.example_sentences(&form_ids).await?;
        let details = WordDetails::assemble(root, forms, examples);
        self.cache.lock().put(
            root_word_id,
            DetailSlot {
                fetched_at: Instant::now(),
                details: details.clone(),
            },
        );
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FormType, Gender, RootWord, Tense, WordType};
    use crate::store::MemoryBackend;

    fn root(id: i64) -> RootWord {
        RootWord {
            id,
            in_czech: "pes".to_string(),
            in_english: "dog".to_string(),
            word_type: WordType::Noun,
            word_aspect: None,
            note: None,
        }
    }

    fn tense_form(id: i64, plurality: Plurality, person: Person) -> WordForm {
        WordForm {
            id,
            form_in_czech: format!("form{id}"),
            form_type_id: 10,
            gender: None,
            plurality,
            person: Some(person),
            tense: Some(Tense::Present),
            is_primary: false,
            form_type: FormType {
                name: "present".to_string(),
                category: FormCategory::Tense,
                explanation: None,
            },
        }
    }

    fn case_form(id: i64, form_type_id: i64) -> WordForm {
        WordForm {
            id,
            form_in_czech: format!("form{id}"),
            form_type_id,
            gender: Some(Gender::MasculineAnimate),
            plurality: Plurality::Singular,
            person: None,
            tense: None,
            is_primary: false,
            form_type: FormType {
                name: "case".to_string(),
                category: FormCategory::Case,
                explanation: None,
            },
        }
    }

    fn example_for(word_form_id: i64) -> ExampleSentence {
        ExampleSentence {
            id: word_form_id * 100,
            czech_sentence: "Pes štěká.".to_string(),
            english_sentence: "The dog barks.".to_string(),
            explanation: None,
            word_form_id,
        }
    }

    #[test]
    fn tense_section_sorts_by_plurality_then_person() {
        let forms = vec![
            tense_form(1, Plurality::Plural, Person::Second),
            tense_form(2, Plurality::Singular, Person::First),
            tense_form(3, Plurality::Singular, Person::Third),
            tense_form(4, Plurality::Plural, Person::First),
        ];
        let details = WordDetails::assemble(root(1), forms, Vec::new());
        let section = details.section(FormCategory::Tense).unwrap();
        let ids: Vec<i64> = section.forms().iter().map(|e| e.form.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn non_tense_sections_keep_base_fetch_order() {
        let forms = vec![case_form(5, 3), case_form(6, 1), case_form(7, 2)];
        let details = WordDetails::assemble(root(1), forms, Vec::new());
        let section = details.section(FormCategory::Case).unwrap();
        let ids: Vec<i64> = section.forms().iter().map(|e| e.form.id).collect();
        // Base order is whatever the store returned, untouched.
        assert_eq!(ids, vec![5, 6, 7]);
    }

    #[test]
    fn preview_and_remainder_partition_strictly() {
        let forms: Vec<WordForm> = (1..=7).map(|id| case_form(id, id)).collect();
        let details = WordDetails::assemble(root(1), forms, Vec::new());
        let section = details.section(FormCategory::Case).unwrap();
        assert_eq!(section.preview().len(), 3);
        assert_eq!(section.remainder().len(), 4);
        assert!(section.has_remainder());

        let small: Vec<WordForm> = (1..=2).map(|id| case_form(id, id)).collect();
        let details = WordDetails::assemble(root(1), small, Vec::new());
        let section = details.section(FormCategory::Case).unwrap();
        assert_eq!(section.preview().len(), 2);
        assert!(section.remainder().is_empty());
        assert!(!section.has_remainder());
    }

    #[test]
    fn toggle_is_per_section_and_refused_without_remainder() {
        let mut forms: Vec<WordForm> = (1..=7).map(|id| case_form(id, id)).collect();
        forms.push(tense_form(8, Plurality::Singular, Person::First));
        let mut details = WordDetails::assemble(root(1), forms, Vec::new());

        assert!(details.toggle(FormCategory::Case));
        assert!(details.section(FormCategory::Case).unwrap().is_expanded());
        assert!(!details.section(FormCategory::Tense).unwrap().is_expanded());
        // Single-entry tense section offers no toggle.
        assert!(!details.toggle(FormCategory::Tense));
        // Toggling back collapses.
        assert!(details.toggle(FormCategory::Case));
        assert!(!details.section(FormCategory::Case).unwrap().is_expanded());
    }

    #[test]
    fn visible_follows_expansion_state() {
        let forms: Vec<WordForm> = (1..=5).map(|id| case_form(id, id)).collect();
        let mut details = WordDetails::assemble(root(1), forms, Vec::new());
        assert_eq!(details.section(FormCategory::Case).unwrap().visible().len(), 3);
        details.toggle(FormCategory::Case);
        assert_eq!(details.section(FormCategory::Case).unwrap().visible().len(), 5);
    }

    #[test]
    fn examples_attach_by_exact_form_id() {
        let forms = vec![case_form(42, 1), case_form(43, 2)];
        let details = WordDetails::assemble(root(1), forms, vec![example_for(42)]);
        let section = details.section(FormCategory::Case).unwrap();
        let by_id: HashMap<i64, &FormEntry> =
            section.forms().iter().map(|e| (e.form.id, e)).collect();
        assert!(by_id[&42].example.is_some());
        assert!(by_id[&43].example.is_none());
    }

    #[test]
    fn voice_groups_separately_under_other_label() {
        let mut voice_form = case_form(1, 1);
        voice_form.form_type.category = FormCategory::Voice;
        let mut other_form = case_form(2, 2);
        other_form.form_type.category = FormCategory::Other;
        let details = WordDetails::assemble(root(1), vec![voice_form, other_form], Vec::new());
        assert_eq!(details.sections().len(), 2);
        assert_eq!(details.sections()[0].category(), FormCategory::Voice);
        assert_eq!(details.sections()[0].meta().label, "Other");
        assert_eq!(details.sections()[1].category(), FormCategory::Other);
        assert_eq!(details.sections()[1].meta().label, "Other");
    }

    #[test]
    fn description_concatenates_present_fields_in_order() {
        let form = tense_form(1, Plurality::Singular, Person::First);
        assert_eq!(describe_form(&form), "1st Person singular present");

        let form = case_form(2, 1);
        assert_eq!(describe_form(&form), "masculine_animate singular");
    }

    #[tokio::test]
    async fn load_assembles_full_view_model() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let presenter = DetailPresenter::new(Arc::clone(&backend));
        let details = presenter.load(9).await.unwrap();

        assert_eq!(details.root.in_czech, "číst");
        let tenses = details.section(FormCategory::Tense).unwrap();
        assert_eq!(tenses.len(), 6);
        assert!(tenses.has_remainder());
        let order: Vec<&str> = tenses
            .forms()
            .iter()
            .map(|e| e.form.form_in_czech.as_str())
            .collect();
        assert_eq!(order, vec!["čtu", "čteš", "čte", "čteme", "čtete", "čtou"]);
        assert!(tenses.forms()[0].example.is_some());
        assert!(details.section(FormCategory::VerbalNoun).is_some());
    }

    #[tokio::test]
    async fn load_fails_whole_operation_on_missing_root() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let presenter = DetailPresenter::new(Arc::clone(&backend));
        let err = presenter.load(404).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn end_to_end_selection_scenario() {
        // Type "pes", commit, pick root_word_id 7, load details.
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let mut search = crate::search::SearchCoordinator::new(Arc::clone(&backend));
        search.set_input("pes");
        search.settle().await;
        let selected = search
            .results()
            .iter()
            .find(|r| r.matched_form == "pes")
            .expect("pes in results")
            .root_word_id;
        assert_eq!(selected, 7);

        let presenter = DetailPresenter::new(Arc::clone(&backend));
        let details = presenter.load(selected).await.unwrap();
        assert_eq!(details.root.in_english, "dog");
        let cases = details.section(FormCategory::Case).unwrap();
        assert_eq!(cases.preview().len(), 3);
        assert_eq!(cases.remainder().len(), 1);
    }

    #[tokio::test]
    async fn detail_cache_serves_repeat_loads() {
        let backend = Arc::new(MemoryBackend::with_fixtures());
        let presenter = DetailPresenter::new(Arc::clone(&backend));
        let first = presenter.load(7).await.unwrap();
        let second = presenter.load(7).await.unwrap();
        assert_eq!(first, second);
    }
}
