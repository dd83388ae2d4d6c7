//! Typed mirror of the hosted dictionary schema.
//!
//! Every record here is a read-only projection fetched from the backend;
//! nothing in this crate creates, mutates, or deletes them. Wire names match
//! the backend enums exactly, so Czech text and grammatical tags pass through
//! verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordType {
    Noun,
    Verb,
    Pronoun,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Numeral,
}

impl WordType {
    /// Compact tag rendered next to a search hit.
    pub fn short_label(&self) -> &'static str {
        match self {
            WordType::Noun => "noun",
            WordType::Verb => "verb",
            WordType::Adjective => "adj",
            WordType::Adverb => "adv",
            WordType::Pronoun => "pron",
            WordType::Preposition => "prep",
            WordType::Conjunction => "conj",
            WordType::Numeral => "num",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WordType::Noun => "noun",
            WordType::Verb => "verb",
            WordType::Pronoun => "pronoun",
            WordType::Adjective => "adjective",
            WordType::Adverb => "adverb",
            WordType::Preposition => "preposition",
            WordType::Conjunction => "conjunction",
            WordType::Numeral => "numeral",
        }
    }
}

impl fmt::Display for WordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordAspect {
    Perfective,
    Imperfective,
}

impl WordAspect {
    pub fn short_label(&self) -> &'static str {
        match self {
            WordAspect::Perfective => "pf.",
            WordAspect::Imperfective => "impf.",
        }
    }
}

impl fmt::Display for WordAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordAspect::Perfective => f.write_str("perfective"),
            WordAspect::Imperfective => f.write_str("imperfective"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    MasculineAnimate,
    Feminine,
    Neuter,
    MasculineInanimate,
    Masculine,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gender::MasculineAnimate => "masculine_animate",
            Gender::Feminine => "feminine",
            Gender::Neuter => "neuter",
            Gender::MasculineInanimate => "masculine_inanimate",
            Gender::Masculine => "masculine",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Person {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
}

impl Person {
    /// Ordinal label used in form descriptions ("1st Person" etc.).
    pub fn ordinal(&self) -> &'static str {
        match self {
            Person::First => "1st",
            Person::Second => "2nd",
            Person::Third => "3rd",
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Person::First => f.write_str("1"),
            Person::Second => f.write_str("2"),
            Person::Third => f.write_str("3"),
        }
    }
}

/// Conjugation tables read singular-then-plural; anything the backend sends
/// outside the known pair sorts after both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plurality {
    Singular,
    Plural,
    #[serde(other)]
    Unspecified,
}

impl fmt::Display for Plurality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Plurality::Singular => "singular",
            Plurality::Plural => "plural",
            Plurality::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tense {
    Present,
    Past,
    Future,
}

impl fmt::Display for Tense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tense::Present => "present",
            Tense::Past => "past",
            Tense::Future => "future",
        };
        f.write_str(name)
    }
}

/// Grammatical axis a form belongs to. Categories the display layer has no
/// dedicated section for (including `voice`) fall back to the "Other" label
/// but still group under their own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormCategory {
    Case,
    Tense,
    Mood,
    Voice,
    Participle,
    Degree,
    VerbalNoun,
    #[serde(other)]
    Other,
}

impl fmt::Display for FormCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormCategory::Case => "case",
            FormCategory::Tense => "tense",
            FormCategory::Mood => "mood",
            FormCategory::Voice => "voice",
            FormCategory::Participle => "participle",
            FormCategory::Degree => "degree",
            FormCategory::VerbalNoun => "verbal_noun",
            FormCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// Canonical dictionary headword (lemma).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootWord {
    pub id: i64,
    pub in_czech: String,
    pub in_english: String,
    pub word_type: WordType,
    #[serde(default)]
    pub word_aspect: Option<WordAspect>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Metadata describing what kind of form a [`WordForm`] is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormType {
    pub name: String,
    pub category: FormCategory,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// One inflected/conjugated surface realization of a root word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordForm {
    pub id: i64,
    pub form_in_czech: String,
    pub form_type_id: i64,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub plurality: Plurality,
    #[serde(default)]
    pub person: Option<Person>,
    #[serde(default)]
    pub tense: Option<Tense>,
    pub is_primary: bool,
    pub form_type: FormType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleSentence {
    pub id: i64,
    pub czech_sentence: String,
    pub english_sentence: String,
    #[serde(default)]
    pub explanation: Option<String>,
    pub word_form_id: i64,
}

/// One ranked autocomplete row from the backend search function.
///
/// A root word can match through several of its forms, so the identity key of
/// a row is `(root_word_id, matched_form)`, not the root word id alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub root_word_id: i64,
    pub root_word_czech: String,
    pub root_word_english: String,
    pub word_type: WordType,
    #[serde(default)]
    pub word_aspect: Option<WordAspect>,
    pub matched_form: String,
    pub form_type_name: String,
    pub rank: f64,
    pub similarity: f64,
    #[serde(default)]
    pub example_czech: Option<String>,
    #[serde(default)]
    pub example_english: Option<String>,
    #[serde(default)]
    pub root_word_note: Option<String>,
}

impl SearchResult {
    /// Stable key for a selectable autocomplete row.
    pub fn selection_key(&self) -> String {
        format!("{}-{}", self.root_word_id, self.matched_form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_wire_names_match_backend_schema() {
        assert_eq!(
            serde_json::to_string(&FormCategory::VerbalNoun).unwrap(),
            "\"verbal_noun\""
        );
        assert_eq!(
            serde_json::to_string(&Gender::MasculineAnimate).unwrap(),
            "\"masculine_animate\""
        );
        assert_eq!(serde_json::to_string(&Person::Second).unwrap(), "\"2\"");
        assert_eq!(
            serde_json::from_str::<Tense>("\"past\"").unwrap(),
            Tense::Past
        );
    }

    #[test]
    fn unknown_category_falls_back_to_other() {
        let category: FormCategory = serde_json::from_str("\"interjection_form\"").unwrap();
        assert_eq!(category, FormCategory::Other);
    }

    #[test]
    fn unknown_plurality_falls_back_to_unspecified() {
        let plurality: Plurality = serde_json::from_str("\"dual\"").unwrap();
        assert_eq!(plurality, Plurality::Unspecified);
    }

    #[test]
    fn word_type_labels() {
        assert_eq!(WordType::Adjective.short_label(), "adj");
        assert_eq!(WordType::Pronoun.short_label(), "pron");
        assert_eq!(WordAspect::Imperfective.short_label(), "impf.");
    }

    #[test]
    fn search_result_decodes_without_optional_fields() {
        let row: SearchResult = serde_json::from_str(
            r#"{
                "root_word_id": 7,
                "root_word_czech": "pes",
                "root_word_english": "dog",
                "word_type": "noun",
                "matched_form": "psa",
                "form_type_name": "accusative",
                "rank": 0.62,
                "similarity": 0.5
            }"#,
        )
        .unwrap();
        assert_eq!(row.selection_key(), "7-psa");
        assert!(row.word_aspect.is_none());
        assert!(row.root_word_note.is_none());
    }
}
