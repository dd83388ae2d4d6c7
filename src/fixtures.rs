//! Shared demo dataset: three headwords with enough grammatical spread to
//! exercise grouping, tense ordering, and the preview/remainder split.

use crate::model::{
    ExampleSentence, FormCategory, FormType, Gender, Person, Plurality, RootWord, SearchResult,
    Tense, WordAspect, WordForm, WordType,
};
use crate::store::MemoryBackend;

pub(crate) const PES: i64 = 7;
pub(crate) const KOCKA: i64 = 8;
pub(crate) const CIST: i64 = 9;

fn form_type(name: &str, category: FormCategory) -> FormType {
    FormType {
        name: name.to_string(),
        category,
        explanation: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn form(
    id: i64,
    czech: &str,
    form_type_id: i64,
    form_type_value: FormType,
    gender: Option<Gender>,
    plurality: Plurality,
    person: Option<Person>,
    tense: Option<Tense>,
    is_primary: bool,
) -> WordForm {
    WordForm {
        id,
        form_in_czech: czech.to_string(),
        form_type_id,
        gender,
        plurality,
        person,
        tense,
        is_primary,
        form_type: form_type_value,
    }
}

fn example(id: i64, czech: &str, english: &str, word_form_id: i64) -> ExampleSentence {
    ExampleSentence {
        id,
        czech_sentence: czech.to_string(),
        english_sentence: english.to_string(),
        explanation: None,
        word_form_id,
    }
}

#[allow(clippy::too_many_arguments)]
fn hit(
    root_word_id: i64,
    czech: &str,
    english: &str,
    word_type: WordType,
    word_aspect: Option<WordAspect>,
    matched_form: &str,
    form_type_name: &str,
    rank: f64,
    similarity: f64,
) -> SearchResult {
    SearchResult {
        root_word_id,
        root_word_czech: czech.to_string(),
        root_word_english: english.to_string(),
        word_type,
        word_aspect,
        matched_form: matched_form.to_string(),
        form_type_name: form_type_name.to_string(),
        rank,
        similarity,
        example_czech: None,
        example_english: None,
        root_word_note: None,
    }
}

pub(crate) fn populate(backend: &MemoryBackend) {
    backend.insert_word(RootWord {
        id: PES,
        in_czech: "pes".to_string(),
        in_english: "dog".to_string(),
        word_type: WordType::Noun,
        word_aspect: None,
        note: Some("Masculine animate noun.".to_string()),
    });
    backend.insert_word(RootWord {
        id: KOCKA,
        in_czech: "kočka".to_string(),
        in_english: "cat".to_string(),
        word_type: WordType::Noun,
        word_aspect: None,
        note: None,
    });
    backend.insert_word(RootWord {
        id: CIST,
        in_czech: "číst".to_string(),
        in_english: "to read".to_string(),
        word_type: WordType::Verb,
        word_aspect: Some(WordAspect::Imperfective),
        note: None,
    });

    let animate = Some(Gender::MasculineAnimate);
    for f in [
        form(71, "pes", 1, form_type("nominative", FormCategory::Case), animate, Plurality::Singular, None, None, true),
        form(72, "psa", 2, form_type("genitive", FormCategory::Case), animate, Plurality::Singular, None, None, false),
        form(73, "psovi", 3, form_type("dative", FormCategory::Case), animate, Plurality::Singular, None, None, false),
        form(74, "psi", 4, form_type("nominative plural", FormCategory::Case), animate, Plurality::Plural, None, None, false),
    ] {
        backend.insert_form(PES, f);
    }

    let feminine = Some(Gender::Feminine);
    for f in [
        form(81, "kočka", 1, form_type("nominative", FormCategory::Case), feminine, Plurality::Singular, None, None, true),
        form(82, "kočky", 2, form_type("genitive", FormCategory::Case), feminine, Plurality::Singular, None, None, false),
    ] {
        backend.insert_form(KOCKA, f);
    }

    let present = Some(Tense::Present);
    for f in [
        form(91, "čtu", 10, form_type("present", FormCategory::Tense), None, Plurality::Singular, Some(Person::First), present, true),
        form(92, "čteš", 10, form_type("present", FormCategory::Tense), None, Plurality::Singular, Some(Person::Second), present, false),
        form(93, "čte", 10, form_type("present", FormCategory::Tense), None, Plurality::Singular, Some(Person::Third), present, false),
        form(94, "čteme", 10, form_type("present", FormCategory::Tense), None, Plurality::Plural, Some(Person::First), present, false),
        form(95, "čtete", 10, form_type("present", FormCategory::Tense), None, Plurality::Plural, Some(Person::Second), present, false),
        form(96, "čtou", 10, form_type("present", FormCategory::Tense), None, Plurality::Plural, Some(Person::Third), present, false),
        form(97, "čtení", 20, form_type("verbal noun", FormCategory::VerbalNoun), Some(Gender::Neuter), Plurality::Singular, None, None, false),
    ] {
        backend.insert_form(CIST, f);
    }

    backend.insert_example(example(701, "Pes štěká na poštáka.", "The dog barks at the mailman.", 71));
    backend.insert_example(example(702, "Vidím velkého psa.", "I see a big dog.", 72));
    backend.insert_example(example(801, "Kočka spí na gauči.", "The cat sleeps on the couch.", 81));
    backend.insert_example(example(901, "Čtu zajímavou knihu.", "I am reading an interesting book.", 91));

    for row in [
        hit(PES, "pes", "dog", WordType::Noun, None, "pes", "nominative", 0.95, 1.0),
        hit(PES, "pes", "dog", WordType::Noun, None, "psa", "genitive", 0.62, 0.5),
        hit(KOCKA, "kočka", "cat", WordType::Noun, None, "kočka", "nominative", 0.9, 1.0),
        hit(
            CIST,
            "číst",
            "to read",
            WordType::Verb,
            Some(WordAspect::Imperfective),
            "číst",
            "infinitive",
            0.88,
            1.0,
        ),
        hit(
            CIST,
            "číst",
            "to read",
            WordType::Verb,
            Some(WordAspect::Imperfective),
            "čtu",
            "present",
            0.41,
            0.4,
        ),
    ] {
        backend.index_search_row(row);
    }
}
