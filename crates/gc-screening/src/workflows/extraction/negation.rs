use regex::Regex;
use std::sync::OnceLock;

static NEGATION_CUE: OnceLock<Regex> = OnceLock::new();
static LIST_NEGATION_CUE: OnceLock<Regex> = OnceLock::new();
static TRAILING_NEGATION: OnceLock<Regex> = OnceLock::new();
static OTHER_PERSON_CUE: OnceLock<Regex> = OnceLock::new();
static NEW_PREDICATE: OnceLock<Regex> = OnceLock::new();

const LOOKBACK_WORDS: usize = 6;
const LOOKAHEAD_CHARS: usize = 32;

fn negation_cue() -> &'static Regex {
    NEGATION_CUE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:no|not|denies|denied|deny|without|negative for|neg for|ruled out|never had|never|no history of|no hx of|no h/o|absence of|free of|non)\b",
        )
        .expect("negation cue pattern compiles")
    })
}

fn list_negation_cue() -> &'static Regex {
    LIST_NEGATION_CUE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:denies|denied|negative for|no history of|no hx of|no h/o|never had|no)\b",
        )
        .expect("list negation pattern compiles")
    })
}

fn trailing_negation() -> &'static Regex {
    TRAILING_NEGATION.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:[:=-]\s*)?(?:was\s+|were\s+|is\s+)?(?:negative|neg\b|non-?reactive|not detected|ruled out|absent)",
        )
        .expect("trailing negation pattern compiles")
    })
}

fn other_person_cue() -> &'static Regex {
    OTHER_PERSON_CUE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:family history|fhx|fh of|mother|father|sister|brother|aunt|uncle|grandmother|grandfather|cousin|husband|partner's|spouse)\b",
        )
        .expect("other person pattern compiles")
    })
}

/// Verbs and history markers that open a new statement inside a comma-separated sentence.
fn new_predicate() -> &'static Regex {
    NEW_PREDICATE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:history of|hx of|h/o|has|had|have|having|diagnosed|developed|reports|treated|on|with|is|was)\b",
        )
        .expect("predicate pattern compiles")
    })
}

/// A bare list entry: a few words, no numbers, no new predicate.
fn is_list_item(segment: &str) -> bool {
    segment.split_whitespace().count() <= 4
        && !segment.chars().any(|ch| ch.is_ascii_digit())
        && !new_predicate().is_match(segment)
}

/// Start of the clause containing `offset`: sentence punctuation and line breaks end clauses.
fn clause_prefix(text: &str, offset: usize) -> &str {
    let prefix = &text[..offset];
    let mut start = prefix
        .rfind(['.', ';', '\n', '!', '?'])
        .map(|index| index + 1)
        .unwrap_or(0);

    let lowered = prefix.to_ascii_lowercase();
    for conjunction in [" but ", " however ", " although ", " except "] {
        if let Some(index) = lowered.rfind(conjunction) {
            start = start.max(index + conjunction.len());
        }
    }
    &prefix[start..]
}

fn last_words(segment: &str, count: usize) -> String {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let skip = words.len().saturating_sub(count);
    words[skip..].join(" ")
}

/// Whether the mention starting at `offset` is negated by a cue earlier in its clause, either
/// directly ("no GDM") or through a negated list ("denies asthma, epilepsy, lupus").
pub(crate) fn is_negated(text: &str, offset: usize) -> bool {
    let clause = clause_prefix(text, offset);
    let mut segments = clause.rsplit(',');

    let current = segments.next().unwrap_or_default();
    if negation_cue().is_match(&last_words(current, LOOKBACK_WORDS)) {
        return true;
    }

    // Only bare items continue a negated list ("denies asthma, epilepsy, lupus").
    let opens_statement = new_predicate()
        .find(&text[offset..])
        .is_some_and(|found| found.start() == 0);
    if opens_statement || !is_list_item(current) {
        return false;
    }
    for segment in segments {
        if list_negation_cue().is_match(segment) {
            return true;
        }
        if !is_list_item(segment) {
            break;
        }
    }

    false
}

/// Whether the text right after a mention negates it ("HIV negative", "GDM ruled out").
pub(crate) fn is_negated_after(text: &str, end: usize) -> bool {
    let rest = &text[end..];
    let window_end = rest
        .char_indices()
        .nth(LOOKAHEAD_CHARS)
        .map(|(index, _)| index)
        .unwrap_or(rest.len());
    trailing_negation().is_match(&rest[..window_end])
}

/// Whether the mention is about someone other than the candidate ("mother has lupus").
pub(crate) fn refers_to_other_person(text: &str, offset: usize) -> bool {
    let clause = clause_prefix(text, offset);
    let current = clause.rsplit(',').next().unwrap_or_default();
    other_person_cue().is_match(&last_words(current, LOOKBACK_WORDS))
}

/// Combined check used by every keyword match.
pub(crate) fn mention_applies(text: &str, start: usize, end: usize) -> bool {
    !is_negated(text, start) && !is_negated_after(text, end) && !refers_to_other_person(text, start)
}
