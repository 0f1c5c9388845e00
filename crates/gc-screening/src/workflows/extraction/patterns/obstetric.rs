use std::sync::OnceLock;

use regex::Regex;

use super::super::negation;
use super::super::normalizer::parse_count;
use crate::workflows::candidate::{CandidateProfile, ConditionCode, ProfileField};

static GRAVIDA_PARA: OnceLock<Vec<Regex>> = OnceLock::new();
static DOCUMENTED_ZERO: OnceLock<Regex> = OnceLock::new();
static DELIVERY_MODE: OnceLock<Regex> = OnceLock::new();
static COUNT_BEFORE: OnceLock<Regex> = OnceLock::new();
static COUNT_AFTER: OnceLock<Regex> = OnceLock::new();
static EVENT_MARKER: OnceLock<Regex> = OnceLock::new();

const COUNT_WORDS: &str = "zero|one|two|three|four|five|six|seven|eight|nine|ten|a|an|single";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid obstetric pattern {pattern}: {err}"))
}

fn gravida_para_patterns() -> &'static [Regex] {
    GRAVIDA_PARA.get_or_init(|| {
        vec![
            compile(r"(?i)\bg\s*(\d{1,2})\s*,?\s*p\s*(\d{1,4})\b"),
            compile(r"(?i)\bgravida\s*(\d{1,2})\s*,?\s*(?:para|p)\s*(\d{1,4})\b"),
        ]
    })
}

fn documented_zero() -> &'static Regex {
    DOCUMENTED_ZERO.get_or_init(|| {
        compile(
            r"(?i)\b(?:g\s*0|gravida\s*0|nulliparous|nullipara|nulligravida|nullip|never\s+been\s+pregnant|never\s+pregnant|no\s+(?:prior\s+|previous\s+)?pregnancies|no\s+(?:prior\s+|previous\s+)?(?:deliveries|births))\b",
        )
    })
}

fn delivery_mode() -> &'static Regex {
    DELIVERY_MODE.get_or_init(|| {
        compile(
            r"(?i)\b(?:(?P<vaginal>vaginal\s+births?\s+after\s+(?:c-?\s?section|ca?esarean)|vbacs?|n?svds?|vaginal\s+(?:deliver(?:y|ies)|births?)|delivered\s+vaginally)|(?P<cesarean>c[-\s]?sections?|c/s|lscs|(?:ca?esarean|cesarian)s?(?:\s+(?:sections?|deliver(?:y|ies)|births?))?))\b",
        )
    })
}

fn count_before() -> &'static Regex {
    COUNT_BEFORE.get_or_init(|| {
        compile(&format!(
            r"(?i)(?:\bx\s*(?P<times>\d{{1,2}})|(?:^|[^\w])(?P<count>\d{{1,2}}|{COUNT_WORDS}))\s*(?:x\s*)?(?:(?:prior|previous|uncomplicated|spontaneous|normal|successful|planned|emergency|repeat|term|full-term|healthy|elective|scheduled|urgent)\s+)*$"
        ))
    })
}

fn count_after() -> &'static Regex {
    COUNT_AFTER.get_or_init(|| compile(r"(?i)^\s*(?:x|times)\s*(\d{1,2})\b"))
}

/// Year or ordinal tying a delivery mention to one pregnancy ("in 2015", "second pregnancy").
fn event_marker() -> &'static Regex {
    EVENT_MARKER.get_or_init(|| {
        compile(
            r"(?i)\b(?P<year>(?:19|20)\d{2})\b|\b(?P<ordinal>first|second|third|fourth|fifth|sixth|1st|2nd|3rd|4th|5th|6th)\b",
        )
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryMode {
    Vaginal,
    Cesarean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NumberedMention {
    count: u32,
    /// Index of the sentence holding the mention.
    sentence: usize,
    /// Year or ordinal naming the pregnancy, when the clause gives one.
    event: Option<String>,
    /// Count written as a digit or number word rather than an article ("a C-section").
    explicit: bool,
}

impl NumberedMention {
    /// Whether `self` repeats `earlier` rather than describing further deliveries.
    fn restates(&self, earlier: &NumberedMention) -> bool {
        if self.count != earlier.count {
            return false;
        }
        match (&self.event, &earlier.event) {
            (Some(left), Some(right)) => left == right,
            _ => {
                self.count > 1
                    || self.sentence == earlier.sentence
                    || !self.explicit
                    || !earlier.explicit
            }
        }
    }
}

#[derive(Debug, Default)]
struct ModeTally {
    numbered: Vec<NumberedMention>,
    unnumbered: u32,
}

impl ModeTally {
    fn mentioned(&self) -> bool {
        !self.numbered.is_empty() || self.unnumbered > 0
    }

    fn record(&mut self, mention: NumberedMention) {
        if !self.numbered.iter().any(|earlier| mention.restates(earlier)) {
            self.numbered.push(mention);
        }
    }

    /// Numbered mentions describing distinct deliveries are summed; restatements were dropped
    /// on record. Without numbered mentions every un-numbered mention is one delivery.
    fn total(&self) -> u32 {
        if self.numbered.is_empty() {
            return self.unnumbered;
        }
        self.numbered.iter().map(|mention| mention.count).sum()
    }
}

fn sentence_index(text: &str, offset: usize) -> usize {
    let mut index = 0;
    let mut chars = text[..offset].chars().peekable();
    while let Some(ch) = chars.next() {
        let boundary = match ch {
            '\n' | ';' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |next| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            index += 1;
        }
    }
    index
}

/// Clause text around a mention, bounded by punctuation and "and".
fn event_for(text: &str, start: usize, end: usize) -> Option<String> {
    let before = &text[..start];
    let clause_start = before
        .rfind(['.', ',', ';', '\n'])
        .map(|index| index + 1)
        .unwrap_or(0);
    let after = &text[end..];
    let mut clause_end = after.find(['.', ',', ';', '\n']).unwrap_or(after.len());
    if let Some(index) = after[..clause_end].to_ascii_lowercase().find(" and ") {
        clause_end = index;
    }

    let lookup = |segment: &str| {
        event_marker().captures(segment).and_then(|captures| {
            captures
                .name("year")
                .or_else(|| captures.name("ordinal"))
                .map(|value| value.as_str().to_ascii_lowercase())
        })
    };
    lookup(&after[..clause_end]).or_else(|| lookup(&text[clause_start..start]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GravidaPara {
    gravida: u32,
    term: u32,
    preterm: u32,
}

impl GravidaPara {
    fn deliveries(self) -> u32 {
        self.term + self.preterm
    }
}

fn parse_gravida_para(text: &str) -> Option<GravidaPara> {
    for regex in gravida_para_patterns() {
        if let Some(captures) = regex.captures(text) {
            let gravida = captures[1].parse().ok()?;
            let para = &captures[2];
            // Para is a plain count (1-2 digits) or four-digit TPAL; other lengths are unreadable.
            let (term, preterm) = match para.len() {
                1 | 2 => (para.parse().ok()?, 0),
                4 => {
                    let digit = |index: usize| {
                        para[index..=index]
                            .parse::<u32>()
                            .unwrap_or_default()
                    };
                    (digit(0), digit(1))
                }
                _ => continue,
            };
            return Some(GravidaPara {
                gravida,
                term,
                preterm,
            });
        }
    }
    None
}

fn tally_deliveries(text: &str) -> (ModeTally, ModeTally) {
    let mut vaginal = ModeTally::default();
    let mut cesarean = ModeTally::default();

    for captures in delivery_mode().captures_iter(text) {
        let (mode, hit) = match (captures.name("vaginal"), captures.name("cesarean")) {
            (Some(hit), _) => (DeliveryMode::Vaginal, hit),
            (None, Some(hit)) => (DeliveryMode::Cesarean, hit),
            (None, None) => continue,
        };
        if negation::is_negated(text, hit.start()) || negation::is_negated_after(text, hit.end())
        {
            continue;
        }

        let tally = match mode {
            DeliveryMode::Vaginal => &mut vaginal,
            DeliveryMode::Cesarean => &mut cesarean,
        };

        let window_start = text[..hit.start()]
            .char_indices()
            .rev()
            .nth(40)
            .map(|(index, _)| index)
            .unwrap_or(0);
        let before = &text[window_start..hit.start()];
        let after = &text[hit.end()..];

        let before_count = count_before().captures(before).and_then(|captures| {
            captures
                .name("times")
                .or_else(|| captures.name("count"))
                .map(|value| value.as_str().to_string())
        });
        let raw_count = before_count.or_else(|| {
            count_after()
                .captures(after)
                .map(|captures| captures[1].to_string())
        });

        match raw_count.as_deref().and_then(|raw| parse_count(raw).map(|count| (raw, count))) {
            Some((raw, count)) => tally.record(NumberedMention {
                count,
                sentence: sentence_index(text, hit.start()),
                event: event_for(text, hit.start(), hit.end()),
                explicit: !matches!(raw.to_ascii_lowercase().as_str(), "a" | "an"),
            }),
            None => tally.unnumbered += 1,
        }
    }

    (vaginal, cesarean)
}

/// Reads gravida/para shorthand and narrative delivery mentions. When both exist and disagree
/// the narrative count is kept and the disagreement becomes a documentation gap.
pub(super) fn extract_pregnancy_history(text: &str, profile: &mut CandidateProfile) {
    let notation = parse_gravida_para(text);
    let (vaginal, cesarean) = tally_deliveries(text);
    let narrative_mentioned = vaginal.mentioned() || cesarean.mentioned();
    let narrative_numbered = !vaginal.numbered.is_empty() || !cesarean.numbered.is_empty();
    let narrative_total = vaginal.total() + cesarean.total();

    let mut conflict = None;
    let history = &mut profile.pregnancy_history;
    if cesarean.mentioned() {
        history.number_of_cesareans = cesarean.total();
    }

    let confidence = match (notation, narrative_mentioned) {
        (Some(notation), true) => {
            history.gravida = Some(notation.gravida);
            history.total_deliveries = narrative_total;
            history.number_of_term_pregnancies = narrative_total.saturating_sub(notation.preterm);
            if notation.deliveries() == narrative_total {
                92
            } else {
                conflict = Some(format!(
                    "Delivery count conflict: notation lists {} deliveries but narrative describes {}",
                    notation.deliveries(),
                    narrative_total
                ));
                75
            }
        }
        (Some(notation), false) => {
            history.gravida = Some(notation.gravida);
            history.total_deliveries = notation.deliveries();
            history.number_of_term_pregnancies = notation.term;
            85
        }
        (None, true) => {
            history.total_deliveries = narrative_total;
            history.number_of_term_pregnancies = narrative_total;
            if narrative_numbered {
                88
            } else {
                65
            }
        }
        (None, false) => {
            if !documented_zero().is_match(text) {
                return;
            }
            history.gravida = Some(0);
            history.total_deliveries = 0;
            history.number_of_term_pregnancies = 0;
            85
        }
    };

    history.has_completed_pregnancy = history.total_deliveries > 0;
    profile.set_field_confidence(ProfileField::PregnancyHistory, confidence);
    if let Some(gap) = conflict {
        profile.add_documentation_gap(gap);
    }

    if let Some(notation) = notation {
        if notation.preterm > 0 {
            profile.record_condition(ConditionCode::PretermBirth, "preterm births in TPAL notation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> CandidateProfile {
        let mut profile = CandidateProfile::new();
        extract_pregnancy_history(text, &mut profile);
        profile
    }

    #[test]
    fn consistent_notation_and_narrative_score_highest() {
        let profile = run("G2P2, 2 SVD, no complications, BMI 22");
        let history = &profile.pregnancy_history;
        assert_eq!(history.gravida, Some(2));
        assert_eq!(history.total_deliveries, 2);
        assert_eq!(history.number_of_term_pregnancies, 2);
        assert_eq!(history.number_of_cesareans, 0);
        assert!(history.has_completed_pregnancy);
        assert_eq!(profile.field_confidence(ProfileField::PregnancyHistory), Some(92));
        assert!(profile.documentation_gaps.is_empty());
    }

    #[test]
    fn narrative_count_wins_over_conflicting_notation() {
        let profile = run("G3P2. Delivery history: 2 SVD and 1 C-section.");
        let history = &profile.pregnancy_history;
        assert_eq!(history.total_deliveries, 3);
        assert_eq!(history.number_of_cesareans, 1);
        assert_eq!(profile.field_confidence(ProfileField::PregnancyHistory), Some(75));
        assert_eq!(profile.documentation_gaps.len(), 1);
        assert!(profile.documentation_gaps[0].contains('2'));
        assert!(profile.documentation_gaps[0].contains('3'));
    }

    #[test]
    fn repeated_numbered_mentions_are_not_double_counted() {
        let profile = run("Two vaginal deliveries. Both vaginal deliveries were at term; 2 SVD total.");
        assert_eq!(profile.pregnancy_history.total_deliveries, 2);
    }

    #[test]
    fn deliveries_listed_per_pregnancy_are_summed() {
        let profile = run("G3P3. 1 SVD in 2015. 1 SVD in 2018. 1 C-section in 2020.");
        let history = &profile.pregnancy_history;
        assert_eq!(history.total_deliveries, 3);
        assert_eq!(history.number_of_term_pregnancies, 3);
        assert_eq!(history.number_of_cesareans, 1);
        assert_eq!(profile.field_confidence(ProfileField::PregnancyHistory), Some(92));
        assert!(profile.documentation_gaps.is_empty());

        let profile = run("1 SVD in 2016 and 1 SVD in 2019");
        assert_eq!(profile.pregnancy_history.total_deliveries, 2);
    }

    #[test]
    fn article_mentions_of_one_delivery_are_restatements() {
        let profile = run("Had a C-section in 2019. Recovery from a C-section was uneventful.");
        assert_eq!(profile.pregnancy_history.number_of_cesareans, 1);
    }

    #[test]
    fn three_digit_para_is_not_read_as_a_count() {
        let profile = run("G3P211");
        assert!(!profile.is_documented(ProfileField::PregnancyHistory));
        assert_eq!(profile.pregnancy_history.total_deliveries, 0);
    }

    #[test]
    fn trailing_multipliers_and_word_counts_are_read() {
        let profile = run("C/S x2, one VBAC");
        let history = &profile.pregnancy_history;
        assert_eq!(history.number_of_cesareans, 2);
        assert_eq!(history.total_deliveries, 3);
    }

    #[test]
    fn negated_delivery_modes_are_ignored() {
        let profile = run("1 SVD, no c-section");
        assert_eq!(profile.pregnancy_history.number_of_cesareans, 0);
        assert_eq!(profile.pregnancy_history.total_deliveries, 1);
    }

    #[test]
    fn tpal_notation_splits_term_and_preterm() {
        let profile = run("G4P2113");
        let history = &profile.pregnancy_history;
        assert_eq!(history.number_of_term_pregnancies, 2);
        assert_eq!(history.total_deliveries, 3);
        assert!(profile.has_condition(ConditionCode::PretermBirth));
    }

    #[test]
    fn nulliparity_is_a_documented_zero() {
        let profile = run("Nulliparous, never been pregnant");
        assert!(profile.is_documented(ProfileField::PregnancyHistory));
        assert_eq!(profile.pregnancy_history.number_of_term_pregnancies, 0);
        assert!(!profile.pregnancy_history.has_completed_pregnancy);
    }

    #[test]
    fn un_numbered_mentions_have_low_confidence() {
        let profile = run("Delivered by cesarean section after a long labor");
        assert_eq!(profile.pregnancy_history.number_of_cesareans, 1);
        assert_eq!(profile.field_confidence(ProfileField::PregnancyHistory), Some(65));
    }
}
