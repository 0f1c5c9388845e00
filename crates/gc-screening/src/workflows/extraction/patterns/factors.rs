use std::sync::OnceLock;

use regex::Regex;

use super::super::negation;
use crate::workflows::candidate::{
    CandidateProfile, EnvironmentalFactor, LifestyleFactor, ProfileField, PsychologicalFactor,
};

const FACTOR_CONFIDENCE: u8 = 80;

#[derive(Debug, Clone, Copy)]
enum FactorKey {
    Psychological(PsychologicalFactor),
    Lifestyle(LifestyleFactor),
    Environmental(EnvironmentalFactor),
}

impl FactorKey {
    fn field(self) -> ProfileField {
        match self {
            FactorKey::Psychological(_) => ProfileField::Psychological,
            FactorKey::Lifestyle(_) => ProfileField::Lifestyle,
            FactorKey::Environmental(_) => ProfileField::Environmental,
        }
    }

    fn apply(self, profile: &mut CandidateProfile, value: bool) {
        match self {
            FactorKey::Psychological(factor) => {
                profile.psychological.insert(factor, value);
            }
            FactorKey::Lifestyle(factor) => {
                profile.lifestyle.insert(factor, value);
            }
            FactorKey::Environmental(factor) => {
                profile.environmental.insert(factor, value);
            }
        }
        profile.set_field_confidence(self.field(), FACTOR_CONFIDENCE);
    }
}

/// Phrase rule: a non-negated positive hit sets the factor, an explicit negative phrase or a
/// negated positive hit clears it.
struct FactorRule {
    key: FactorKey,
    positive: Regex,
    negative: Option<Regex>,
}

static RULES: OnceLock<Vec<FactorRule>> = OnceLock::new();

fn rule(key: FactorKey, positive: &str, negative: Option<&str>) -> FactorRule {
    let build = |body: &str| {
        Regex::new(&format!(r"(?i)\b(?:{body})\b"))
            .unwrap_or_else(|err| panic!("invalid factor pattern {body}: {err}"))
    };
    FactorRule {
        key,
        positive: build(positive),
        negative: negative.map(build),
    }
}

fn rules() -> &'static [FactorRule] {
    use EnvironmentalFactor as Env;
    use FactorKey::{Environmental, Lifestyle, Psychological};
    use LifestyleFactor as Life;
    use PsychologicalFactor as Psych;

    RULES.get_or_init(|| {
        vec![
            rule(
                Lifestyle(Life::CurrentSmoker),
                r"current(?:ly)?\s+(?:smoker|smoking|smokes)|active\s+smoker|smokes|(?:daily|regular|social)\s+smoker|\d+\s*(?:cigarettes|cigs|packs?)\s*(?:a|per)\s*day|vapes|vaping",
                Some(r"non-?smoker|never\s+smok(?:ed|er)|does\s*(?:not|n't)\s+smoke|denies\s+(?:smoking|tobacco)|no\s+tobacco|tobacco\s*:\s*(?:no|none|denies)|quit\s+smoking|former\s+smoker|ex-smoker|smoke-free"),
            ),
            rule(
                Lifestyle(Life::FormerSmoker),
                r"former\s+smoker|ex-smoker|quit\s+smoking|stopped\s+smoking|previously\s+smoked|history\s+of\s+smoking",
                Some(r"never\s+smok(?:ed|er)|non-?smoker"),
            ),
            rule(
                Lifestyle(Life::HeavyAlcoholUse),
                r"heavy\s+(?:drinker|drinking|alcohol\s+use)|binge\s+drinking|drinks\s+daily|daily\s+drinking|alcohol\s+abuse|excessive\s+alcohol",
                Some(r"no\s+alcohol|denies\s+alcohol|does\s*(?:not|n't)\s+drink|non-?drinker|social(?:ly)?\s+drink(?:er|s|ing)?|occasional\s+(?:alcohol|drink(?:er|ing|s)?)|rare\s+alcohol|alcohol\s*:\s*(?:no|none|rare|occasional|social)"),
            ),
            rule(
                Lifestyle(Life::IllicitDrugUse),
                r"illicit\s+drugs?|recreational\s+drugs?|drug\s+use|cocaine|heroin|meth(?:amphetamine)?|opioid\s+misuse|ivdu|iv\s+drug\s+use",
                Some(r"denies\s+(?:illicit\s+|recreational\s+)?drugs?(?:\s+use)?|drug\s*(?:use)?\s*:\s*(?:no|none|denies)|never\s+used\s+drugs"),
            ),
            rule(
                Lifestyle(Life::MarijuanaUse),
                r"marijuana|cannabis|thc|weed|edibles",
                None,
            ),
            rule(
                Psychological(Psych::AdequateSupportSystem),
                r"(?:strong|good|great|excellent|adequate|solid)\s+support(?:\s+system|\s+network)?|supportive\s+(?:husband|partner|spouse|family)|(?:husband|partner|spouse|family)\s+(?:is\s+|are\s+)?(?:very\s+)?supportive",
                Some(r"(?:no|lacks?|limited|poor|little|minimal)\s+support(?:\s+system)?"),
            ),
            rule(
                Psychological(Psych::PsychiatricHospitalization),
                r"psychiatric\s+(?:hospitali[sz]ation|admission|inpatient|hold)|inpatient\s+psychiatric|5150|involuntary\s+(?:hold|commitment)|admitted\s+(?:to\s+)?(?:a\s+)?psych(?:iatric)?(?:\s+(?:unit|ward|hospital))?",
                Some(r"no\s+(?:prior\s+)?(?:psychiatric\s+)?hospitali[sz]ations?"),
            ),
            rule(
                Psychological(Psych::HistoryOfAbuse),
                r"history\s+of\s+(?:sexual\s+|physical\s+|emotional\s+|childhood\s+)?abuse|(?:sexual|physical|emotional|childhood)\s+abuse|sexual\s+assault|survivor\s+of\s+abuse|abused\s+as\s+a\s+child",
                None,
            ),
            rule(
                Psychological(Psych::CurrentPsychotropicMedication),
                r"currently\s+(?:on|taking)\s+(?:an?\s+)?(?:antidepressants?|ssris?|snris?|anti-?anxiety\s+medications?|antipsychotics?|mood\s+stabili[sz]ers?|psychiatric\s+medications?)|on\s+(?:sertraline|zoloft|fluoxetine|prozac|lexapro|escitalopram|citalopram|celexa|wellbutrin|bupropion|lithium|lamictal|abilify|seroquel)|psychotropic\s+medications?",
                Some(r"no\s+psychiatric\s+medications?|not\s+on\s+any\s+(?:psychiatric\s+)?medications?|off\s+(?:all\s+)?(?:psychiatric\s+)?medications?"),
            ),
            rule(
                Psychological(Psych::PsychologicalEvaluationCompleted),
                r"psych(?:ological)?\s+(?:evaluation|eval|screening|assessment)\s+(?:completed|passed|cleared|done)|passed\s+(?:the\s+)?psych(?:ological)?\s+(?:evaluation|eval|screening)|cleared\s+by\s+(?:a\s+)?psychologist|mmpi(?:-2)?\s+(?:completed|normal|within\s+normal\s+limits)",
                Some(r"psych(?:ological)?\s+(?:evaluation|eval|screening)\s+(?:pending|scheduled|not\s+(?:yet\s+)?(?:completed|done|scheduled))|awaiting\s+psych(?:ological)?\s+(?:evaluation|eval|screening)"),
            ),
            rule(
                Environmental(Env::StableHousing),
                r"stable\s+(?:housing|home|residence)|owns?\s+(?:her|their|a)\s+(?:own\s+)?home|homeowner|lives\s+in\s+(?:her|their|a)\s+own\s+home",
                Some(r"homeless(?:ness)?|housing\s+insecur(?:e|ity)|unstable\s+housing|couch\s+surfing|(?:living|lives)\s+in\s+a\s+shelter|recently\s+evicted"),
            ),
            rule(
                Environmental(Env::FinancialStability),
                r"financially\s+(?:stable|secure|independent)|financial\s+(?:stability|security)|stable\s+(?:income|employment|job)|employed\s+full[-\s]time|full[-\s]time\s+employment",
                Some(r"financial\s+(?:hardship|difficult(?:y|ies)|strain|instability)|unemployed|bankruptcy|significant\s+debt|in\s+debt"),
            ),
            rule(
                Environmental(Env::ReceivingPublicAssistance),
                r"public\s+assistance|government\s+assistance|welfare|tanf|snap\s+benefits|food\s+stamps|medicaid|wic|section\s+8|housing\s+assistance|disability\s+benefits|ssdi|ssi",
                Some(r"not\s+(?:on|receiving)\s+(?:any\s+)?(?:public\s+assistance|welfare|government\s+assistance)"),
            ),
            rule(
                Environmental(Env::DomesticViolence),
                r"domestic\s+violence|intimate\s+partner\s+violence|ipv|abusive\s+(?:relationship|partner|husband|spouse)|restraining\s+order|protective\s+order",
                None,
            ),
            rule(
                Environmental(Env::CriminalHistory),
                r"criminal\s+(?:history|record|conviction)|felony|convicted|incarcerated|incarceration|prison|jail|probation|parole|arrested",
                Some(r"clean\s+(?:background|record)|background\s+check\s+(?:clear|cleared|passed|clean)"),
            ),
        ]
    })
}

fn evaluate(rule: &FactorRule, text: &str) -> Option<bool> {
    let mut negated = false;
    for hit in rule.positive.find_iter(text) {
        if negation::mention_applies(text, hit.start(), hit.end()) {
            return Some(true);
        }
        negated = true;
    }

    let explicit_negative = rule
        .negative
        .as_ref()
        .is_some_and(|negative| negative.is_match(text));
    (negated || explicit_negative).then_some(false)
}

pub(super) fn extract_factors(text: &str, profile: &mut CandidateProfile) {
    for rule in rules() {
        if let Some(value) = evaluate(rule, text) {
            rule.key.apply(profile, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> CandidateProfile {
        let mut profile = CandidateProfile::new();
        extract_factors(text, &mut profile);
        profile
    }

    #[test]
    fn smoking_status_is_read_both_ways() {
        let profile = run("Former smoker, quit 2018. Non-smoker now.");
        assert_eq!(profile.lifestyle_flag(LifestyleFactor::FormerSmoker), Some(true));
        assert_eq!(profile.lifestyle_flag(LifestyleFactor::CurrentSmoker), Some(false));

        let profile = run("Currently smokes half a pack, 10 cigarettes a day");
        assert_eq!(profile.lifestyle_flag(LifestyleFactor::CurrentSmoker), Some(true));
    }

    #[test]
    fn negated_positive_phrase_records_false() {
        let profile = run("Denies domestic violence. No criminal history.");
        assert_eq!(
            profile.environmental_flag(EnvironmentalFactor::DomesticViolence),
            Some(false)
        );
        assert_eq!(
            profile.environmental_flag(EnvironmentalFactor::CriminalHistory),
            Some(false)
        );
        assert_eq!(profile.field_confidence(ProfileField::Environmental), Some(80));
    }

    #[test]
    fn support_and_evaluation_phrases_are_recognized() {
        let profile = run("Husband is very supportive. Psychological evaluation completed in May.");
        assert_eq!(
            profile.psychological_flag(PsychologicalFactor::AdequateSupportSystem),
            Some(true)
        );
        assert_eq!(
            profile.psychological_flag(PsychologicalFactor::PsychologicalEvaluationCompleted),
            Some(true)
        );
        assert_eq!(
            profile.psychological_flag(PsychologicalFactor::HistoryOfAbuse),
            None
        );
    }

    #[test]
    fn unmentioned_factors_stay_unknown() {
        let profile = run("G2P2, BMI 22");
        assert!(profile.lifestyle.is_empty());
        assert!(profile.psychological.is_empty());
        assert!(profile.environmental.is_empty());
        assert!(!profile.is_documented(ProfileField::Lifestyle));
    }
}
