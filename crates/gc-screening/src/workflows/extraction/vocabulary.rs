//! Fixed condition vocabulary used by the pattern layer.
//!
//! Terms are matched case-insensitively on word boundaries. Abbreviations that collide with
//! everyday words or unrelated clinical shorthand (for example "ms", "ra", "pe") are left out;
//! the glossary layer and the external extractor cover them in context.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use super::negation;
use super::normalizer::normalize_term;
use crate::workflows::candidate::ConditionCode;

use ConditionCode as C;

pub(crate) const VOCABULARY: &[(ConditionCode, &[&str])] = &[
    (C::GestationalDiabetes, &[
        "gestational diabetes", "gestational diabetes mellitus", "gdm", "gdma1", "gdma2",
        "a1gdm", "a2gdm", "gestational diabetic", "glucose intolerance of pregnancy",
        "diabetes in pregnancy", "pregnancy diabetes", "failed glucose tolerance test",
        "failed gtt", "failed glucose test",
    ]),
    (C::PregnancyHypertension, &[
        "pregnancy induced hypertension", "pregnancy-induced hypertension", "pih",
        "gestational hypertension", "ghtn", "gestational htn",
        "high blood pressure during pregnancy", "high blood pressure in pregnancy",
        "hypertension in pregnancy", "elevated blood pressure in pregnancy",
        "hypertensive disorder of pregnancy", "hdp",
    ]),
    (C::Preeclampsia, &[
        "preeclampsia", "pre-eclampsia", "pre eclampsia", "toxemia", "toxaemia",
        "pregnancy toxemia", "severe preeclampsia", "mild preeclampsia",
        "superimposed preeclampsia", "pre-e", "preeclamptic", "pre-eclamptic",
    ]),
    (C::Eclampsia, &[
        "eclampsia", "eclamptic seizure", "eclamptic seizures", "eclamptic fit", "eclamptic",
    ]),
    (C::HellpSyndrome, &[
        "hellp", "hellp syndrome", "hemolysis elevated liver enzymes low platelets",
        "haemolysis elevated liver enzymes low platelets",
    ]),
    (C::PretermBirth, &[
        "preterm birth", "preterm delivery", "preterm labor", "preterm labour",
        "premature birth", "premature delivery", "premature labor", "premature labour", "ptl",
        "ptb", "ptd", "spontaneous preterm birth", "delivered preterm", "delivered early",
        "early delivery", "preemie", "premature baby",
    ]),
    (C::PrematureRuptureOfMembranes, &[
        "premature rupture of membranes", "preterm premature rupture of membranes", "prom",
        "pprom", "premature rupture of the membranes", "early rupture of membranes",
        "water broke early",
    ]),
    (C::CervicalInsufficiency, &[
        "cervical insufficiency", "incompetent cervix", "cervical incompetence", "cerclage",
        "cervical cerclage", "short cervix", "shortened cervix", "weak cervix",
        "transabdominal cerclage", "mcdonald cerclage", "shirodkar",
    ]),
    (C::PlacentaPrevia, &[
        "placenta previa", "placenta praevia", "placental previa", "previa", "praevia",
        "low lying placenta", "low-lying placenta", "marginal previa", "complete previa",
        "total previa", "partial previa",
    ]),
    (C::PlacentaAccreta, &[
        "placenta accreta", "accreta", "placenta increta", "increta", "placenta percreta",
        "percreta", "placenta accreta spectrum", "morbidly adherent placenta",
        "abnormally invasive placenta",
    ]),
    (C::PlacentalAbruption, &[
        "placental abruption", "abruptio placentae", "abruption", "abrupted placenta",
        "placenta abruption", "placental detachment",
    ]),
    (C::PostpartumHemorrhage, &[
        "postpartum hemorrhage", "postpartum haemorrhage", "post-partum hemorrhage",
        "post partum hemorrhage", "pph", "obstetric hemorrhage", "obstetric haemorrhage",
        "hemorrhage after delivery", "bleeding after delivery",
        "excessive bleeding after birth", "massive transfusion",
        "blood transfusion after delivery", "uterine atony", "retained placenta",
    ]),
    (C::UterineRupture, &[
        "uterine rupture", "ruptured uterus", "rupture of uterus", "uterine dehiscence",
        "scar dehiscence", "uterine scar dehiscence", "uterine window",
    ]),
    (C::Stillbirth, &[
        "stillbirth", "still birth", "stillborn", "still born", "iufd",
        "intrauterine fetal demise", "intrauterine fetal death", "fetal demise", "fetal death",
        "late pregnancy loss",
    ]),
    (C::RecurrentPregnancyLoss, &[
        "recurrent pregnancy loss", "recurrent miscarriage", "recurrent miscarriages",
        "habitual abortion", "rpl", "multiple miscarriages", "repeated miscarriages",
        "recurrent spontaneous abortion",
    ]),
    (C::Miscarriage, &[
        "miscarriage", "miscarriages", "miscarried", "spontaneous abortion", "sab",
        "early pregnancy loss", "pregnancy loss", "missed abortion", "chemical pregnancy",
        "blighted ovum",
    ]),
    (C::EctopicPregnancy, &[
        "ectopic pregnancy", "ectopic", "tubal pregnancy", "salpingectomy", "ruptured ectopic",
    ]),
    (C::FetalGrowthRestriction, &[
        "fetal growth restriction", "intrauterine growth restriction", "iugr", "fgr",
        "small for gestational age", "sga", "growth restricted baby", "growth restriction",
    ]),
    (C::FetalAnomaly, &[
        "fetal anomaly", "fetal anomalies", "fetal abnormality", "congenital anomaly",
        "congenital anomalies", "birth defect", "birth defects", "neural tube defect",
        "chromosomal abnormality", "trisomy 21", "trisomy 18", "trisomy 13", "spina bifida",
    ]),
    (C::AmnioticFluidDisorder, &[
        "oligohydramnios", "polyhydramnios", "low amniotic fluid", "low fluid",
        "excess amniotic fluid", "hydramnios", "anhydramnios", "oligo",
    ]),
    (C::IntrahepaticCholestasis, &[
        "intrahepatic cholestasis of pregnancy", "cholestasis of pregnancy",
        "obstetric cholestasis", "icp", "cholestasis", "pregnancy cholestasis",
    ]),
    (C::HyperemesisGravidarum, &[
        "hyperemesis gravidarum", "hyperemesis", "severe morning sickness",
        "severe nausea and vomiting", "extreme morning sickness",
    ]),
    (C::Chorioamnionitis, &[
        "chorioamnionitis", "chorio", "intraamniotic infection", "intra-amniotic infection",
        "triple i", "amnionitis",
    ]),
    (C::PostpartumDepression, &[
        "postpartum depression", "post-partum depression", "post partum depression",
        "postnatal depression", "post-natal depression", "perinatal depression",
        "peripartum depression", "postpartum anxiety", "perinatal mood disorder",
        "perinatal mood and anxiety disorder", "pmad",
    ]),
    (C::PostpartumPsychosis, &[
        "postpartum psychosis", "post-partum psychosis", "puerperal psychosis",
        "postnatal psychosis", "perinatal psychosis",
    ]),
    (C::ChronicHypertension, &[
        "chronic hypertension", "hypertension", "high blood pressure", "htn", "chtn",
        "chronic htn", "essential hypertension", "elevated blood pressure",
    ]),
    (C::Type1Diabetes, &[
        "type 1 diabetes", "type i diabetes", "type one diabetes", "t1dm", "t1d", "iddm",
        "insulin dependent diabetes", "insulin-dependent diabetes", "juvenile diabetes", "dm1",
        "dm type 1", "diabetes type 1",
    ]),
    (C::Type2Diabetes, &[
        "type 2 diabetes", "type ii diabetes", "type two diabetes", "t2dm", "t2d", "niddm",
        "dm2", "dm type 2", "diabetes type 2", "diabetes mellitus",
        "non-insulin dependent diabetes", "adult onset diabetes",
    ]),
    (C::ThyroidDisorder, &[
        "hypothyroidism", "hyperthyroidism", "thyroid disease", "thyroid disorder",
        "hashimoto's", "hashimotos", "hashimoto's thyroiditis", "graves disease",
        "graves' disease", "thyroiditis", "underactive thyroid", "overactive thyroid",
        "goiter", "goitre", "levothyroxine", "synthroid", "thyroid nodule", "hypothyroid",
        "hyperthyroid",
    ]),
    (C::Asthma, &[
        "asthma", "asthmatic", "reactive airway disease", "exercise induced asthma",
        "exercise-induced asthma", "albuterol inhaler", "inhaler use", "bronchial asthma",
    ]),
    (C::SeizureDisorder, &[
        "seizure disorder", "seizures", "seizure", "epilepsy", "epileptic", "convulsions",
        "convulsive disorder", "grand mal", "petit mal", "tonic clonic", "keppra",
        "levetiracetam",
    ]),
    (C::SystemicLupus, &[
        "lupus", "systemic lupus erythematosus", "sle", "systemic lupus", "lupus nephritis",
        "discoid lupus", "lupus erythematosus",
    ]),
    (C::RheumatoidArthritis, &[
        "rheumatoid arthritis", "rheumatoid", "juvenile rheumatoid arthritis",
        "inflammatory arthritis", "jia", "juvenile idiopathic arthritis", "psoriatic arthritis",
    ]),
    (C::AutoimmuneDisorder, &[
        "autoimmune disease", "autoimmune disorder", "autoimmune condition",
        "sjogren's syndrome", "sjogrens syndrome", "sjogren syndrome", "scleroderma",
        "systemic sclerosis", "celiac disease", "coeliac disease", "celiac", "psoriasis",
        "myasthenia gravis", "vasculitis", "mixed connective tissue disease", "itp",
        "immune thrombocytopenia", "idiopathic thrombocytopenic purpura",
        "ankylosing spondylitis", "addison's disease", "addisons disease",
    ]),
    (C::KidneyDisease, &[
        "kidney disease", "chronic kidney disease", "ckd", "renal disease", "renal failure",
        "kidney failure", "renal insufficiency", "nephrotic syndrome", "glomerulonephritis",
        "polycystic kidney disease", "pkd", "kidney transplant", "renal transplant", "dialysis",
        "iga nephropathy", "nephropathy", "single kidney", "solitary kidney",
    ]),
    (C::HeartDisease, &[
        "heart disease", "cardiac disease", "congenital heart disease", "heart failure",
        "congestive heart failure", "chf", "cardiomyopathy", "peripartum cardiomyopathy",
        "dilated cardiomyopathy", "valve disease", "valvular heart disease", "aortic stenosis",
        "mitral stenosis", "pulmonary hypertension", "arrhythmia", "atrial fibrillation",
        "afib", "heart attack", "myocardial infarction", "coronary artery disease",
        "marfan syndrome", "marfan's syndrome", "heart surgery", "open heart surgery",
        "long qt syndrome", "wpw", "wolff parkinson white",
    ]),
    (C::Thrombophilia, &[
        "thrombophilia", "factor v leiden", "factor 5 leiden", "fvl",
        "prothrombin gene mutation", "prothrombin mutation", "antiphospholipid syndrome",
        "antiphospholipid antibody syndrome", "aps", "protein c deficiency",
        "protein s deficiency", "antithrombin deficiency", "antithrombin iii deficiency",
        "mthfr", "mthfr mutation", "clotting disorder", "blood clotting disorder",
        "hypercoagulable state", "hypercoagulability", "lupus anticoagulant",
    ]),
    (C::VenousThromboembolism, &[
        "deep vein thrombosis", "deep venous thrombosis", "dvt", "pulmonary embolism",
        "pulmonary embolus", "blood clot", "blood clots", "venous thromboembolism", "vte",
        "thromboembolism", "clot in leg", "clot in lung", "on blood thinners", "lovenox",
        "enoxaparin", "heparin injections", "warfarin", "coumadin", "anticoagulation",
    ]),
    (C::PolycysticOvarySyndrome, &[
        "polycystic ovary syndrome", "polycystic ovarian syndrome", "pcos", "pcod",
        "polycystic ovaries", "polycystic ovarian disease", "stein leventhal syndrome",
    ]),
    (C::Endometriosis, &[
        "endometriosis", "adenomyosis", "endometrioma", "endometriomas", "chocolate cyst",
        "deep infiltrating endometriosis",
    ]),
    (C::UterineFibroids, &[
        "uterine fibroids", "fibroids", "fibroid", "leiomyoma", "leiomyomas", "myoma",
        "myomas", "myomectomy", "uterine fibroid", "fibroid uterus", "uterine leiomyoma",
        "submucosal fibroid",
    ]),
    (C::UterineAnomaly, &[
        "uterine anomaly", "uterine anomalies", "septate uterus", "uterine septum",
        "bicornuate uterus", "unicornuate uterus", "didelphys uterus", "uterus didelphys",
        "arcuate uterus", "t-shaped uterus", "mullerian anomaly", "mullerian anomalies",
        "asherman's syndrome", "ashermans syndrome", "asherman syndrome",
        "intrauterine adhesions",
    ]),
    (C::Cancer, &[
        "cancer", "malignancy", "malignant tumor", "carcinoma", "lymphoma", "leukemia",
        "leukaemia", "melanoma", "breast cancer", "cervical cancer", "ovarian cancer",
        "thyroid cancer", "colon cancer", "hodgkin's lymphoma", "hodgkin lymphoma",
        "non-hodgkin lymphoma", "sarcoma", "chemotherapy", "chemo", "radiation therapy",
        "cancer survivor",
    ]),
    (C::Hiv, &[
        "hiv", "hiv positive", "human immunodeficiency virus",
        "acquired immunodeficiency syndrome", "hiv infection", "antiretroviral therapy",
    ]),
    (C::HepatitisB, &[
        "hepatitis b", "hep b", "hbv", "hepatitis b carrier", "chronic hepatitis b",
        "hbsag positive", "hep b positive", "hepatitis b virus",
    ]),
    (C::HepatitisC, &[
        "hepatitis c", "hep c", "hcv", "chronic hepatitis c", "hepatitis c virus",
        "hcv positive", "hep c positive",
    ]),
    (C::SexuallyTransmittedInfection, &[
        "sexually transmitted infection", "sexually transmitted disease", "sti", "std", "stis",
        "stds", "chlamydia", "gonorrhea", "gonorrhoea", "syphilis", "genital herpes", "herpes",
        "hsv", "hsv-2", "hsv2", "trichomoniasis", "trichomonas", "genital warts",
        "pelvic inflammatory disease", "pid",
    ]),
    (C::Anemia, &[
        "anemia", "anaemia", "anemic", "anaemic", "iron deficiency", "iron deficiency anemia",
        "iron-deficiency anemia", "low iron", "low hemoglobin", "low haemoglobin",
        "thalassemia trait", "thalassaemia trait", "sickle cell trait", "iron infusion",
        "iron infusions",
    ]),
    (C::SickleCellDisease, &[
        "sickle cell disease", "sickle cell anemia", "sickle cell anaemia", "sickle cell",
        "scd", "hbss", "hbsc", "thalassemia major", "beta thalassemia major",
        "hemoglobinopathy", "haemoglobinopathy",
    ]),
    (C::InflammatoryBowelDisease, &[
        "inflammatory bowel disease", "ibd", "crohn's disease", "crohns disease",
        "crohn disease", "crohn's", "crohns", "ulcerative colitis", "colitis",
    ]),
    (C::MultipleSclerosis, &[
        "multiple sclerosis", "relapsing remitting multiple sclerosis", "rrms",
        "demyelinating disease",
    ]),
    (C::LiverDisease, &[
        "liver disease", "cirrhosis", "liver cirrhosis", "fatty liver", "fatty liver disease",
        "nafld", "nash", "hepatitis", "autoimmune hepatitis", "liver failure",
        "liver transplant", "elevated liver enzymes", "wilson's disease", "wilsons disease",
        "primary biliary cholangitis", "primary sclerosing cholangitis",
    ]),
    (C::BariatricSurgery, &[
        "bariatric surgery", "gastric bypass", "gastric sleeve", "sleeve gastrectomy",
        "roux-en-y", "roux en y", "lap band", "lap-band", "gastric band", "gastric banding",
        "weight loss surgery", "weight-loss surgery", "duodenal switch",
        "vertical sleeve gastrectomy",
    ]),
    (C::Migraine, &[
        "migraine", "migraines", "migraine with aura", "migraine headaches", "chronic migraine",
        "chronic headaches", "hemiplegic migraine", "menstrual migraine",
    ]),
    (C::Depression, &[
        "depression", "major depressive disorder", "mdd", "depressive disorder",
        "clinical depression", "depressed", "dysthymia", "persistent depressive disorder",
        "on antidepressants", "antidepressant", "sertraline", "zoloft", "fluoxetine", "prozac",
        "lexapro", "escitalopram", "citalopram", "celexa", "wellbutrin", "bupropion", "ssri",
        "snri", "suicide attempt", "suicidal ideation",
    ]),
    (C::Anxiety, &[
        "anxiety", "generalized anxiety disorder", "gad", "anxiety disorder", "panic disorder",
        "panic attacks", "social anxiety", "ocd", "obsessive compulsive disorder",
        "obsessive-compulsive disorder", "phobia", "agoraphobia", "buspirone", "buspar",
    ]),
    (C::BipolarDisorder, &[
        "bipolar disorder", "bipolar", "bipolar i", "bipolar ii", "bipolar 1", "bipolar 2",
        "manic depression", "manic depressive", "mania", "manic episode", "lithium", "lamictal",
        "lamotrigine", "hypomania", "cyclothymia",
    ]),
    (C::Schizophrenia, &[
        "schizophrenia", "schizoaffective disorder", "schizoaffective", "psychosis",
        "psychotic disorder", "psychotic episode", "hallucinations", "delusional disorder",
        "antipsychotic", "antipsychotics", "schizophreniform",
    ]),
    (C::EatingDisorder, &[
        "eating disorder", "anorexia", "anorexia nervosa", "bulimia", "bulimia nervosa",
        "binge eating disorder", "arfid", "disordered eating", "purging",
    ]),
    (C::PostTraumaticStress, &[
        "ptsd", "post-traumatic stress disorder", "post traumatic stress disorder",
        "posttraumatic stress disorder", "post-traumatic stress", "complex ptsd", "cptsd",
        "c-ptsd",
    ]),
    (C::SubstanceUseDisorder, &[
        "substance use disorder", "substance abuse", "drug addiction", "addiction",
        "alcoholism", "alcohol use disorder", "alcohol dependence", "opioid use disorder",
        "opioid addiction", "opioid dependence", "heroin", "methadone", "suboxone",
        "buprenorphine", "methamphetamine", "cocaine use", "drug abuse",
    ]),
    (C::AttentionDeficit, &[
        "adhd", "attention deficit disorder", "attention deficit hyperactivity disorder",
        "attention-deficit/hyperactivity disorder", "adderall", "ritalin", "vyvanse",
        "concerta", "methylphenidate",
    ]),
    (C::PersonalityDisorder, &[
        "personality disorder", "borderline personality disorder", "borderline personality",
        "bpd", "antisocial personality disorder", "narcissistic personality disorder",
        "histrionic personality disorder", "dissociative identity disorder", "self-harm",
        "self harm",
    ]),
];

/// A vocabulary hit that survived negation and attribution checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConditionMention {
    pub code: ConditionCode,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

static MATCHER: OnceLock<Regex> = OnceLock::new();
static LOOKUP: OnceLock<HashMap<String, ConditionCode>> = OnceLock::new();

pub(crate) fn keywords() -> impl Iterator<Item = (&'static str, ConditionCode)> {
    VOCABULARY
        .iter()
        .flat_map(|(code, terms)| terms.iter().map(move |term| (*term, *code)))
}

fn lookup_table() -> &'static HashMap<String, ConditionCode> {
    LOOKUP.get_or_init(|| {
        keywords()
            .map(|(term, code)| (normalize_term(term), code))
            .collect()
    })
}

fn matcher() -> &'static Regex {
    MATCHER.get_or_init(|| {
        let mut terms: Vec<&str> = keywords().map(|(term, _)| term).collect();
        terms.sort_by(|left, right| right.len().cmp(&left.len()).then(left.cmp(right)));
        let alternation = terms
            .iter()
            .map(|term| regex::escape(term).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");

        RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .size_limit(1 << 25)
            .build()
            .expect("condition vocabulary compiles")
    })
}

/// Canonical code for a single vocabulary term.
pub(crate) fn lookup(term: &str) -> Option<ConditionCode> {
    lookup_table().get(&normalize_term(term)).copied()
}

/// Every non-negated vocabulary hit in `text`, leftmost-longest, in text order.
pub(crate) fn find_conditions(text: &str) -> Vec<ConditionMention> {
    matcher()
        .find_iter(text)
        .filter(|hit| negation::mention_applies(text, hit.start(), hit.end()))
        .filter_map(|hit| {
            lookup(hit.as_str()).map(|code| ConditionMention {
                code,
                start: hit.start(),
                end: hit.end(),
                text: hit.as_str().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn vocabulary_has_at_least_four_hundred_unique_terms() {
        let terms: Vec<String> = keywords().map(|(term, _)| normalize_term(term)).collect();
        let unique: HashSet<&String> = terms.iter().collect();
        assert!(terms.len() >= 400, "only {} terms", terms.len());
        assert_eq!(unique.len(), terms.len(), "duplicate vocabulary term");
    }

    #[test]
    fn every_code_has_vocabulary() {
        for code in ConditionCode::all() {
            assert!(
                VOCABULARY.iter().any(|(entry, terms)| *entry == code && !terms.is_empty()),
                "no vocabulary for {code:?}"
            );
        }
    }

    #[test]
    fn longest_term_wins_over_embedded_shorter_term() {
        let hits = find_conditions("History of postpartum depression after second birth");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, ConditionCode::PostpartumDepression);

        let hits = find_conditions("Carrier of sickle cell trait");
        assert_eq!(hits[0].code, ConditionCode::Anemia);
    }

    #[test]
    fn matching_is_case_insensitive_and_word_bounded() {
        let hits = find_conditions("GDM in last pregnancy; Pre-Eclampsia at 36 weeks");
        let codes: Vec<_> = hits.iter().map(|hit| hit.code).collect();
        assert_eq!(
            codes,
            vec![ConditionCode::GestationalDiabetes, ConditionCode::Preeclampsia]
        );
        assert!(find_conditions("grandmother's asthmatically").is_empty());
    }

    #[test]
    fn negated_mentions_are_dropped() {
        let hits = find_conditions("Denies preeclampsia, HIV negative. Has asthma.");
        let codes: Vec<_> = hits.iter().map(|hit| hit.code).collect();
        assert_eq!(codes, vec![ConditionCode::Asthma]);
    }
}
