use serde::{Deserialize, Serialize};

/// Canonical condition codes recognized across every extraction layer.
///
/// The set is closed: supporting a new condition means adding a variant here and a row to
/// [`CONDITION_TABLE`], never an ad hoc flag on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCode {
    // Pregnancy specific
    GestationalDiabetes,
    PregnancyHypertension,
    Preeclampsia,
    Eclampsia,
    HellpSyndrome,
    PretermBirth,
    PrematureRuptureOfMembranes,
    CervicalInsufficiency,
    PlacentaPrevia,
    PlacentaAccreta,
    PlacentalAbruption,
    PostpartumHemorrhage,
    UterineRupture,
    Stillbirth,
    RecurrentPregnancyLoss,
    Miscarriage,
    EctopicPregnancy,
    FetalGrowthRestriction,
    FetalAnomaly,
    AmnioticFluidDisorder,
    IntrahepaticCholestasis,
    HyperemesisGravidarum,
    Chorioamnionitis,
    PostpartumDepression,
    PostpartumPsychosis,
    // General medical
    ChronicHypertension,
    Type1Diabetes,
    Type2Diabetes,
    ThyroidDisorder,
    Asthma,
    SeizureDisorder,
    SystemicLupus,
    RheumatoidArthritis,
    AutoimmuneDisorder,
    KidneyDisease,
    HeartDisease,
    Thrombophilia,
    VenousThromboembolism,
    PolycysticOvarySyndrome,
    Endometriosis,
    UterineFibroids,
    UterineAnomaly,
    Cancer,
    Hiv,
    HepatitisB,
    HepatitisC,
    SexuallyTransmittedInfection,
    Anemia,
    SickleCellDisease,
    InflammatoryBowelDisease,
    MultipleSclerosis,
    LiverDisease,
    BariatricSurgery,
    Migraine,
    // Mental health
    Depression,
    Anxiety,
    BipolarDisorder,
    Schizophrenia,
    EatingDisorder,
    PostTraumaticStress,
    SubstanceUseDisorder,
    AttentionDeficit,
    PersonalityDisorder,
}

/// Obstetric grouping for pregnancy-specific codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplicationCategory {
    GestationalDiabetes,
    HypertensiveDisorders,
    PretermDelivery,
    PlacentalDisorders,
    Hemorrhage,
    UterineComplications,
    PregnancyLoss,
    FetalComplications,
    PerinatalMentalHealth,
    OtherObstetric,
}

impl ComplicationCategory {
    pub const fn label(self) -> &'static str {
        match self {
            ComplicationCategory::GestationalDiabetes => "Gestational diabetes",
            ComplicationCategory::HypertensiveDisorders => "Hypertensive disorders of pregnancy",
            ComplicationCategory::PretermDelivery => "Preterm delivery",
            ComplicationCategory::PlacentalDisorders => "Placental disorders",
            ComplicationCategory::Hemorrhage => "Obstetric hemorrhage",
            ComplicationCategory::UterineComplications => "Uterine complications",
            ComplicationCategory::PregnancyLoss => "Pregnancy loss",
            ComplicationCategory::FetalComplications => "Fetal complications",
            ComplicationCategory::PerinatalMentalHealth => "Perinatal mental health",
            ComplicationCategory::OtherObstetric => "Other obstetric complications",
        }
    }
}

/// Clinical weight of a condition, shared by every scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTier {
    Minor,
    ReviewRequired,
    Significant,
    Complex,
    Disqualifying,
}

impl ConditionTier {
    /// Complex and disqualifying conditions always warrant maternal-fetal-medicine input.
    pub const fn is_complex(self) -> bool {
        matches!(self, ConditionTier::Complex | ConditionTier::Disqualifying)
    }
}

/// Which guideline group evaluates a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionDomain {
    Obstetric(ComplicationCategory),
    Medical,
    MentalHealth,
}

#[derive(Debug, Clone, Copy)]
pub struct ConditionInfo {
    pub code: ConditionCode,
    pub label: &'static str,
    pub domain: ConditionDomain,
    pub tier: ConditionTier,
}

use ComplicationCategory as Cat;
use ConditionCode as C;
use ConditionDomain::{Medical, MentalHealth, Obstetric};
use ConditionTier as T;

const fn row(
    code: ConditionCode,
    label: &'static str,
    domain: ConditionDomain,
    tier: ConditionTier,
) -> ConditionInfo {
    ConditionInfo {
        code,
        label,
        domain,
        tier,
    }
}

pub const CONDITION_TABLE: &[ConditionInfo] = &[
    row(C::GestationalDiabetes, "Gestational diabetes", Obstetric(Cat::GestationalDiabetes), T::ReviewRequired),
    row(C::PregnancyHypertension, "Pregnancy-induced hypertension", Obstetric(Cat::HypertensiveDisorders), T::ReviewRequired),
    row(C::Preeclampsia, "Preeclampsia", Obstetric(Cat::HypertensiveDisorders), T::Significant),
    row(C::Eclampsia, "Eclampsia", Obstetric(Cat::HypertensiveDisorders), T::Complex),
    row(C::HellpSyndrome, "HELLP syndrome", Obstetric(Cat::HypertensiveDisorders), T::Complex),
    row(C::PretermBirth, "Preterm birth", Obstetric(Cat::PretermDelivery), T::Significant),
    row(C::PrematureRuptureOfMembranes, "Premature rupture of membranes", Obstetric(Cat::PretermDelivery), T::ReviewRequired),
    row(C::CervicalInsufficiency, "Cervical insufficiency", Obstetric(Cat::PretermDelivery), T::Complex),
    row(C::PlacentaPrevia, "Placenta previa", Obstetric(Cat::PlacentalDisorders), T::Significant),
    row(C::PlacentaAccreta, "Placenta accreta spectrum", Obstetric(Cat::PlacentalDisorders), T::Disqualifying),
    row(C::PlacentalAbruption, "Placental abruption", Obstetric(Cat::PlacentalDisorders), T::Complex),
    row(C::PostpartumHemorrhage, "Postpartum hemorrhage", Obstetric(Cat::Hemorrhage), T::Significant),
    row(C::UterineRupture, "Uterine rupture", Obstetric(Cat::UterineComplications), T::Disqualifying),
    row(C::Stillbirth, "Stillbirth", Obstetric(Cat::PregnancyLoss), T::Complex),
    row(C::RecurrentPregnancyLoss, "Recurrent pregnancy loss", Obstetric(Cat::PregnancyLoss), T::Significant),
    row(C::Miscarriage, "Miscarriage", Obstetric(Cat::PregnancyLoss), T::Minor),
    row(C::EctopicPregnancy, "Ectopic pregnancy", Obstetric(Cat::PregnancyLoss), T::ReviewRequired),
    row(C::FetalGrowthRestriction, "Fetal growth restriction", Obstetric(Cat::FetalComplications), T::ReviewRequired),
    row(C::FetalAnomaly, "Fetal anomaly", Obstetric(Cat::FetalComplications), T::ReviewRequired),
    row(C::AmnioticFluidDisorder, "Amniotic fluid disorder", Obstetric(Cat::FetalComplications), T::Minor),
    row(C::IntrahepaticCholestasis, "Intrahepatic cholestasis of pregnancy", Obstetric(Cat::OtherObstetric), T::ReviewRequired),
    row(C::HyperemesisGravidarum, "Hyperemesis gravidarum", Obstetric(Cat::OtherObstetric), T::Minor),
    row(C::Chorioamnionitis, "Chorioamnionitis", Obstetric(Cat::OtherObstetric), T::Minor),
    row(C::PostpartumDepression, "Postpartum depression", Obstetric(Cat::PerinatalMentalHealth), T::ReviewRequired),
    row(C::PostpartumPsychosis, "Postpartum psychosis", Obstetric(Cat::PerinatalMentalHealth), T::Disqualifying),
    row(C::ChronicHypertension, "Chronic hypertension", Medical, T::Significant),
    row(C::Type1Diabetes, "Type 1 diabetes", Medical, T::Disqualifying),
    row(C::Type2Diabetes, "Type 2 diabetes", Medical, T::Complex),
    row(C::ThyroidDisorder, "Thyroid disorder", Medical, T::Minor),
    row(C::Asthma, "Asthma", Medical, T::Minor),
    row(C::SeizureDisorder, "Seizure disorder", Medical, T::Complex),
    row(C::SystemicLupus, "Systemic lupus erythematosus", Medical, T::Complex),
    row(C::RheumatoidArthritis, "Rheumatoid arthritis", Medical, T::Significant),
    row(C::AutoimmuneDisorder, "Autoimmune disorder", Medical, T::Significant),
    row(C::KidneyDisease, "Kidney disease", Medical, T::Complex),
    row(C::HeartDisease, "Heart disease", Medical, T::Disqualifying),
    row(C::Thrombophilia, "Thrombophilia", Medical, T::Complex),
    row(C::VenousThromboembolism, "Venous thromboembolism", Medical, T::Complex),
    row(C::PolycysticOvarySyndrome, "Polycystic ovary syndrome", Medical, T::Minor),
    row(C::Endometriosis, "Endometriosis", Medical, T::Minor),
    row(C::UterineFibroids, "Uterine fibroids", Medical, T::ReviewRequired),
    row(C::UterineAnomaly, "Uterine anomaly", Medical, T::Significant),
    row(C::Cancer, "Cancer history", Medical, T::Complex),
    row(C::Hiv, "HIV", Medical, T::Disqualifying),
    row(C::HepatitisB, "Hepatitis B", Medical, T::Significant),
    row(C::HepatitisC, "Hepatitis C", Medical, T::Significant),
    row(C::SexuallyTransmittedInfection, "Sexually transmitted infection", Medical, T::ReviewRequired),
    row(C::Anemia, "Anemia", Medical, T::Minor),
    row(C::SickleCellDisease, "Sickle cell disease", Medical, T::Complex),
    row(C::InflammatoryBowelDisease, "Inflammatory bowel disease", Medical, T::Significant),
    row(C::MultipleSclerosis, "Multiple sclerosis", Medical, T::Significant),
    row(C::LiverDisease, "Liver disease", Medical, T::Complex),
    row(C::BariatricSurgery, "Prior bariatric surgery", Medical, T::ReviewRequired),
    row(C::Migraine, "Migraine", Medical, T::Minor),
    row(C::Depression, "Depression", MentalHealth, T::ReviewRequired),
    row(C::Anxiety, "Anxiety", MentalHealth, T::Minor),
    row(C::BipolarDisorder, "Bipolar disorder", MentalHealth, T::Disqualifying),
    row(C::Schizophrenia, "Schizophrenia or psychotic disorder", MentalHealth, T::Disqualifying),
    row(C::EatingDisorder, "Eating disorder", MentalHealth, T::Significant),
    row(C::PostTraumaticStress, "Post-traumatic stress disorder", MentalHealth, T::ReviewRequired),
    row(C::SubstanceUseDisorder, "Substance use disorder", MentalHealth, T::Disqualifying),
    row(C::AttentionDeficit, "ADHD", MentalHealth, T::Minor),
    row(C::PersonalityDisorder, "Personality disorder", MentalHealth, T::Significant),
];

impl ConditionCode {
    /// Bumped whenever a code is added, removed or re-tiered.
    pub const VOCABULARY_VERSION: u32 = 3;

    pub fn info(self) -> &'static ConditionInfo {
        CONDITION_TABLE
            .iter()
            .find(|info| info.code == self)
            .unwrap_or_else(|| unreachable!("condition table covers every code: {self:?}"))
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn tier(self) -> ConditionTier {
        self.info().tier
    }

    pub fn complication_category(self) -> Option<ComplicationCategory> {
        match self.info().domain {
            ConditionDomain::Obstetric(category) => Some(category),
            ConditionDomain::Medical | ConditionDomain::MentalHealth => None,
        }
    }

    pub fn is_pregnancy_specific(self) -> bool {
        self.complication_category().is_some()
    }

    /// Canonical snake_case code, identical to the serialized form.
    pub fn as_code(self) -> String {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(code)) => code,
            _ => format!("{self:?}"),
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        serde_json::from_value(serde_json::Value::String(normalized)).ok()
    }

    pub fn all() -> impl Iterator<Item = ConditionCode> {
        CONDITION_TABLE.iter().map(|info| info.code)
    }
}
