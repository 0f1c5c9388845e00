use serde::{Deserialize, Serialize};

/// Guideline thresholds. Defaults follow the ASRM recommendations for gestational carriers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineConfig {
    pub minimum_age: u8,
    pub maximum_eligible_age: u8,
    pub maximum_counseling_age: u8,
    pub underweight_bmi: f64,
    pub maximum_eligible_bmi: f64,
    pub maximum_counseling_bmi: f64,
    pub maximum_high_risk_bmi: f64,
    pub counseling_cesareans: u32,
    pub high_risk_cesareans: u32,
    pub disqualifying_cesareans: u32,
    pub maximum_deliveries: u32,
}

impl Default for GuidelineConfig {
    fn default() -> Self {
        Self {
            minimum_age: 21,
            maximum_eligible_age: 39,
            maximum_counseling_age: 45,
            underweight_bmi: 18.5,
            maximum_eligible_bmi: 30.0,
            maximum_counseling_bmi: 35.0,
            maximum_high_risk_bmi: 40.0,
            counseling_cesareans: 2,
            high_risk_cesareans: 3,
            disqualifying_cesareans: 4,
            maximum_deliveries: 5,
        }
    }
}
