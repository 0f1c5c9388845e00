use clap::Args;
use gc_screening::config::{AppConfig, ExtractionConfig};
use gc_screening::error::AppError;
use gc_screening::telemetry::{self, LogSink};
use gc_screening::workflows::assessment::ClinicType;
use gc_screening::workflows::extraction::AssessmentInput;
use gc_screening::ExtractionOptions;

use crate::infra::build_service;
use crate::report::render_report;

/// Sample intake narratives covering the common screening outcomes.
const SAMPLE_CANDIDATES: &[(&str, &str)] = &[
    ("Uncomplicated repeat carrier", "32 yo G2P2, 2 SVD, no complications, BMI 22. Non-smoker."),
    ("Prior gestational diabetes", "BMI 34, GDM in last pregnancy, 1 C-section"),
    (
        "Severe hypertensive history",
        "Age: 36. G3P3 with 3 prior c-sections. HELLP syndrome with third pregnancy. BMI 29",
    ),
    (
        "Advanced maternal age",
        "44 years old, G2P2, 2 vaginal deliveries, uncomplicated. 5'5\", 150 lbs",
    ),
    ("Thin record", "Healthy 29 years old"),
];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the full report for every sample instead of a one-line summary
    #[arg(long)]
    pub(crate) detailed: bool,
    /// Score only the sample with this 1-based index
    #[arg(long)]
    pub(crate) only: Option<usize>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;

    // Samples always run on the deterministic layers.
    let service = build_service(&ExtractionConfig {
        external_endpoint: None,
        ..config.extraction.clone()
    })?;
    let options = ExtractionOptions::deterministic();

    println!("Gestational carrier screening demo");
    for (index, (title, narrative)) in SAMPLE_CANDIDATES.iter().enumerate() {
        let number = index + 1;
        if args.only.is_some_and(|only| only != number) {
            continue;
        }

        let mut report = service
            .assess(AssessmentInput::from_text(narrative)?, &options)
            .await;
        report.stamp_display_name(*title);

        println!("\n#{number} {title}");
        println!("  Records: {narrative}");
        if args.detailed {
            render_report(&report);
            continue;
        }

        let result = &report.result;
        let clinics: Vec<String> = ClinicType::ALL
            .into_iter()
            .filter_map(|clinic| {
                result
                    .clinic_type_analysis
                    .get(&clinic)
                    .map(|analysis| format!("{} {}", clinic.label(), analysis.acceptance_level.label()))
            })
            .collect();
        println!(
            "  Risk: {} | confidence {}% | {}",
            result.overall_risk.level.label(),
            report.profile.parsing_metadata.final_confidence,
            clinics.join(", ")
        );
        println!(
            "  MFM: {} ({}%)",
            result.mfm_assessment.likelihood.description,
            result.mfm_assessment.likelihood.percentage
        );
        if let Some(first) = result.recommendations.first() {
            println!("  Next step: {first}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_screening::workflows::assessment::RiskLevel;

    #[tokio::test]
    async fn samples_cover_eligible_and_disqualified_outcomes() {
        let service = build_service(&ExtractionConfig::default()).expect("service builds");
        let options = ExtractionOptions::deterministic();

        let mut levels = Vec::new();
        for (_, narrative) in SAMPLE_CANDIDATES {
            let input = AssessmentInput::from_text(narrative).expect("sample parses");
            levels.push(service.assess(input, &options).await.result.overall_risk.level);
        }

        assert_eq!(levels[0], RiskLevel::Eligible);
        assert!(levels.contains(&RiskLevel::Disqualified));
    }
}
