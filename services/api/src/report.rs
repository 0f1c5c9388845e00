use chrono::Utc;
use gc_screening::config::AppConfig;
use gc_screening::error::AppError;
use gc_screening::telemetry::{self, LogSink};
use gc_screening::workflows::assessment::{AssessmentResponse, ClinicType};
use gc_screening::workflows::candidate::ProfileField;
use gc_screening::workflows::extraction::AssessmentInput;
use gc_screening::{AssessmentReport, ExtractionOptions};

use crate::cli::{AssessArgs, InputArgs};
use crate::infra::{build_service, read_input, resolve_credential};

/// Logs go to stderr so stdout carries only the report.
fn init_cli_telemetry(config: &AppConfig) -> Result<(), AppError> {
    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;
    Ok(())
}

pub(crate) fn extraction_options(args: &InputArgs) -> ExtractionOptions {
    ExtractionOptions {
        use_external: args.external,
        credential: if args.external {
            resolve_credential(args.credential.clone())
        } else {
            None
        },
        context_hints: args.hints.clone(),
    }
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    init_cli_telemetry(&config)?;

    let service = build_service(&config.extraction)?;
    let input = read_input(&args.input.files, args.input.text.as_deref())?;
    let options = extraction_options(&args.input);

    let mut report = service.assess(input, &options).await;
    if let Some(name) = &args.name {
        report.stamp_display_name(name.as_str());
    }

    if args.json {
        let response = AssessmentResponse {
            assessed_at: Utc::now(),
            report,
        };
        print_json(&response)?;
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) async fn run_extract(args: InputArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    init_cli_telemetry(&config)?;

    let service = build_service(&config.extraction)?;
    let options = extraction_options(&args);
    let profile = match read_input(&args.files, args.text.as_deref())? {
        AssessmentInput::Narrative(text) => service.extract(&text, &options).await,
        AssessmentInput::Structured(profile) => *profile,
    };

    print_json(&profile)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn render_report(report: &AssessmentReport) {
    let profile = &report.profile;
    let result = &report.result;
    let metadata = &profile.parsing_metadata;

    match &profile.display_name {
        Some(name) => println!("Candidate: {name}"),
        None => println!("Candidate: (unnamed)"),
    }
    let layers: Vec<&str> = metadata
        .layers_used
        .iter()
        .map(|layer| layer.label())
        .collect();
    println!(
        "Extraction confidence: {}% (layers: {})",
        metadata.final_confidence,
        if layers.is_empty() {
            "structured input".to_string()
        } else {
            layers.join(", ")
        }
    );
    for (field, _) in ProfileField::REQUIRED {
        if let Some(confidence) = profile.field_confidence(field) {
            println!("  - {}: {}%", field.label(), confidence);
        }
    }

    println!(
        "\nOverall risk: {} - {}",
        result.overall_risk.level.label(),
        result.overall_risk.description
    );

    println!("\nGuideline findings");
    for (category, findings) in &result.category_summaries {
        for finding in findings {
            println!(
                "- [{}] {}: {}",
                finding.status.label(),
                category.label(),
                finding.message
            );
        }
    }

    println!("\nClinic acceptance");
    for clinic in ClinicType::ALL {
        let Some(analysis) = result.clinic_type_analysis.get(&clinic) else {
            continue;
        };
        println!(
            "- {}: {} (score {})",
            clinic.label(),
            analysis.acceptance_level.label(),
            analysis.score
        );
        for issue in &analysis.issues {
            println!("    {:?}: {}", issue.severity, issue.message);
        }
    }

    let mfm = &result.mfm_assessment;
    println!(
        "\nMFM review: {:?} | {} ({}%)",
        mfm.review_level, mfm.likelihood.description, mfm.likelihood.percentage
    );
    for finding in &mfm.findings {
        println!(
            "- {} [{:?}]: {}",
            finding.concern, finding.approvability, finding.mfm_view
        );
    }

    println!("\nRecommendations");
    for recommendation in &result.recommendations {
        println!("- {recommendation}");
    }

    if !metadata.malformed_fields.is_empty() {
        let fields: Vec<&str> = metadata
            .malformed_fields
            .iter()
            .map(String::as_str)
            .collect();
        println!("\nUnreadable fields: {}", fields.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_only_resolved_when_external_is_requested() {
        let args = InputArgs {
            credential: Some("key".to_string()),
            ..InputArgs::default()
        };
        let options = extraction_options(&args);
        assert!(!options.use_external);
        assert!(options.credential.is_none());

        let args = InputArgs {
            external: true,
            credential: Some("key".to_string()),
            hints: vec!["transfer records".to_string()],
            ..InputArgs::default()
        };
        let options = extraction_options(&args);
        assert!(options.use_external);
        assert_eq!(options.credential.as_deref(), Some("key"));
        assert_eq!(options.context_hints, vec!["transfer records"]);
    }

    #[test]
    fn blank_credentials_are_dropped() {
        let args = InputArgs {
            external: true,
            credential: Some("   ".to_string()),
            ..InputArgs::default()
        };
        assert!(extraction_options(&args).credential.is_none());
    }
}
