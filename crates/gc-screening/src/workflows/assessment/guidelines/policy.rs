use std::collections::BTreeSet;

use super::super::domain::{CategoryFinding, GuidelineCategory, OverallRisk, RiskLevel};
use super::rules::CategorySummaries;
use crate::workflows::candidate::CandidateProfile;

const PROCEED_RECOMMENDATION: &str =
    "Candidate meets screening guidelines; proceed with standard medical and psychological evaluation";

/// Categories scoring the same underlying facts count once toward the combination rule.
/// Pregnancy history is judged from the complication count that pregnancy complications
/// already score.
fn combination_group(category: GuidelineCategory) -> GuidelineCategory {
    match category {
        GuidelineCategory::PregnancyHistory => GuidelineCategory::PregnancyComplications,
        other => other,
    }
}

/// Two or more independent categories at high risk compound into a disqualifying combined
/// finding.
pub(crate) fn apply_combination_rule(summaries: &mut CategorySummaries) {
    let high_risk: Vec<GuidelineCategory> = summaries
        .iter()
        .filter(|(category, _)| **category != GuidelineCategory::CombinedRisk)
        .filter(|(_, findings)| {
            findings
                .iter()
                .any(|finding| finding.status == RiskLevel::HighRisk)
        })
        .map(|(category, _)| *category)
        .collect();

    let groups: BTreeSet<GuidelineCategory> =
        high_risk.iter().copied().map(combination_group).collect();
    if groups.len() < 2 {
        return;
    }

    let labels: Vec<&'static str> = high_risk.iter().map(|category| category.label()).collect();
    summaries.insert(
        GuidelineCategory::CombinedRisk,
        vec![CategoryFinding::new(
            RiskLevel::Disqualified,
            format!(
                "High-risk findings in {} categories: {}",
                labels.len(),
                labels.join(", ")
            ),
            "Multiple concurrent high-risk factors exceed acceptable risk for a gestational carrier",
        )],
    );
}

pub(crate) fn overall_risk(summaries: &CategorySummaries) -> OverallRisk {
    let level = summaries
        .values()
        .flatten()
        .map(|finding| finding.status)
        .max()
        .unwrap_or(RiskLevel::Eligible);

    OverallRisk {
        level,
        description: level.description().to_string(),
    }
}

/// Guideline text of every non-eligible finding, most severe first, followed by one line per
/// documentation gap.
pub(crate) fn recommendations(
    profile: &CandidateProfile,
    summaries: &CategorySummaries,
) -> Vec<String> {
    let mut flagged: Vec<&CategoryFinding> = summaries
        .values()
        .flatten()
        .filter(|finding| finding.status > RiskLevel::Eligible)
        .collect();
    flagged.sort_by(|left, right| right.status.cmp(&left.status));

    let mut recommendations: Vec<String> = Vec::new();
    for finding in flagged {
        if !recommendations.contains(&finding.guideline) {
            recommendations.push(finding.guideline.clone());
        }
    }

    for gap in &profile.documentation_gaps {
        let line = format!("Obtain documentation: {gap}");
        if !recommendations.contains(&line) {
            recommendations.push(line);
        }
    }

    if recommendations.is_empty() {
        recommendations.push(PROCEED_RECOMMENDATION.to_string());
    }
    recommendations
}
