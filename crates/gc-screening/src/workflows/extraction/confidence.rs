use crate::workflows::candidate::{CandidateProfile, ProfileField};

/// Below this a field may be overwritten by a later layer with higher confidence.
pub const LOW_CONFIDENCE: u8 = 50;

/// Deterministic layers stop early once the profile is this complete.
pub const SATISFIED_CONFIDENCE: u8 = 95;

/// Weighted mean over the required fields; missing fields contribute zero.
pub fn aggregate_confidence(profile: &CandidateProfile) -> u8 {
    let total_weight: u32 = ProfileField::REQUIRED
        .iter()
        .map(|(_, weight)| *weight)
        .sum();
    let weighted: u32 = ProfileField::REQUIRED
        .iter()
        .map(|(field, weight)| u32::from(profile.field_confidence(*field).unwrap_or(0)) * weight)
        .sum();

    if total_weight == 0 {
        return 0;
    }
    (weighted / total_weight).min(100) as u8
}
