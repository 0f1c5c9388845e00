//! Gestational carrier eligibility screening.
//!
//! Narrative clinical records are turned into a [`CandidateProfile`] by a cascade of
//! extraction layers, then scored against ASRM-style guidelines, three clinic archetypes and
//! a maternal-fetal-medicine referral table. Results are informational triage, never a
//! medical determination.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

pub use workflows::assessment::{AssessmentReport, AssessmentResult, ScreeningService};
pub use workflows::candidate::CandidateProfile;
pub use workflows::extraction::{CascadeController, ExtractionOptions};
