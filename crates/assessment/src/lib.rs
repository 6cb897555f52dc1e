//! # CarePoint Assessment
//!
//! Rule-based risk assessment for malaria and typhoid.
//!
//! Given a symptom report and optional lab-test outcomes, each disease gets:
//! - a match score (how many reported symptoms appear in the disease's catalog),
//! - a risk level (`low`, `moderate` or `high`),
//! - the matched symptom names in report order,
//! - a fixed recommendation for the risk level.
//!
//! Everything here is synchronous and side-effect free. The catalogs are process-wide
//! read-only sets, so assessments may run concurrently without coordination.
//!
//! **No storage concerns**: persisting a diagnosis with its risk levels belongs in
//! `carepoint-core`.

pub mod catalog;
pub mod labs;
pub mod recommendation;
pub mod scorer;
pub mod service;
pub mod symptoms;

pub use catalog::Disease;
pub use labs::{LabOutcome, LabResults, MalariaTests, TyphoidTests};
pub use recommendation::recommendation;
pub use scorer::{classify, score_disease, DiseaseScore, RiskLevel};
pub use service::{Assessment, AssessmentRequest, AssessmentService, DiseaseAssessment};
pub use symptoms::{Severity, SymptomEntry, SymptomInput, SymptomList, SymptomReport};

/// Errors raised by the assessment crate.
///
/// Scoring and tier mapping are total over validated input, so the only failure is a
/// malformed symptom report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error("{0}")]
    Validation(String),
}

pub type AssessmentResult<T> = std::result::Result<T, AssessmentError>;
