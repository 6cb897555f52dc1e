//! Per-disease scoring.
//!
//! The score is the number of report entries whose lowercased name is in the disease catalog.
//! Severity and duration are ignored. The risk level is decided in precedence order:
//! `high` (score >= 5 or a positive confirmatory test), then `moderate` (score >= 3), else `low`.

use serde::{Deserialize, Serialize};

use crate::catalog::Disease;
use crate::labs::LabResults;
use crate::symptoms::SymptomReport;

/// Score at or above which a disease is `high` risk.
pub const HIGH_RISK_SCORE: usize = 5;

/// Score at or above which a disease is `moderate` risk.
pub const MODERATE_RISK_SCORE: usize = 3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw outcome of scoring one disease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseScore {
    pub disease: Disease,
    pub score: usize,
    pub risk_level: RiskLevel,
    /// Matched names as submitted, in report order, duplicates kept.
    pub matching_symptoms: Vec<String>,
}

/// Map a score and confirmation flag to a risk level.
pub fn classify(score: usize, confirmed: bool) -> RiskLevel {
    if score >= HIGH_RISK_SCORE || confirmed {
        RiskLevel::High
    } else if score >= MODERATE_RISK_SCORE {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Score `report` against one disease, consulting only that disease's lab panel.
pub fn score_disease(disease: Disease, report: &SymptomReport, labs: &LabResults) -> DiseaseScore {
    let matching_symptoms: Vec<String> = report
        .entries()
        .iter()
        .filter(|entry| disease.matches(&entry.symptom))
        .map(|entry| entry.symptom.clone())
        .collect();

    let score = matching_symptoms.len();
    let risk_level = classify(score, labs.confirmed(disease));

    DiseaseScore {
        disease,
        score,
        risk_level,
        matching_symptoms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labs::{LabOutcome, MalariaTests};
    use crate::symptoms::SymptomInput;

    fn report(names: &[&str]) -> SymptomReport {
        SymptomReport::parse(Some(names.iter().map(|n| SymptomInput::named(*n)).collect()))
            .unwrap()
    }

    #[test]
    fn classify_thresholds() {
        assert_eq!(classify(0, false), RiskLevel::Low);
        assert_eq!(classify(2, false), RiskLevel::Low);
        assert_eq!(classify(3, false), RiskLevel::Moderate);
        assert_eq!(classify(4, false), RiskLevel::Moderate);
        assert_eq!(classify(5, false), RiskLevel::High);
        assert_eq!(classify(11, false), RiskLevel::High);
    }

    #[test]
    fn confirmation_forces_high_at_any_score() {
        for score in 0..8 {
            assert_eq!(classify(score, true), RiskLevel::High);
        }
    }

    #[test]
    fn counts_catalog_matches_only() {
        let result = score_disease(
            Disease::Malaria,
            &report(&["fever", "rash", "chills"]),
            &LabResults::default(),
        );
        assert_eq!(result.score, 2);
        assert_eq!(result.matching_symptoms, vec!["fever", "chills"]);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn repeated_symptom_counts_every_occurrence() {
        let result = score_disease(
            Disease::Typhoid,
            &report(&["fever", "fever", "Fever"]),
            &LabResults::default(),
        );
        assert_eq!(result.score, 3);
        assert_eq!(result.risk_level, RiskLevel::Moderate);
        assert_eq!(result.matching_symptoms, vec!["fever", "fever", "Fever"]);
    }

    #[test]
    fn other_disease_panel_is_ignored() {
        let labs = LabResults {
            malaria: MalariaTests {
                microscopy: LabOutcome::Positive,
                ..MalariaTests::default()
            },
            ..LabResults::default()
        };
        let typhoid = score_disease(Disease::Typhoid, &report(&["fever"]), &labs);
        assert_eq!(typhoid.risk_level, RiskLevel::Low);
        let malaria = score_disease(Disease::Malaria, &report(&["fever"]), &labs);
        assert_eq!(malaria.risk_level, RiskLevel::High);
    }

    #[test]
    fn risk_level_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Moderate).unwrap(),
            "\"moderate\""
        );
    }
}
