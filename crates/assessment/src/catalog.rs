//! Canonical symptom vocabulary per disease.
//!
//! Both catalogs are lowercase and immutable. Fever, headache and diarrhea appear in both, so a
//! single reported symptom can count towards both diseases.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::{AssessmentError, AssessmentResult};

/// Malaria catalog entries.
pub const MALARIA_SYMPTOMS: [&str; 11] = [
    "fever",
    "chills",
    "headache",
    "muscle aches",
    "fatigue",
    "nausea",
    "vomiting",
    "diarrhea",
    "abdominal pain",
    "sweating",
    "shivering",
];

/// Typhoid catalog entries.
pub const TYPHOID_SYMPTOMS: [&str; 11] = [
    "fever",
    "headache",
    "weakness",
    "stomach pain",
    "constipation",
    "diarrhea",
    "loss of appetite",
    "rash",
    "enlarged spleen",
    "rose spots",
    "dry cough",
];

static MALARIA_CATALOG: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| MALARIA_SYMPTOMS.into_iter().collect());

static TYPHOID_CATALOG: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| TYPHOID_SYMPTOMS.into_iter().collect());

/// Diseases covered by the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Disease {
    Malaria,
    Typhoid,
}

impl Disease {
    pub const ALL: [Disease; 2] = [Disease::Malaria, Disease::Typhoid];

    /// Lowercase display name, as used in recommendation text.
    pub fn name(self) -> &'static str {
        match self {
            Disease::Malaria => "malaria",
            Disease::Typhoid => "typhoid",
        }
    }

    /// Catalog entries in their canonical order.
    pub fn symptoms(self) -> &'static [&'static str] {
        match self {
            Disease::Malaria => &MALARIA_SYMPTOMS,
            Disease::Typhoid => &TYPHOID_SYMPTOMS,
        }
    }

    fn catalog(self) -> &'static HashSet<&'static str> {
        match self {
            Disease::Malaria => &MALARIA_CATALOG,
            Disease::Typhoid => &TYPHOID_CATALOG,
        }
    }

    /// Case-insensitive catalog membership.
    pub fn matches(self, symptom: &str) -> bool {
        self.catalog().contains(symptom.to_lowercase().as_str())
    }
}

impl std::fmt::Display for Disease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Disease {
    type Err = AssessmentError;

    fn from_str(s: &str) -> AssessmentResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "malaria" => Ok(Disease::Malaria),
            "typhoid" => Ok(Disease::Typhoid),
            other => Err(AssessmentError::Validation(format!(
                "unknown disease '{other}' (expected malaria or typhoid)"
            ))),
        }
    }
}
