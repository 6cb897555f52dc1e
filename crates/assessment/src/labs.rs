//! Lab-test outcomes per disease.
//!
//! Each disease has two confirmatory tests. Any missing test, or a missing panel altogether,
//! reads as `not-done`.

use serde::{Deserialize, Serialize};

use crate::catalog::Disease;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum LabOutcome {
    Positive,
    Negative,
    #[default]
    NotDone,
}

impl LabOutcome {
    pub fn is_positive(self) -> bool {
        matches!(self, LabOutcome::Positive)
    }
}

/// Malaria confirmatory tests: rapid diagnostic test and microscopy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct MalariaTests {
    #[serde(default)]
    pub rapid_test: LabOutcome,
    #[serde(default)]
    pub microscopy: LabOutcome,
}

/// Typhoid confirmatory tests: Widal test and blood culture.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct TyphoidTests {
    #[serde(default)]
    pub widal_test: LabOutcome,
    #[serde(default)]
    pub blood_culture: LabOutcome,
}

/// Lab results for both diseases, as in the request's `testResults` object.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct LabResults {
    #[serde(default)]
    pub malaria: MalariaTests,
    #[serde(default)]
    pub typhoid: TyphoidTests,
}

impl LabResults {
    /// True when any confirmatory test for `disease` is positive. Only that disease's panel
    /// is consulted.
    pub fn confirmed(&self, disease: Disease) -> bool {
        match disease {
            Disease::Malaria => {
                self.malaria.rapid_test.is_positive() || self.malaria.microscopy.is_positive()
            }
            Disease::Typhoid => {
                self.typhoid.widal_test.is_positive() || self.typhoid.blood_culture.is_positive()
            }
        }
    }
}
