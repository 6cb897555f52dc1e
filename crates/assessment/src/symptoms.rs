//! Symptom reports as submitted by clinicians or the symptom checker.
//!
//! [`SymptomInput`] is the lenient wire shape and [`SymptomList`] accepts any JSON value in the
//! `symptoms` slot. [`SymptomReport::parse`] turns them into validated [`SymptomEntry`] values:
//! the list must be a non-empty sequence of symptom objects, names must be non-empty and
//! severity, when present, must be exactly `mild`, `moderate` or `severe`.

use carepoint_types::NonEmptyText;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::{AssessmentError, AssessmentResult};

/// Reported severity of a symptom. Carried for display and audit; it does not weight the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl FromStr for Severity {
    type Err = AssessmentError;

    fn from_str(s: &str) -> AssessmentResult<Self> {
        match s {
            "mild" => Ok(Severity::Mild),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            _ => Err(AssessmentError::Validation(format!(
                "invalid severity '{s}' (expected mild, moderate or severe)"
            ))),
        }
    }
}

/// One symptom as it arrives on the wire.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymptomInput {
    #[serde(default)]
    pub symptom: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl SymptomInput {
    pub fn named(symptom: impl Into<String>) -> Self {
        Self {
            symptom: Some(symptom.into()),
            ..Self::default()
        }
    }
}

/// A validated symptom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymptomEntry {
    pub symptom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl SymptomEntry {
    fn from_input(index: usize, input: SymptomInput) -> AssessmentResult<Self> {
        let symptom = NonEmptyText::new("symptom", input.symptom.unwrap_or_default())
            .map_err(|e| AssessmentError::Validation(format!("symptoms[{index}]: {e}")))?;

        let severity = input
            .severity
            .map(|s| s.parse::<Severity>())
            .transpose()
            .map_err(|e| AssessmentError::Validation(format!("symptoms[{index}]: {e}")))?;

        let duration = NonEmptyText::optional("duration", input.duration)
            .map_err(|e| AssessmentError::Validation(format!("symptoms[{index}]: {e}")))?
            .map(NonEmptyText::into_string);

        Ok(Self {
            symptom: symptom.into_string(),
            severity,
            duration,
        })
    }
}

/// The `symptoms` value of a request body.
///
/// Anything that is not a sequence of symptom objects deserializes to `Malformed` rather than
/// failing the whole body, so it is reported as a validation error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SymptomList {
    List(Vec<SymptomInput>),
    Malformed,
}

impl<'de> Deserialize<'de> for SymptomList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<SymptomInput>),
            Other(IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::List(inputs) => SymptomList::List(inputs),
            Raw::Other(_) => SymptomList::Malformed,
        })
    }
}

impl From<Vec<SymptomInput>> for SymptomList {
    fn from(inputs: Vec<SymptomInput>) -> Self {
        SymptomList::List(inputs)
    }
}

impl FromIterator<SymptomInput> for SymptomList {
    fn from_iter<I: IntoIterator<Item = SymptomInput>>(iter: I) -> Self {
        SymptomList::List(iter.into_iter().collect())
    }
}

/// A non-empty, validated sequence of symptoms in report order.
///
/// Repeated names are kept: each occurrence counts towards the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomReport(Vec<SymptomEntry>);

impl SymptomReport {
    /// Validate wire input. An absent or empty list fails with "symptoms required"; a value that
    /// is not a list of symptom objects fails with "symptoms must be a list".
    pub fn parse(symptoms: Option<SymptomList>) -> AssessmentResult<Self> {
        let symptoms = match symptoms {
            None => Vec::new(),
            Some(SymptomList::List(inputs)) => inputs,
            Some(SymptomList::Malformed) => {
                return Err(AssessmentError::Validation(
                    "symptoms must be a list of symptom objects".into(),
                ))
            }
        };
        if symptoms.is_empty() {
            return Err(AssessmentError::Validation("symptoms required".into()));
        }

        symptoms
            .into_iter()
            .enumerate()
            .map(|(index, input)| SymptomEntry::from_input(index, input))
            .collect::<AssessmentResult<Vec<_>>>()
            .map(Self)
    }

    /// Wrap entries that were validated earlier (for example, read back from a stored diagnosis).
    pub fn from_entries(entries: Vec<SymptomEntry>) -> AssessmentResult<Self> {
        if entries.is_empty() {
            return Err(AssessmentError::Validation("symptoms required".into()));
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[SymptomEntry] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<SymptomEntry> {
        self.0
    }
}
