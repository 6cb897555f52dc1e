//! Assessment orchestration for both diseases.
//!
//! Used directly by the symptom-checker endpoint and embedded in diagnosis creation. Nothing
//! here writes to storage: the caller decides what to keep from the returned [`Assessment`].

use serde::{Deserialize, Serialize};

use crate::catalog::Disease;
use crate::labs::LabResults;
use crate::recommendation::recommendation;
use crate::scorer::{score_disease, RiskLevel};
use crate::symptoms::{SymptomList, SymptomReport};
use crate::AssessmentResult;

/// Request body of the standalone symptom checker.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    #[serde(default)]
    #[schema(value_type = Option<Vec<crate::symptoms::SymptomInput>>)]
    pub symptoms: Option<SymptomList>,
    #[serde(default)]
    pub test_results: Option<LabResults>,
}

/// Assessment of one disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseAssessment {
    pub risk_level: RiskLevel,
    pub score: usize,
    pub matching_symptoms: Vec<String>,
    pub recommendation: String,
}

/// Combined assessment, one entry per disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Assessment {
    pub malaria: DiseaseAssessment,
    pub typhoid: DiseaseAssessment,
}

impl Assessment {
    pub fn for_disease(&self, disease: Disease) -> &DiseaseAssessment {
        match disease {
            Disease::Malaria => &self.malaria,
            Disease::Typhoid => &self.typhoid,
        }
    }
}

/// Stateless entry point for assessments.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssessmentService;

impl AssessmentService {
    /// Assess an already validated report against both diseases.
    pub fn assess(report: &SymptomReport, labs: &LabResults) -> Assessment {
        let assess_one = |disease: Disease| {
            let scored = score_disease(disease, report, labs);
            DiseaseAssessment {
                risk_level: scored.risk_level,
                score: scored.score,
                matching_symptoms: scored.matching_symptoms,
                recommendation: recommendation(disease, scored.risk_level),
            }
        };

        let assessment = Assessment {
            malaria: assess_one(Disease::Malaria),
            typhoid: assess_one(Disease::Typhoid),
        };

        tracing::debug!(
            symptoms = report.entries().len(),
            malaria_score = assessment.malaria.score,
            malaria_risk = %assessment.malaria.risk_level,
            typhoid_score = assessment.typhoid.score,
            typhoid_risk = %assessment.typhoid.risk_level,
            "assessment computed"
        );

        assessment
    }

    /// Validate wire input and assess it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssessmentError::Validation`] if the symptom list is absent, empty or
    /// not a list, a symptom has no name, or a severity is not one of `mild`, `moderate`, `severe`. Nothing
    /// is scored in that case.
    pub fn assess_request(request: AssessmentRequest) -> AssessmentResult<Assessment> {
        let report = SymptomReport::parse(request.symptoms)?;
        let labs = request.test_results.unwrap_or_default();
        Ok(Self::assess(&report, &labs))
    }
}
