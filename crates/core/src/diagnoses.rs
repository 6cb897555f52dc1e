//! Diagnosis records with an embedded risk assessment.
//!
//! Creating a diagnosis scores the submitted symptoms for both diseases and keeps only the
//! resulting risk tier on each per-disease sub-record. Later edits never re-score; callers ask
//! for that explicitly through [`DiagnosisService::reassess`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use carepoint_assessment::{
    Assessment, AssessmentService, LabResults, MalariaTests, RiskLevel, SymptomEntry,
    SymptomList, SymptomReport, TyphoidTests,
};
use carepoint_types::NonEmptyText;

use crate::access::{Principal, Role, DIAGNOSIS_READERS};
use crate::patients::PatientService;
use crate::store::{Entity, Store};
use crate::{RecordError, RecordResult};

const DOCTORS: &[Role] = &[Role::Doctor];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MalariaSpecies {
    Falciparum,
    Vivax,
    Ovale,
    Malariae,
    Knowlesi,
    Unknown,
}

/// Stored malaria sub-record: the clinician's findings plus the computed tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MalariaAssessmentRecord {
    pub risk_level: RiskLevel,
    pub test_results: MalariaTests,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<MalariaSpecies>,
    pub complications: Vec<String>,
}

/// Stored typhoid sub-record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TyphoidAssessmentRecord {
    pub risk_level: RiskLevel,
    pub test_results: TyphoidTests,
    pub complications: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<Uuid>,
    pub symptoms: Vec<SymptomEntry>,
    pub malaria_assessment: MalariaAssessmentRecord,
    pub typhoid_assessment: TyphoidAssessmentRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Diagnosis {
    fn lab_results(&self) -> LabResults {
        LabResults {
            malaria: self.malaria_assessment.test_results,
            typhoid: self.typhoid_assessment.test_results,
        }
    }
}

impl Entity for Diagnosis {
    const KIND: &'static str = "diagnosis";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MalariaAssessmentInput {
    #[serde(default)]
    pub test_results: MalariaTests,
    #[serde(default)]
    pub species: Option<MalariaSpecies>,
    #[serde(default)]
    pub complications: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TyphoidAssessmentInput {
    #[serde(default)]
    pub test_results: TyphoidTests,
    #[serde(default)]
    pub complications: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDiagnosis {
    pub patient_id: Uuid,
    #[serde(default)]
    pub appointment_id: Option<Uuid>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<carepoint_assessment::SymptomInput>>)]
    pub symptoms: Option<SymptomList>,
    #[serde(default)]
    pub malaria_assessment: MalariaAssessmentInput,
    #[serde(default)]
    pub typhoid_assessment: TyphoidAssessmentInput,
    #[serde(default)]
    pub final_diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Clinician edits. Absent fields are left unchanged. Nothing here re-scores the diagnosis.
#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisUpdate {
    #[serde(default)]
    #[schema(value_type = Option<Vec<carepoint_assessment::SymptomInput>>)]
    pub symptoms: Option<SymptomList>,
    #[serde(default)]
    pub malaria_test_results: Option<MalariaTests>,
    #[serde(default)]
    pub typhoid_test_results: Option<TyphoidTests>,
    #[serde(default)]
    pub malaria_species: Option<MalariaSpecies>,
    #[serde(default)]
    pub malaria_complications: Option<Vec<String>>,
    #[serde(default)]
    pub typhoid_complications: Option<Vec<String>>,
    #[serde(default)]
    pub final_diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Replacement lab panels. A panel that is sent replaces the stored one; an absent panel keeps
/// the stored results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabResultsUpdate {
    #[serde(default)]
    pub malaria: Option<MalariaTests>,
    #[serde(default)]
    pub typhoid: Option<TyphoidTests>,
}

impl LabResultsUpdate {
    fn apply_to(self, stored: LabResults) -> LabResults {
        LabResults {
            malaria: self.malaria.unwrap_or(stored.malaria),
            typhoid: self.typhoid.unwrap_or(stored.typhoid),
        }
    }
}

/// Optional new lab results for a reassessment.
#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassessRequest {
    #[serde(default)]
    pub test_results: LabResultsUpdate,
}

#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassessedDiagnosis {
    pub diagnosis: Diagnosis,
    pub assessment: Assessment,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DiagnosisQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub malaria_risk: Option<RiskLevel>,
    pub typhoid_risk: Option<RiskLevel>,
}

fn clean_list(field: &'static str, items: Vec<String>) -> RecordResult<Vec<String>> {
    items
        .into_iter()
        .map(|item| Ok(NonEmptyText::new(field, item)?.into_string()))
        .collect()
}

fn optional_text(field: &'static str, value: Option<String>) -> RecordResult<Option<String>> {
    Ok(NonEmptyText::optional(field, value)?.map(NonEmptyText::into_string))
}

#[derive(Clone)]
pub struct DiagnosisService {
    store: Arc<Store>,
    patients: PatientService,
}

impl DiagnosisService {
    pub fn new(store: Arc<Store>, patients: PatientService) -> Self {
        Self { store, patients }
    }

    /// Record a diagnosis for a patient, scoring the submitted symptoms.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Forbidden`] unless the caller is a doctor,
    /// - [`RecordError::Assessment`] if the symptom list is absent, empty or malformed; nothing
    ///   is stored in that case,
    /// - [`RecordError::NotFound`] for an unknown patient or appointment,
    /// - [`RecordError::InvalidInput`] if the appointment belongs to another patient.
    pub fn create(&self, principal: &Principal, new_diagnosis: NewDiagnosis) -> RecordResult<Diagnosis> {
        principal.require("record diagnoses", DOCTORS)?;

        let report = SymptomReport::parse(new_diagnosis.symptoms)?;
        self.patients.require_exists(new_diagnosis.patient_id)?;
        if let Some(appointment_id) = new_diagnosis.appointment_id {
            self.require_patient_appointment(appointment_id, new_diagnosis.patient_id)?;
        }

        let labs = LabResults {
            malaria: new_diagnosis.malaria_assessment.test_results,
            typhoid: new_diagnosis.typhoid_assessment.test_results,
        };
        let assessment = AssessmentService::assess(&report, &labs);

        let now = Utc::now();
        let diagnosis = self.store.diagnoses.insert(Diagnosis {
            id: Uuid::new_v4(),
            patient_id: new_diagnosis.patient_id,
            doctor_id: principal.user_id,
            appointment_id: new_diagnosis.appointment_id,
            symptoms: report.into_entries(),
            malaria_assessment: MalariaAssessmentRecord {
                risk_level: assessment.malaria.risk_level,
                test_results: labs.malaria,
                species: new_diagnosis.malaria_assessment.species,
                complications: clean_list(
                    "complication",
                    new_diagnosis.malaria_assessment.complications,
                )?,
            },
            typhoid_assessment: TyphoidAssessmentRecord {
                risk_level: assessment.typhoid.risk_level,
                test_results: labs.typhoid,
                complications: clean_list(
                    "complication",
                    new_diagnosis.typhoid_assessment.complications,
                )?,
            },
            final_diagnosis: optional_text("final diagnosis", new_diagnosis.final_diagnosis)?,
            notes: optional_text("notes", new_diagnosis.notes)?,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(
            diagnosis_id = %diagnosis.id,
            patient_id = %diagnosis.patient_id,
            malaria_risk = %diagnosis.malaria_assessment.risk_level,
            typhoid_risk = %diagnosis.typhoid_assessment.risk_level,
            "diagnosis recorded"
        );
        Ok(diagnosis)
    }

    pub fn list(&self, principal: &Principal, query: &DiagnosisQuery) -> RecordResult<Vec<Diagnosis>> {
        principal.require("read diagnoses", DIAGNOSIS_READERS)?;
        self.store.diagnoses.find(|d| {
            query.patient_id.map_or(true, |id| d.patient_id == id)
                && query.doctor_id.map_or(true, |id| d.doctor_id == id)
                && query
                    .malaria_risk
                    .map_or(true, |r| d.malaria_assessment.risk_level == r)
                && query
                    .typhoid_risk
                    .map_or(true, |r| d.typhoid_assessment.risk_level == r)
        })
    }

    pub fn get(&self, principal: &Principal, id: Uuid) -> RecordResult<Diagnosis> {
        principal.require("read diagnoses", DIAGNOSIS_READERS)?;
        self.store.diagnoses.get(id)
    }

    /// Apply clinician edits. Stored risk tiers are left as they are, even when the symptoms or
    /// test results change.
    pub fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        update: DiagnosisUpdate,
    ) -> RecordResult<Diagnosis> {
        principal.require("edit diagnoses", DOCTORS)?;

        let symptoms = update
            .symptoms
            .map(|symptoms| SymptomReport::parse(Some(symptoms)))
            .transpose()?
            .map(SymptomReport::into_entries);
        let malaria_complications = update
            .malaria_complications
            .map(|items| clean_list("complication", items))
            .transpose()?;
        let typhoid_complications = update
            .typhoid_complications
            .map(|items| clean_list("complication", items))
            .transpose()?;
        let final_diagnosis = optional_text("final diagnosis", update.final_diagnosis)?;
        let notes = optional_text("notes", update.notes)?;

        let diagnosis = self.store.diagnoses.update(id, |diagnosis| {
            require_author(principal, diagnosis)?;
            if let Some(symptoms) = symptoms {
                diagnosis.symptoms = symptoms;
            }
            if let Some(results) = update.malaria_test_results {
                diagnosis.malaria_assessment.test_results = results;
            }
            if let Some(results) = update.typhoid_test_results {
                diagnosis.typhoid_assessment.test_results = results;
            }
            if let Some(species) = update.malaria_species {
                diagnosis.malaria_assessment.species = Some(species);
            }
            if let Some(items) = malaria_complications {
                diagnosis.malaria_assessment.complications = items;
            }
            if let Some(items) = typhoid_complications {
                diagnosis.typhoid_assessment.complications = items;
            }
            if final_diagnosis.is_some() {
                diagnosis.final_diagnosis = final_diagnosis;
            }
            if notes.is_some() {
                diagnosis.notes = notes;
            }
            diagnosis.updated_at = Utc::now();
            Ok(())
        })?;

        tracing::info!(diagnosis_id = %diagnosis.id, "diagnosis updated");
        Ok(diagnosis)
    }

    /// Re-score the stored symptoms, optionally against new lab results, and store the new
    /// tiers. Returns the full assessment alongside the updated record.
    pub fn reassess(
        &self,
        principal: &Principal,
        id: Uuid,
        request: ReassessRequest,
    ) -> RecordResult<ReassessedDiagnosis> {
        principal.require("reassess diagnoses", DOCTORS)?;

        let (diagnosis, assessment) = self.store.diagnoses.update_with(id, |diagnosis| {
            require_author(principal, diagnosis)?;
            let labs = request.test_results.apply_to(diagnosis.lab_results());
            let report = SymptomReport::from_entries(diagnosis.symptoms.clone())?;
            let assessment = AssessmentService::assess(&report, &labs);

            diagnosis.malaria_assessment.test_results = labs.malaria;
            diagnosis.malaria_assessment.risk_level = assessment.malaria.risk_level;
            diagnosis.typhoid_assessment.test_results = labs.typhoid;
            diagnosis.typhoid_assessment.risk_level = assessment.typhoid.risk_level;
            diagnosis.updated_at = Utc::now();
            Ok(assessment)
        })?;

        tracing::info!(
            diagnosis_id = %diagnosis.id,
            malaria_risk = %diagnosis.malaria_assessment.risk_level,
            typhoid_risk = %diagnosis.typhoid_assessment.risk_level,
            "diagnosis reassessed"
        );
        Ok(ReassessedDiagnosis {
            diagnosis,
            assessment,
        })
    }

    /// Diagnosis that exists and belongs to `patient_id`.
    pub(crate) fn require_for_patient(&self, id: Uuid, patient_id: Uuid) -> RecordResult<Diagnosis> {
        let diagnosis = self.store.diagnoses.get(id)?;
        if diagnosis.patient_id != patient_id {
            return Err(RecordError::InvalidInput(format!(
                "diagnosis {id} belongs to another patient"
            )));
        }
        Ok(diagnosis)
    }

    pub(crate) fn risk_counts(&self, tier_of: impl Fn(&Diagnosis) -> RiskLevel) -> RecordResult<[usize; 3]> {
        let mut counts = [0; 3];
        for diagnosis in self.store.diagnoses.find(|_| true)? {
            let index = match tier_of(&diagnosis) {
                RiskLevel::Low => 0,
                RiskLevel::Moderate => 1,
                RiskLevel::High => 2,
            };
            counts[index] += 1;
        }
        Ok(counts)
    }

    fn require_patient_appointment(&self, appointment_id: Uuid, patient_id: Uuid) -> RecordResult<()> {
        let appointment = self.store.appointments.get(appointment_id)?;
        if appointment.patient_id != patient_id {
            return Err(RecordError::InvalidInput(format!(
                "appointment {appointment_id} belongs to another patient"
            )));
        }
        Ok(())
    }
}

fn require_author(principal: &Principal, diagnosis: &Diagnosis) -> RecordResult<()> {
    if diagnosis.doctor_id == principal.user_id {
        return Ok(());
    }
    tracing::warn!(user_id = %principal.user_id, diagnosis_id = %diagnosis.id, "edit by non-author refused");
    Err(RecordError::Forbidden(
        "only the authoring doctor may change a diagnosis".into(),
    ))
}
