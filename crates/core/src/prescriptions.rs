//! Prescriptions and dispensing bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use carepoint_types::NonEmptyText;

use crate::access::{Principal, Role, PRESCRIPTION_READERS};
use crate::constants::MAX_MEDICATIONS;
use crate::diagnoses::DiagnosisService;
use crate::patients::PatientService;
use crate::store::{Entity, Store};
use crate::{RecordError, RecordResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Active,
    Dispensed,
    Cancelled,
}

impl PrescriptionStatus {
    pub const ALL: [PrescriptionStatus; 3] = [
        PrescriptionStatus::Active,
        PrescriptionStatus::Dispensed,
        PrescriptionStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrescriptionStatus::Active => "active",
            PrescriptionStatus::Dispensed => "dispensed",
            PrescriptionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Medication {
    fn validated(self, index: usize) -> RecordResult<Self> {
        let at = |e: carepoint_types::TextError| {
            RecordError::InvalidInput(format!("medications[{index}]: {e}"))
        };
        if self.quantity == 0 {
            return Err(RecordError::InvalidInput(format!(
                "medications[{index}]: quantity must be at least 1"
            )));
        }
        if self.duration_days == Some(0) {
            return Err(RecordError::InvalidInput(format!(
                "medications[{index}]: duration must be at least 1 day"
            )));
        }
        Ok(Self {
            name: NonEmptyText::new("name", &self.name).map_err(at)?.into_string(),
            dosage: NonEmptyText::new("dosage", &self.dosage).map_err(at)?.into_string(),
            frequency: NonEmptyText::new("frequency", &self.frequency)
                .map_err(at)?
                .into_string(),
            duration_days: self.duration_days,
            quantity: self.quantity,
            instructions: NonEmptyText::optional("instructions", self.instructions)
                .map_err(at)?
                .map(NonEmptyText::into_string),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_id: Option<Uuid>,
    pub medications: Vec<Medication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: PrescriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispensed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispensed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Prescription {
    const KIND: &'static str = "prescription";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub patient_id: Uuid,
    #[serde(default)]
    pub diagnosis_id: Option<Uuid>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PrescriptionQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<PrescriptionStatus>,
}

#[derive(Clone)]
pub struct PrescriptionService {
    store: Arc<Store>,
    patients: PatientService,
    diagnoses: DiagnosisService,
}

impl PrescriptionService {
    pub fn new(store: Arc<Store>, patients: PatientService, diagnoses: DiagnosisService) -> Self {
        Self {
            store,
            patients,
            diagnoses,
        }
    }

    /// Write a prescription.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Forbidden`] unless the caller is a doctor,
    /// - [`RecordError::InvalidInput`] for an empty or oversized medication list, a medication
    ///   missing its name, dosage or frequency, a zero quantity, or a diagnosis that belongs to
    ///   another patient,
    /// - [`RecordError::NotFound`] for an unknown patient or diagnosis.
    pub fn create(
        &self,
        principal: &Principal,
        new_prescription: NewPrescription,
    ) -> RecordResult<Prescription> {
        principal.require("write prescriptions", &[Role::Doctor])?;

        if new_prescription.medications.is_empty() {
            return Err(RecordError::InvalidInput(
                "at least one medication is required".into(),
            ));
        }
        if new_prescription.medications.len() > MAX_MEDICATIONS {
            return Err(RecordError::InvalidInput(format!(
                "a prescription holds at most {MAX_MEDICATIONS} medications"
            )));
        }
        let medications = new_prescription
            .medications
            .into_iter()
            .enumerate()
            .map(|(index, medication)| medication.validated(index))
            .collect::<RecordResult<Vec<_>>>()?;

        self.patients.require_exists(new_prescription.patient_id)?;
        if let Some(diagnosis_id) = new_prescription.diagnosis_id {
            self.diagnoses
                .require_for_patient(diagnosis_id, new_prescription.patient_id)?;
        }

        let now = Utc::now();
        let prescription = self.store.prescriptions.insert(Prescription {
            id: Uuid::new_v4(),
            patient_id: new_prescription.patient_id,
            doctor_id: principal.user_id,
            diagnosis_id: new_prescription.diagnosis_id,
            medications,
            notes: NonEmptyText::optional("notes", new_prescription.notes)?
                .map(NonEmptyText::into_string),
            status: PrescriptionStatus::Active,
            dispensed_by: None,
            dispensed_at: None,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(
            prescription_id = %prescription.id,
            patient_id = %prescription.patient_id,
            medications = prescription.medications.len(),
            "prescription written"
        );
        Ok(prescription)
    }

    pub fn list(
        &self,
        principal: &Principal,
        query: &PrescriptionQuery,
    ) -> RecordResult<Vec<Prescription>> {
        principal.require("read prescriptions", PRESCRIPTION_READERS)?;
        self.store.prescriptions.find(|p| {
            query.patient_id.map_or(true, |id| p.patient_id == id)
                && query.doctor_id.map_or(true, |id| p.doctor_id == id)
                && query.status.map_or(true, |s| p.status == s)
        })
    }

    pub fn get(&self, principal: &Principal, id: Uuid) -> RecordResult<Prescription> {
        principal.require("read prescriptions", PRESCRIPTION_READERS)?;
        self.store.prescriptions.get(id)
    }

    /// Mark an active prescription as handed out, recording who dispensed it and when.
    pub fn dispense(&self, principal: &Principal, id: Uuid) -> RecordResult<Prescription> {
        principal.require("dispense prescriptions", &[Role::Pharmacist])?;

        let prescription = self.store.prescriptions.update(id, |prescription| {
            require_active(prescription, PrescriptionStatus::Dispensed)?;
            let now = Utc::now();
            prescription.status = PrescriptionStatus::Dispensed;
            prescription.dispensed_by = Some(principal.user_id);
            prescription.dispensed_at = Some(now);
            prescription.updated_at = now;
            Ok(())
        })?;

        tracing::info!(prescription_id = %prescription.id, dispensed_by = %principal.user_id, "prescription dispensed");
        Ok(prescription)
    }

    pub fn cancel(&self, principal: &Principal, id: Uuid) -> RecordResult<Prescription> {
        principal.require("cancel prescriptions", &[Role::Doctor])?;

        let prescription = self.store.prescriptions.update(id, |prescription| {
            require_active(prescription, PrescriptionStatus::Cancelled)?;
            prescription.status = PrescriptionStatus::Cancelled;
            prescription.updated_at = Utc::now();
            Ok(())
        })?;

        tracing::info!(prescription_id = %prescription.id, cancelled_by = %principal.user_id, "prescription cancelled");
        Ok(prescription)
    }

    pub(crate) fn count_by_status(&self, status: PrescriptionStatus) -> RecordResult<usize> {
        self.store.prescriptions.count(|p| p.status == status)
    }
}

fn require_active(prescription: &Prescription, target: PrescriptionStatus) -> RecordResult<()> {
    if prescription.status == PrescriptionStatus::Active {
        return Ok(());
    }
    Err(RecordError::InvalidTransition(format!(
        "prescription cannot move from {} to {}",
        prescription.status.as_str(),
        target.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnoses::tests::{new_diagnosis, setup as diagnosis_setup};
    use crate::patients::tests::new_patient;
    use crate::users::tests::new_user;

    struct Fixture {
        prescriptions: PrescriptionService,
        diagnoses: DiagnosisService,
        patients: PatientService,
        admin: Principal,
        doctor: Principal,
        pharmacist: Principal,
        patient_id: Uuid,
    }

    fn setup() -> Fixture {
        let base = diagnosis_setup();
        base.users
            .create(&base.admin, new_user(Role::Pharmacist, "pharm"))
            .unwrap();
        let pharmacist = base.users.authenticate("pharm-0123456789abcdef").unwrap();
        let patients = PatientService::new(base.store.clone());

        Fixture {
            prescriptions: PrescriptionService::new(
                base.store.clone(),
                patients.clone(),
                base.diagnoses.clone(),
            ),
            diagnoses: base.diagnoses,
            patients,
            admin: base.admin,
            doctor: base.doctor,
            pharmacist,
            patient_id: base.patient_id,
        }
    }

    fn artemether(quantity: u32) -> Medication {
        Medication {
            name: "Artemether-lumefantrine".into(),
            dosage: "80/480 mg".into(),
            frequency: "twice daily".into(),
            duration_days: Some(3),
            quantity,
            instructions: Some("take with food".into()),
        }
    }

    fn new_prescription(patient_id: Uuid, medications: Vec<Medication>) -> NewPrescription {
        NewPrescription {
            patient_id,
            diagnosis_id: None,
            medications,
            notes: None,
        }
    }

    #[test]
    fn doctor_writes_and_pharmacist_dispenses() {
        let f = setup();
        let prescription = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![artemether(6)]))
            .unwrap();
        assert_eq!(prescription.status, PrescriptionStatus::Active);

        let dispensed = f
            .prescriptions
            .dispense(&f.pharmacist, prescription.id)
            .unwrap();
        assert_eq!(dispensed.status, PrescriptionStatus::Dispensed);
        assert_eq!(dispensed.dispensed_by, Some(f.pharmacist.user_id));
        assert!(dispensed.dispensed_at.is_some());
    }

    #[test]
    fn dispensed_prescription_cannot_be_cancelled() {
        let f = setup();
        let prescription = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![artemether(6)]))
            .unwrap();
        f.prescriptions
            .dispense(&f.pharmacist, prescription.id)
            .unwrap();
        let err = f
            .prescriptions
            .cancel(&f.doctor, prescription.id)
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidTransition(_)));
    }

    #[test]
    fn rejects_empty_and_invalid_medications() {
        let f = setup();
        let err = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![]))
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidInput(_)));

        let err = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![artemether(0)]))
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidInput(msg) if msg.contains("quantity")));

        let mut nameless = artemether(6);
        nameless.dosage = "  ".into();
        let err = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![nameless]))
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidInput(msg) if msg.starts_with("medications[0]")));
    }

    #[test]
    fn roles_are_enforced() {
        let f = setup();
        let err = f
            .prescriptions
            .create(
                &f.pharmacist,
                new_prescription(f.patient_id, vec![artemether(6)]),
            )
            .unwrap_err();
        assert!(matches!(err, RecordError::Forbidden(_)));

        let prescription = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![artemether(6)]))
            .unwrap();
        let err = f
            .prescriptions
            .dispense(&f.doctor, prescription.id)
            .unwrap_err();
        assert!(matches!(err, RecordError::Forbidden(_)));
    }

    #[test]
    fn diagnosis_must_belong_to_patient() {
        let f = setup();
        let other_patient = f
            .patients
            .create(&f.admin, new_patient("Bola", None))
            .unwrap();
        let diagnosis = f
            .diagnoses
            .create(&f.doctor, new_diagnosis(other_patient.id, &["fever"]))
            .unwrap();

        let mut request = new_prescription(f.patient_id, vec![artemether(6)]);
        request.diagnosis_id = Some(diagnosis.id);
        let err = f.prescriptions.create(&f.doctor, request).unwrap_err();
        assert!(matches!(err, RecordError::InvalidInput(msg) if msg.contains("another patient")));
    }

    #[test]
    fn lists_by_status() {
        let f = setup();
        let first = f
            .prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![artemether(6)]))
            .unwrap();
        f.prescriptions
            .create(&f.doctor, new_prescription(f.patient_id, vec![artemether(12)]))
            .unwrap();
        f.prescriptions.cancel(&f.doctor, first.id).unwrap();

        let active = f
            .prescriptions
            .list(
                &f.pharmacist,
                &PrescriptionQuery {
                    status: Some(PrescriptionStatus::Active),
                    ..PrescriptionQuery::default()
                },
            )
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].medications[0].quantity, 12);
    }
}
