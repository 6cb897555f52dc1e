//! Patient registration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use carepoint_types::NonEmptyText;

use crate::access::{Principal, PATIENT_WRITERS};
use crate::store::{Entity, Store};
use crate::{RecordError, RecordResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Patient {
    const KIND: &'static str = "patient";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        self.national_id
            .iter()
            .map(|n| ("national id", n.to_uppercase()))
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn validate_birth_date(date_of_birth: NaiveDate) -> RecordResult<()> {
    if date_of_birth > Utc::now().date_naive() {
        return Err(RecordError::InvalidInput(
            "date of birth cannot be in the future".into(),
        ));
    }
    Ok(())
}

fn optional_text(field: &'static str, value: Option<String>) -> RecordResult<Option<String>> {
    Ok(NonEmptyText::optional(field, value)?.map(NonEmptyText::into_string))
}

#[derive(Clone)]
pub struct PatientService {
    store: Arc<Store>,
}

impl PatientService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Register a patient.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Forbidden`] for pharmacists,
    /// - [`RecordError::InvalidInput`] for blank names or a future date of birth,
    /// - [`RecordError::Conflict`] if the national id is already registered.
    pub fn create(&self, principal: &Principal, new_patient: NewPatient) -> RecordResult<Patient> {
        principal.require("register patients", PATIENT_WRITERS)?;

        let first_name = NonEmptyText::new("first name", &new_patient.first_name)?;
        let last_name = NonEmptyText::new("last name", &new_patient.last_name)?;
        validate_birth_date(new_patient.date_of_birth)?;

        let now = Utc::now();
        let patient = self.store.patients.insert(Patient {
            id: Uuid::new_v4(),
            first_name: first_name.into_string(),
            last_name: last_name.into_string(),
            date_of_birth: new_patient.date_of_birth,
            gender: new_patient.gender,
            phone: optional_text("phone", new_patient.phone)?,
            address: optional_text("address", new_patient.address)?,
            national_id: optional_text("national id", new_patient.national_id)?,
            created_by: principal.user_id,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(patient_id = %patient.id, created_by = %principal.user_id, "patient registered");
        Ok(patient)
    }

    /// List patients, optionally filtered by a case-insensitive substring of either name.
    pub fn list(&self, _principal: &Principal, search: Option<&str>) -> RecordResult<Vec<Patient>> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        self.store.patients.find(|p| match &needle {
            None => true,
            Some(needle) => {
                p.first_name.to_lowercase().contains(needle)
                    || p.last_name.to_lowercase().contains(needle)
            }
        })
    }

    pub fn get(&self, _principal: &Principal, id: Uuid) -> RecordResult<Patient> {
        self.store.patients.get(id)
    }

    pub fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        update: PatientUpdate,
    ) -> RecordResult<Patient> {
        principal.require("update patients", PATIENT_WRITERS)?;

        let first_name = update
            .first_name
            .map(|n| NonEmptyText::new("first name", n))
            .transpose()?;
        let last_name = update
            .last_name
            .map(|n| NonEmptyText::new("last name", n))
            .transpose()?;
        if let Some(date_of_birth) = update.date_of_birth {
            validate_birth_date(date_of_birth)?;
        }
        let phone = optional_text("phone", update.phone)?;
        let address = optional_text("address", update.address)?;

        let patient = self.store.patients.update(id, |patient| {
            if let Some(first_name) = first_name {
                patient.first_name = first_name.into_string();
            }
            if let Some(last_name) = last_name {
                patient.last_name = last_name.into_string();
            }
            if let Some(date_of_birth) = update.date_of_birth {
                patient.date_of_birth = date_of_birth;
            }
            if update.gender.is_some() {
                patient.gender = update.gender;
            }
            if phone.is_some() {
                patient.phone = phone;
            }
            if address.is_some() {
                patient.address = address;
            }
            patient.updated_at = Utc::now();
            Ok(())
        })?;

        tracing::info!(patient_id = %patient.id, updated_by = %principal.user_id, "patient updated");
        Ok(patient)
    }

    pub(crate) fn require_exists(&self, id: Uuid) -> RecordResult<Patient> {
        self.store.patients.get(id)
    }

    pub(crate) fn count(&self) -> RecordResult<usize> {
        self.store.patients.count(|_| true)
    }
}
