//! # CarePoint Core
//!
//! Record services for the CarePoint clinic API: staff accounts, patients, appointments,
//! diagnoses, prescriptions and the admin summary report.
//!
//! Every service operation takes the authenticated [`Principal`] and checks its role before
//! touching the [`Store`]. Diagnoses embed the risk tiers computed by `carepoint-assessment`.
//!
//! **No API concerns**: HTTP routing, key extraction and response shaping belong in `api-rest`
//! and `api-shared`.

pub mod access;
pub mod appointments;
pub mod config;
pub mod constants;
pub mod diagnoses;
pub mod error;
pub mod patients;
pub mod prescriptions;
pub mod reports;
pub mod store;
pub mod users;

use std::sync::Arc;

pub use access::{Principal, Role};
pub use appointments::{
    Appointment, AppointmentQuery, AppointmentService, AppointmentStatus, AppointmentStatusUpdate,
    NewAppointment,
};
pub use config::{
    appointment_minutes_from_env_value, load_seed_users, parse_seed_users, CoreConfig, SeedUser,
};
pub use diagnoses::{
    Diagnosis, DiagnosisQuery, DiagnosisService, DiagnosisUpdate, LabResultsUpdate,
    MalariaAssessmentInput, MalariaAssessmentRecord, MalariaSpecies, NewDiagnosis, ReassessRequest,
    ReassessedDiagnosis, TyphoidAssessmentInput, TyphoidAssessmentRecord,
};
pub use error::{RecordError, RecordResult};
pub use patients::{Gender, NewPatient, Patient, PatientService, PatientUpdate};
pub use prescriptions::{
    Medication, NewPrescription, Prescription, PrescriptionQuery, PrescriptionService,
    PrescriptionStatus,
};
pub use reports::{ReportService, RiskCounts, SummaryReport};
pub use store::Store;
pub use users::{NewUser, UserProfile, UserService, UserUpdate};

/// Display name of the account created from the configured admin key.
const BOOTSTRAP_ADMIN_NAME: &str = "Administrator";
const BOOTSTRAP_ADMIN_EMAIL: &str = "admin@carepoint.local";

/// All record services sharing one [`Store`].
#[derive(Clone)]
pub struct CoreServices {
    pub users: UserService,
    pub patients: PatientService,
    pub appointments: AppointmentService,
    pub diagnoses: DiagnosisService,
    pub prescriptions: PrescriptionService,
    pub reports: ReportService,
    cfg: Arc<CoreConfig>,
}

impl CoreServices {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let store = Arc::new(Store::default());
        let users = UserService::new(store.clone());
        let patients = PatientService::new(store.clone());
        let appointments =
            AppointmentService::new(cfg.clone(), store.clone(), patients.clone(), users.clone());
        let diagnoses = DiagnosisService::new(store.clone(), patients.clone());
        let prescriptions = PrescriptionService::new(store, patients.clone(), diagnoses.clone());
        let reports = ReportService::new(
            users.clone(),
            patients.clone(),
            appointments.clone(),
            diagnoses.clone(),
            prescriptions.clone(),
        );

        Self {
            users,
            patients,
            appointments,
            diagnoses,
            prescriptions,
            reports,
            cfg,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Create the configured admin account and any seed accounts. Accounts whose email is
    /// already registered are left untouched, so calling this twice is harmless.
    ///
    /// Returns the number of accounts known after bootstrap.
    pub fn bootstrap(&self, seed_users: Vec<SeedUser>) -> RecordResult<usize> {
        if let Some(api_key) = self.cfg.admin_api_key() {
            self.users.bootstrap(NewUser {
                name: BOOTSTRAP_ADMIN_NAME.into(),
                email: BOOTSTRAP_ADMIN_EMAIL.into(),
                role: Role::Admin,
                api_key: api_key.to_string(),
            })?;
        }
        for seed in seed_users {
            self.users.bootstrap(NewUser::from(seed))?;
        }

        let known = Role::ALL
            .into_iter()
            .map(|role| self.users.count_by_role(role))
            .sum::<RecordResult<usize>>()?;
        if known == 0 {
            tracing::warn!("no accounts configured; every authenticated route will answer 401");
        }
        Ok(known)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_config_admin_and_seeds() {
        let cfg = CoreConfig::new(Some("root-key-0123456789".into()), 30).unwrap();
        let services = CoreServices::new(Arc::new(cfg));
        let seeds = vec![SeedUser {
            name: "Dr Ada".into(),
            email: "ada@clinic.test".into(),
            role: Role::Doctor,
            api_key: "ada-0123456789abcdef".into(),
        }];

        assert_eq!(services.bootstrap(seeds.clone()).unwrap(), 2);
        assert_eq!(services.bootstrap(seeds).unwrap(), 2);

        let admin = services.users.authenticate("root-key-0123456789").unwrap();
        assert_eq!(admin.role, Role::Admin);
        let doctor = services.users.authenticate("ada-0123456789abcdef").unwrap();
        assert_eq!(doctor.name, "Dr Ada");
    }

    #[test]
    fn bootstrap_without_accounts_is_empty() {
        let services = CoreServices::new(Arc::new(CoreConfig::default()));
        assert_eq!(services.bootstrap(Vec::new()).unwrap(), 0);
    }
}
