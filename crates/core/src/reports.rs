//! Admin summary report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::access::{Principal, Role};
use crate::appointments::{AppointmentService, AppointmentStatus};
use crate::diagnoses::{Diagnosis, DiagnosisService};
use crate::patients::PatientService;
use crate::prescriptions::{PrescriptionService, PrescriptionStatus};
use crate::users::UserService;
use crate::RecordResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RiskCounts {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
}

impl From<[usize; 3]> for RiskCounts {
    fn from([low, moderate, high]: [usize; 3]) -> Self {
        Self {
            low,
            moderate,
            high,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub users_by_role: BTreeMap<String, usize>,
    pub patients: usize,
    pub appointments_by_status: BTreeMap<String, usize>,
    pub prescriptions_by_status: BTreeMap<String, usize>,
    pub malaria_risk: RiskCounts,
    pub typhoid_risk: RiskCounts,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ReportService {
    users: UserService,
    patients: PatientService,
    appointments: AppointmentService,
    diagnoses: DiagnosisService,
    prescriptions: PrescriptionService,
}

impl ReportService {
    pub fn new(
        users: UserService,
        patients: PatientService,
        appointments: AppointmentService,
        diagnoses: DiagnosisService,
        prescriptions: PrescriptionService,
    ) -> Self {
        Self {
            users,
            patients,
            appointments,
            diagnoses,
            prescriptions,
        }
    }

    /// Counts across every collection. Every role and status appears, including zero counts.
    pub fn summary(&self, principal: &Principal) -> RecordResult<SummaryReport> {
        principal.require("view reports", &[Role::Admin])?;

        let mut users_by_role = BTreeMap::new();
        for role in Role::ALL {
            users_by_role.insert(role.as_str().to_string(), self.users.count_by_role(role)?);
        }

        let mut appointments_by_status = BTreeMap::new();
        for status in AppointmentStatus::ALL {
            appointments_by_status.insert(
                status.as_str().to_string(),
                self.appointments.count_by_status(status)?,
            );
        }

        let mut prescriptions_by_status = BTreeMap::new();
        for status in PrescriptionStatus::ALL {
            prescriptions_by_status.insert(
                status.as_str().to_string(),
                self.prescriptions.count_by_status(status)?,
            );
        }

        let malaria_tier = |d: &Diagnosis| d.malaria_assessment.risk_level;
        let typhoid_tier = |d: &Diagnosis| d.typhoid_assessment.risk_level;

        Ok(SummaryReport {
            users_by_role,
            patients: self.patients.count()?,
            appointments_by_status,
            prescriptions_by_status,
            malaria_risk: self.diagnoses.risk_counts(malaria_tier)?.into(),
            typhoid_risk: self.diagnoses.risk_counts(typhoid_tier)?.into(),
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnoses::tests::new_diagnosis;
    use crate::users::tests::admin;
    use crate::{CoreConfig, CoreServices};
    use std::sync::Arc;

    #[test]
    fn summary_counts_every_collection() {
        let services = CoreServices::new(Arc::new(CoreConfig::default()));
        let admin = admin(&services.users);
        services
            .users
            .create(&admin, crate::users::tests::new_user(Role::Doctor, "doc"))
            .unwrap();
        let doctor = services.users.authenticate("doc-0123456789abcdef").unwrap();
        let patient = services
            .patients
            .create(&admin, crate::patients::tests::new_patient("Amara", None))
            .unwrap();
        services
            .diagnoses
            .create(
                &doctor,
                new_diagnosis(
                    patient.id,
                    &["fever", "chills", "headache", "nausea", "vomiting"],
                ),
            )
            .unwrap();

        let report = services.reports.summary(&admin).unwrap();
        assert_eq!(report.users_by_role["admin"], 1);
        assert_eq!(report.users_by_role["doctor"], 1);
        assert_eq!(report.users_by_role["nurse"], 0);
        assert_eq!(report.patients, 1);
        assert_eq!(report.appointments_by_status["no-show"], 0);
        assert_eq!(report.malaria_risk, RiskCounts { low: 0, moderate: 0, high: 1 });
        assert_eq!(report.typhoid_risk.low, 1);
    }

    #[test]
    fn only_admins_view_reports() {
        let services = CoreServices::new(Arc::new(CoreConfig::default()));
        let admin = admin(&services.users);
        services
            .users
            .create(&admin, crate::users::tests::new_user(Role::Nurse, "nurse"))
            .unwrap();
        let nurse = services.users.authenticate("nurse-0123456789abcdef").unwrap();
        assert!(matches!(
            services.reports.summary(&nurse),
            Err(crate::RecordError::Forbidden(_))
        ));
    }
}
