//! Roles and the authenticated caller.
//!
//! Every mutating service call takes a [`Principal`] and checks its role before touching the
//! store.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::{RecordError, RecordResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Pharmacist,
    Receptionist,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
        Role::Receptionist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Pharmacist => "pharmacist",
            Role::Receptionist => "receptionist",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RecordError;

    fn from_str(s: &str) -> RecordResult<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| RecordError::InvalidInput(format!("unknown role '{s}'")))
    }
}

/// Roles allowed to register and edit patients.
pub const PATIENT_WRITERS: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse, Role::Receptionist];

/// Roles allowed to book appointments and change their status.
pub const SCHEDULERS: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse, Role::Receptionist];

/// Roles allowed to read diagnoses.
pub const DIAGNOSIS_READERS: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse];

/// Roles allowed to read prescriptions.
pub const PRESCRIPTION_READERS: &[Role] =
    &[Role::Admin, Role::Doctor, Role::Nurse, Role::Pharmacist];

/// The authenticated caller of a service operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Principal {
    /// Fail with [`RecordError::Forbidden`] unless the caller holds one of `allowed`.
    pub fn require(&self, action: &str, allowed: &[Role]) -> RecordResult<()> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.user_id,
            role = %self.role,
            action,
            "role check failed"
        );
        Err(RecordError::Forbidden(format!(
            "role '{}' may not {action}",
            self.role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            name: "Test".into(),
            role,
        }
    }

    #[test]
    fn require_allows_listed_roles() {
        assert!(principal(Role::Nurse)
            .require("create patients", PATIENT_WRITERS)
            .is_ok());
    }

    #[test]
    fn require_rejects_other_roles() {
        let err = principal(Role::Pharmacist)
            .require("create patients", PATIENT_WRITERS)
            .unwrap_err();
        assert!(
            matches!(err, RecordError::Forbidden(msg) if msg == "role 'pharmacist' may not create patients")
        );
    }

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert!("surgeon".parse::<Role>().is_err());
    }
}
