pub(crate) mod appointments;
pub(crate) mod diagnoses;
pub(crate) mod health;
pub(crate) mod patients;
pub(crate) mod prescriptions;
pub(crate) mod reports;
pub(crate) mod symptom_checker;
pub(crate) mod users;
