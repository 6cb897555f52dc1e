//! Appointment scheduling with time-slot conflict checks.
//!
//! An appointment occupies `[scheduled_at, scheduled_at + duration)`. A booking is rejected when
//! the doctor or the patient already holds a non-cancelled appointment overlapping that slot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use carepoint_types::NonEmptyText;

use crate::access::{Principal, SCHEDULERS};
use crate::config::{validate_appointment_minutes, CoreConfig};
use crate::patients::PatientService;
use crate::store::{Entity, Store};
use crate::users::UserService;
use crate::{RecordError, RecordResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// True when this appointment still holds its slot and intersects `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status != AppointmentStatus::Cancelled && self.scheduled_at < end && start < self.ends_at()
    }
}

impl Entity for Appointment {
    const KIND: &'static str = "appointment";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AppointmentQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatusUpdate {
    pub status: AppointmentStatus,
}

#[derive(Clone)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
    store: Arc<Store>,
    patients: PatientService,
    users: UserService,
}

impl AppointmentService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<Store>,
        patients: PatientService,
        users: UserService,
    ) -> Self {
        Self {
            cfg,
            store,
            patients,
            users,
        }
    }

    /// Book an appointment.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Forbidden`] for pharmacists,
    /// - [`RecordError::NotFound`] for an unknown patient or doctor,
    /// - [`RecordError::InvalidInput`] if the doctor is not an active doctor, the slot is in the
    ///   past or the duration is out of range,
    /// - [`RecordError::Conflict`] if the doctor or patient is already booked in that slot.
    pub fn create(
        &self,
        principal: &Principal,
        new_appointment: NewAppointment,
    ) -> RecordResult<Appointment> {
        principal.require("book appointments", SCHEDULERS)?;

        let duration_minutes = new_appointment
            .duration_minutes
            .unwrap_or(self.cfg.default_appointment_minutes());
        validate_appointment_minutes(duration_minutes)?;

        let now = Utc::now();
        if new_appointment.scheduled_at <= now {
            return Err(RecordError::InvalidInput(
                "appointments cannot be booked in the past".into(),
            ));
        }

        self.patients.require_exists(new_appointment.patient_id)?;
        self.users.require_active_doctor(new_appointment.doctor_id)?;

        let reason = NonEmptyText::optional("reason", new_appointment.reason)?
            .map(NonEmptyText::into_string);

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: new_appointment.patient_id,
            doctor_id: new_appointment.doctor_id,
            scheduled_at: new_appointment.scheduled_at,
            duration_minutes,
            reason,
            status: AppointmentStatus::Scheduled,
            created_by: principal.user_id,
            created_at: now,
            updated_at: now,
        };

        let start = appointment.scheduled_at;
        let end = appointment.ends_at();
        let appointment = self
            .store
            .appointments
            .insert_checked(appointment.clone(), |existing| {
                ensure_slot_free(existing, &appointment, start, end)
            })?;

        tracing::info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            patient_id = %appointment.patient_id,
            scheduled_at = %appointment.scheduled_at,
            "appointment booked"
        );
        Ok(appointment)
    }

    pub fn list(
        &self,
        principal: &Principal,
        query: &AppointmentQuery,
    ) -> RecordResult<Vec<Appointment>> {
        principal.require("list appointments", SCHEDULERS)?;
        let mut appointments = self.store.appointments.find(|a| {
            query.doctor_id.map_or(true, |id| a.doctor_id == id)
                && query.patient_id.map_or(true, |id| a.patient_id == id)
                && query.status.map_or(true, |s| a.status == s)
        })?;
        appointments.sort_by_key(|a| a.scheduled_at);
        Ok(appointments)
    }

    pub fn get(&self, principal: &Principal, id: Uuid) -> RecordResult<Appointment> {
        principal.require("read appointments", SCHEDULERS)?;
        self.store.appointments.get(id)
    }

    /// Move a scheduled appointment to completed, cancelled or no-show. Final states are
    /// terminal.
    pub fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: AppointmentStatus,
    ) -> RecordResult<Appointment> {
        principal.require("change appointment status", SCHEDULERS)?;

        let appointment = self.store.appointments.update(id, |appointment| {
            if appointment.status != AppointmentStatus::Scheduled
                || status == AppointmentStatus::Scheduled
            {
                return Err(RecordError::InvalidTransition(format!(
                    "appointment cannot move from {} to {}",
                    appointment.status.as_str(),
                    status.as_str()
                )));
            }
            appointment.status = status;
            appointment.updated_at = Utc::now();
            Ok(())
        })?;

        tracing::info!(appointment_id = %appointment.id, status = status.as_str(), "appointment status changed");
        Ok(appointment)
    }

    pub(crate) fn count_by_status(&self, status: AppointmentStatus) -> RecordResult<usize> {
        self.store.appointments.count(|a| a.status == status)
    }
}

fn ensure_slot_free(
    existing: &[Appointment],
    candidate: &Appointment,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> RecordResult<()> {
    if let Some(clash) = existing
        .iter()
        .find(|a| a.doctor_id == candidate.doctor_id && a.overlaps(start, end))
    {
        tracing::warn!(doctor_id = %candidate.doctor_id, clash = %clash.id, "doctor slot conflict");
        return Err(RecordError::Conflict(format!(
            "doctor already has an appointment at {}",
            clash.scheduled_at.to_rfc3339()
        )));
    }
    if let Some(clash) = existing
        .iter()
        .find(|a| a.patient_id == candidate.patient_id && a.overlaps(start, end))
    {
        tracing::warn!(patient_id = %candidate.patient_id, clash = %clash.id, "patient slot conflict");
        return Err(RecordError::Conflict(format!(
            "patient already has an appointment at {}",
            clash.scheduled_at.to_rfc3339()
        )));
    }
    Ok(())
}
