use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use carepoint_core::{
    Appointment, AppointmentQuery, AppointmentStatusUpdate, NewAppointment, Principal,
};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    params(AppointmentQuery),
    responses(
        (status = 200, description = "Appointments ordered by start time", body = [Appointment]),
        (status = 403, description = "Role may not view the schedule", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(query): ApiQuery<AppointmentQuery>,
) -> ApiResult<Json<Vec<Appointment>>> {
    Ok(Json(state.services.appointments.list(&principal, &query)?))
}

#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    request_body = NewAppointment,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Past slot, bad duration or not a doctor", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown patient or doctor", body = api_shared::ErrorBody),
        (status = 409, description = "Doctor or patient already booked in that slot", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn create_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(new_appointment): ApiJson<NewAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let appointment = state
        .services
        .appointments
        .create(&principal, new_appointment)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Unknown appointment", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn get_appointment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.services.appointments.get(&principal, id)?))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}/status",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = AppointmentStatusUpdate,
    responses(
        (status = 200, description = "Appointment with its new status", body = Appointment),
        (status = 404, description = "Unknown appointment", body = api_shared::ErrorBody),
        (status = 409, description = "Appointment is no longer scheduled", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<AppointmentStatusUpdate>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.services.appointments.update_status(
        &principal,
        id,
        update.status,
    )?))
}
