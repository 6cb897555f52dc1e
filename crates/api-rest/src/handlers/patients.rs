use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use carepoint_core::{NewPatient, Patient, PatientUpdate, Principal};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct PatientSearch {
    /// Case-insensitive substring of the first or last name.
    search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    params(PatientSearch),
    responses(
        (status = 200, description = "Matching patients", body = [Patient])
    ),
    security(("api_key" = []))
)]
pub(crate) async fn list_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(query): ApiQuery<PatientSearch>,
) -> ApiResult<Json<Vec<Patient>>> {
    Ok(Json(
        state
            .services
            .patients
            .list(&principal, query.search.as_deref())?,
    ))
}

#[utoipa::path(
    post,
    path = "/patients",
    tag = "patients",
    request_body = NewPatient,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Blank name or future date of birth", body = api_shared::ErrorBody),
        (status = 403, description = "Role may not register patients", body = api_shared::ErrorBody),
        (status = 409, description = "National id already registered", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(new_patient): ApiJson<NewPatient>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let patient = state.services.patients.create(&principal, new_patient)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Unknown patient", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.services.patients.get(&principal, id)?))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    tag = "patients",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = PatientUpdate,
    responses(
        (status = 200, description = "Updated patient", body = Patient),
        (status = 400, description = "Invalid field", body = api_shared::ErrorBody),
        (status = 403, description = "Role may not edit patients", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown patient", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn update_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<PatientUpdate>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.services.patients.update(&principal, id, update)?))
}
