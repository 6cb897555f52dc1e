use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use carepoint_core::{NewPrescription, Prescription, PrescriptionQuery, Principal};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/prescriptions",
    tag = "prescriptions",
    params(PrescriptionQuery),
    responses(
        (status = 200, description = "Matching prescriptions", body = [Prescription]),
        (status = 403, description = "Role may not read prescriptions", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn list_prescriptions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(query): ApiQuery<PrescriptionQuery>,
) -> ApiResult<Json<Vec<Prescription>>> {
    Ok(Json(state.services.prescriptions.list(&principal, &query)?))
}

#[utoipa::path(
    post,
    path = "/prescriptions",
    tag = "prescriptions",
    request_body = NewPrescription,
    responses(
        (status = 201, description = "Prescription written", body = Prescription),
        (status = 400, description = "Invalid medication list", body = api_shared::ErrorBody),
        (status = 403, description = "Caller is not a doctor", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown patient or diagnosis", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn create_prescription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(new_prescription): ApiJson<NewPrescription>,
) -> ApiResult<(StatusCode, Json<Prescription>)> {
    let prescription = state
        .services
        .prescriptions
        .create(&principal, new_prescription)?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

#[utoipa::path(
    get,
    path = "/prescriptions/{id}",
    tag = "prescriptions",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription", body = Prescription),
        (status = 404, description = "Unknown prescription", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn get_prescription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Prescription>> {
    Ok(Json(state.services.prescriptions.get(&principal, id)?))
}

#[utoipa::path(
    post,
    path = "/prescriptions/{id}/dispense",
    tag = "prescriptions",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription marked dispensed", body = Prescription),
        (status = 403, description = "Caller is not a pharmacist", body = api_shared::ErrorBody),
        (status = 409, description = "Prescription is not active", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn dispense_prescription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Prescription>> {
    Ok(Json(state.services.prescriptions.dispense(&principal, id)?))
}

#[utoipa::path(
    post,
    path = "/prescriptions/{id}/cancel",
    tag = "prescriptions",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription cancelled", body = Prescription),
        (status = 403, description = "Caller is not a doctor", body = api_shared::ErrorBody),
        (status = 409, description = "Prescription is not active", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn cancel_prescription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Prescription>> {
    Ok(Json(state.services.prescriptions.cancel(&principal, id)?))
}
