use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use carepoint_core::{
    Diagnosis, DiagnosisQuery, DiagnosisUpdate, NewDiagnosis, Principal, ReassessRequest,
    ReassessedDiagnosis,
};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/diagnoses",
    tag = "diagnoses",
    params(DiagnosisQuery),
    responses(
        (status = 200, description = "Matching diagnoses", body = [Diagnosis]),
        (status = 403, description = "Role may not read diagnoses", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn list_diagnoses(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(query): ApiQuery<DiagnosisQuery>,
) -> ApiResult<Json<Vec<Diagnosis>>> {
    Ok(Json(state.services.diagnoses.list(&principal, &query)?))
}

#[utoipa::path(
    post,
    path = "/diagnoses",
    tag = "diagnoses",
    request_body = NewDiagnosis,
    responses(
        (status = 201, description = "Diagnosis recorded with computed risk tiers", body = Diagnosis),
        (status = 400, description = "Symptom list missing, empty or malformed", body = api_shared::ErrorBody),
        (status = 403, description = "Caller is not a doctor", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown patient or appointment", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
/// Record a diagnosis. The symptoms are scored on the way in and only the resulting risk tier
/// is kept on each per-disease sub-record.
pub(crate) async fn create_diagnosis(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(new_diagnosis): ApiJson<NewDiagnosis>,
) -> ApiResult<(StatusCode, Json<Diagnosis>)> {
    let diagnosis = state.services.diagnoses.create(&principal, new_diagnosis)?;
    Ok((StatusCode::CREATED, Json(diagnosis)))
}

#[utoipa::path(
    get,
    path = "/diagnoses/{id}",
    tag = "diagnoses",
    params(("id" = Uuid, Path, description = "Diagnosis id")),
    responses(
        (status = 200, description = "Diagnosis", body = Diagnosis),
        (status = 404, description = "Unknown diagnosis", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn get_diagnosis(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Diagnosis>> {
    Ok(Json(state.services.diagnoses.get(&principal, id)?))
}

#[utoipa::path(
    put,
    path = "/diagnoses/{id}",
    tag = "diagnoses",
    params(("id" = Uuid, Path, description = "Diagnosis id")),
    request_body = DiagnosisUpdate,
    responses(
        (status = 200, description = "Updated diagnosis; risk tiers unchanged", body = Diagnosis),
        (status = 403, description = "Caller is not the authoring doctor", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown diagnosis", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn update_diagnosis(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<DiagnosisUpdate>,
) -> ApiResult<Json<Diagnosis>> {
    Ok(Json(state.services.diagnoses.update(&principal, id, update)?))
}

#[utoipa::path(
    post,
    path = "/diagnoses/{id}/reassess",
    tag = "diagnoses",
    params(("id" = Uuid, Path, description = "Diagnosis id")),
    request_body = ReassessRequest,
    responses(
        (status = 200, description = "Re-scored diagnosis and the full assessment", body = ReassessedDiagnosis),
        (status = 403, description = "Caller is not the authoring doctor", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown diagnosis", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn reassess_diagnosis(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ReassessRequest>,
) -> ApiResult<Json<ReassessedDiagnosis>> {
    Ok(Json(state.services.diagnoses.reassess(&principal, id, request)?))
}
