use axum::Json;

use carepoint_assessment::{Assessment, AssessmentRequest, AssessmentService};

use crate::error::ApiResult;
use crate::extract::ApiJson;

#[utoipa::path(
    post,
    path = "/symptom-checker",
    tag = "symptom-checker",
    request_body = AssessmentRequest,
    responses(
        (status = 200, description = "Malaria and typhoid risk assessment", body = Assessment),
        (status = 400, description = "Symptom list missing, empty or malformed", body = api_shared::ErrorBody),
        (status = 401, description = "Missing or unknown API key", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
/// Score a symptom report against both diseases.
///
/// Stateless: nothing is stored. Any authenticated role may call it.
pub(crate) async fn check_symptoms(
    ApiJson(request): ApiJson<AssessmentRequest>,
) -> ApiResult<Json<Assessment>> {
    Ok(Json(AssessmentService::assess_request(request)?))
}
