use axum::extract::State;
use axum::{Extension, Json};

use carepoint_core::{Principal, SummaryReport};

use crate::error::ApiResult;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/reports/summary",
    tag = "reports",
    responses(
        (status = 200, description = "Counts across every collection", body = SummaryReport),
        (status = 403, description = "Caller is not an admin", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn summary_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<SummaryReport>> {
    Ok(Json(state.services.reports.summary(&principal)?))
}
