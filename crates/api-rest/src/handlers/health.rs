use axum::Json;

use api_shared::{HealthRes, HealthService};

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
///
/// Served without an API key for load balancers and monitoring.
pub(crate) async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}
