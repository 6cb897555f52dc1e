//! API-key authentication middleware.
//!
//! Resolves the `x-api-key` header to a [`Principal`] and injects it into request extensions for
//! downstream handlers.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use api_shared::{extract_api_key, API_KEY_HEADER};
use carepoint_core::Principal;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub(crate) async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let api_key = extract_api_key(
        req.headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok()),
    )
    .ok_or(ApiError::Unauthorized)?;

    let principal: Principal = state.services.users.authenticate(api_key)?;
    tracing::debug!(user_id = %principal.user_id, role = %principal.role, path = %req.uri().path(), "request authenticated");

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
