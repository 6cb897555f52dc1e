use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use carepoint_core::{NewUser, Principal, UserProfile, UserUpdate};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All staff accounts", body = [UserProfile]),
        (status = 403, description = "Caller is not an admin", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    Ok(Json(state.services.users.list(&principal)?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Invalid name, email or API key", body = api_shared::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = api_shared::ErrorBody),
        (status = 409, description = "Email or API key already registered", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let user = state.services.users.create(&principal, new_user)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The caller's own account", body = UserProfile)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn current_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.services.users.get(&principal, principal.user_id)?))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account", body = UserProfile),
        (status = 403, description = "Non-admins may only read themselves", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown user", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.services.users.get(&principal, id)?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated account", body = UserProfile),
        (status = 403, description = "Caller is not an admin", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown user", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.services.users.update(&principal, id, update)?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Deactivated account", body = UserProfile),
        (status = 403, description = "Caller is not an admin", body = api_shared::ErrorBody),
        (status = 404, description = "Unknown user", body = api_shared::ErrorBody)
    ),
    security(("api_key" = []))
)]
/// Deactivate an account. Records keep referring to it, so it is never removed.
pub(crate) async fn deactivate_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.services.users.deactivate(&principal, id)?))
}
