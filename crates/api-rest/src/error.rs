//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}`. Internal details are logged
//! and replaced with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use api_shared::ErrorBody;
use carepoint_assessment::AssessmentError;
use carepoint_core::RecordError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "AUTH_REQUIRED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = match self {
            ApiError::Validation(detail)
            | ApiError::BadRequest(detail)
            | ApiError::Forbidden(detail)
            | ApiError::NotFound(detail)
            | ApiError::Conflict(detail) => detail,
            ApiError::Unauthorized => "A valid x-api-key header is required".to_string(),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                "An internal error occurred".to_string()
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::InvalidInput(msg) => ApiError::Validation(msg),
            RecordError::Assessment(err) => err.into(),
            RecordError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            RecordError::Conflict(msg) | RecordError::InvalidTransition(msg) => {
                ApiError::Conflict(msg)
            }
            RecordError::Forbidden(msg) => ApiError::Forbidden(msg),
            RecordError::Unauthenticated => ApiError::Unauthorized,
            RecordError::StorePoisoned
            | RecordError::SeedFileRead(_)
            | RecordError::SeedFileSchema { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AssessmentError> for ApiError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::Validation(msg) => ApiError::Validation(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn validation_returns_400_with_message() {
        let response = ApiError::from(AssessmentError::Validation("symptoms required".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "symptoms required");
    }

    #[tokio::test]
    async fn unauthenticated_returns_401() {
        let response = ApiError::from(RecordError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn not_found_names_the_record() {
        let id = Uuid::new_v4();
        let response = ApiError::from(RecordError::NotFound {
            kind: "patient",
            id,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"]["message"],
            format!("patient {id} not found")
        );
    }

    #[tokio::test]
    async fn invalid_transition_is_a_conflict() {
        let response =
            ApiError::from(RecordError::InvalidTransition("done".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::from(RecordError::StorePoisoned).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "An internal error occurred"
        );
    }

    #[tokio::test]
    async fn forbidden_returns_403() {
        let response =
            ApiError::from(RecordError::Forbidden("role 'nurse' may not x".into())).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
