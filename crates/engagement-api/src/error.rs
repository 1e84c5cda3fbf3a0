use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engagement_common::EngagementError;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps the shared error taxonomy onto the status codes names:
/// "400 validation, 401 unauth, 403 forbidden/visibility, 404 not found,
/// 409 conflict (capacity/uniqueness), 410 gone (closed vote), 422
/// semantic (e.g. dealbreaker violation)".
pub struct ApiError(pub EngagementError);

impl From<EngagementError> for ApiError {
    fn from(err: EngagementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngagementError::NotFound(_) => StatusCode::NOT_FOUND,
            EngagementError::Duplicate(_) | EngagementError::UniqueConstraint(_) => StatusCode::CONFLICT,
            EngagementError::VisibilityDenied => StatusCode::FORBIDDEN,
            EngagementError::CapacityExceeded | EngagementError::WaitlistDisabled => StatusCode::CONFLICT,
            EngagementError::ValuesMismatch(_) | EngagementError::Dealbreaker(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngagementError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            EngagementError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngagementError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngagementError::Validation(_) | EngagementError::Serialization(_) => StatusCode::BAD_REQUEST,
        };
        // VisibilityDenied carries no message by design (never
        // reveals whether a hidden resource exists).
        let message = self.0.to_string();
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// A 410 for a vote that's already closed, distinguished from the generic
/// 400 a bare `Validation` error would otherwise produce.
pub struct VoteClosed;

impl IntoResponse for VoteClosed {
    fn into_response(self) -> Response {
        (StatusCode::GONE, Json(ErrorBody { error: "vote is closed".to_string() })).into_response()
    }
}
