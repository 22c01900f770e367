//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use farmhub_domain::error::FarmHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`FarmHubError`] to an HTTP response with appropriate status code.
///
/// Timeouts get the richer body built by the control handler; this mapping
/// only covers errors that carry no correlation context.
pub struct ApiError(FarmHubError);

impl From<FarmHubError> for ApiError {
    fn from(err: FarmHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            FarmHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            FarmHubError::UnknownTarget(err) => (StatusCode::NOT_FOUND, err.to_string()),
            FarmHubError::Timeout(err) => (StatusCode::REQUEST_TIMEOUT, err.to_string()),
            FarmHubError::Transport(err) => {
                tracing::error!(error = %err, "transport error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
