use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::models::TrackedItem;

/// Body returned by the creation endpoint: the detected price plus the
/// stored record.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackResponse {
    pub success: bool,
    pub message: String,
    pub price: f64,
    pub track: TrackedItem,
}

/// Body returned by the listing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackListResponse {
    pub tracks: Vec<TrackedItem>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            // Creation is the only caller that surfaces these; the scan
            // path records them in the run summary instead.
            AppError::Fetch(_) | AppError::Extract => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Extract => {
                "Could not extract price from the provided URL. Please make sure it's a valid product page."
                    .to_string()
            }
            AppError::Fetch(_) => {
                "Could not reach the provided URL. Please make sure it's a valid product page."
                    .to_string()
            }
            // Persistence and config details stay out of responses.
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("bad email".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound {
                resource: "item".into()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Extract.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Fetch(FetchError::Timeout(10)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = AppError::Internal("connection string leaked".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_extract_message_is_actionable() {
        assert!(AppError::Extract
            .public_message()
            .contains("valid product page"));
    }
}
