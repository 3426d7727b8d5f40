//! API error responses.
//!
//! Maps ledger errors onto HTTP status codes for axum handlers.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use chainseal::store::IndexError;
use chainseal::AppendError;

/// Error response type for axum handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The append pipeline rejected or failed the record.
    Append(AppendError),
    /// A chain read against the authoritative index failed.
    Index(IndexError),
}

impl From<AppendError> for ApiError {
    fn from(err: AppendError) -> Self {
        ApiError::Append(err)
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        ApiError::Index(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Append(err) => match err {
                AppendError::Validation(_) | AppendError::Encoding(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                AppendError::DuplicateMessageId { .. } => (StatusCode::CONFLICT, err.to_string()),
                AppendError::Index(_) | AppendError::StoreTimeout { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
                }
            },
            ApiError::Index(err) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("audit read failed: {err}"),
            ),
        };

        let payload = json!({
            "error": message
        });

        (status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err = ApiError::Append(AppendError::DuplicateMessageId {
            message_id: "msg-0001".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_timeout_maps_to_service_unavailable() {
        let err = ApiError::Append(AppendError::StoreTimeout { timeout_ms: 10 });
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_index_read_maps_to_service_unavailable() {
        let err = ApiError::Index(IndexError::Io(std::io::Error::other("index offline")));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
