use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error payload returned by every failing handler: a status code plus a
/// structured `{"error": ...}` body. Callers always get either a success
/// payload or one of these, never a bare status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_is_500() {
        let err = ApiError::internal("boom");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_is_404() {
        let err = ApiError::not_found("session pres_a");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "session pres_a");
    }
}
