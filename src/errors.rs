use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: FieldErrors,
    },

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: FieldErrors) -> Self {
        AppError::Validation {
            message: "Invalid data provided".to_string(),
            details,
        }
    }

    // A single bad field: its message doubles as the top-level one.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), message.clone());
        AppError::Validation { message, details }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::BookingNotFound => "booking_not_found",
            AppError::ServiceNotFound => "service_not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Database(_) | AppError::Internal(_) => "server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BookingNotFound | AppError::ServiceNotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                serde_json::json!({
                    "error": self.kind(),
                    "message": "An unexpected error occurred",
                })
            }
            AppError::Validation { message, details } => serde_json::json!({
                "error": self.kind(),
                "message": message,
                "details": details,
            }),
            _ => serde_json::json!({
                "error": self.kind(),
                "message": self.to_string(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_carries_details() {
        let mut details = FieldErrors::new();
        details.insert("status".into(), "bad status".into());
        let res = AppError::validation(details).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let json = body_json(res).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "Invalid data provided");
        assert_eq!(json["details"]["status"], "bad status");
    }

    #[tokio::test]
    async fn test_single_field_error_uses_field_message() {
        let json = body_json(AppError::field("end", "Invalid end datetime").into_response()).await;
        assert_eq!(json["message"], "Invalid end datetime");
        assert_eq!(json["details"]["end"], "Invalid end datetime");
    }

    #[tokio::test]
    async fn test_server_error_is_sanitized() {
        let res = AppError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(res).await;
        assert_eq!(json["error"], "server_error");
        assert_eq!(json["message"], "An unexpected error occurred");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_403() {
        let res = AppError::Forbidden("nope".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let json = body_json(res).await;
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["message"], "nope");
    }
}
