use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use uuid::Uuid;

use crate::models::QuotaStatus;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// Rejection payload for exhausted quotas (HTTP 402)
#[derive(Serialize)]
struct QuotaExceededResponse {
    error: &'static str,
    remaining: i64,
    #[serde(rename = "usagePercent")]
    usage_percent: f64,
    #[serde(rename = "limitReached")]
    limit_reached: bool,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// No usage row exists for the user. A data-integrity error, never
    /// silently treated as zero usage.
    #[error("User {0} has no usage row (not provisioned)")]
    NotProvisioned(Uuid),

    /// The usage store could not be reached or timed out. Callers at the
    /// billing boundary must fail closed on this.
    #[error("Usage store unavailable: {0}")]
    StoreUnavailable(String),

    /// The expected "no" answer from a quota check: a decision, not a
    /// failure. Rendered as a structured 402 rejection.
    #[error("Quota exceeded")]
    QuotaExceeded(QuotaStatus),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::QuotaExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotProvisioned(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Quota rejections carry enough data to render an upgrade prompt
        if let AppError::QuotaExceeded(status) = self {
            return HttpResponse::PaymentRequired().json(QuotaExceededResponse {
                error: "Quota Exceeded",
                remaining: status.remaining,
                usage_percent: status.usage_percent,
                limit_reached: true,
            });
        }

        let error_type = match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict(_) => "Conflict",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::QuotaExceeded(_) => unreachable!(),
            AppError::StoreUnavailable(_) => "QuotaUnavailable",
            AppError::NotProvisioned(_) => "NotProvisioned",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        };

        let response = ErrorResponse {
            error: ErrorDetail {
                error_type: error_type.to_string(),
                message: self.to_string(),
            },
        };

        HttpResponse::build(self.status_code()).json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
