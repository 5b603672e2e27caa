//! Error Types for the Echoria portal
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct carrying a code and a user-facing message
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! The portal front-end shows error bodies verbatim, so responses are plain
//! text. Internal details are logged where the error is converted, never sent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use echoria_storage::{StorageError, SubmitError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LOGIN_REQUIRED_TEXT: &str = "❌ Авторизуйся через Discord.";
pub const DUPLICATE_VOTE_TEXT: &str = "❌ Ты уже голосовал в этой номинации.";
pub const NOT_A_MEMBER_TEXT: &str = "❌ Ты не находишься на сервере Echoria.";
pub const AUTH_FAILED_TEXT: &str = "❌ Ошибка авторизации.";
pub const ADMIN_ONLY_TEXT: &str = "⛔ Доступ только для администратора.";
const STORAGE_FAILED_TEXT: &str = "❌ Не удалось сохранить данные, попробуй позже.";

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// No valid session
    Unauthorized,

    /// Authenticated but not allowed (non-member, non-admin)
    Forbidden,

    // ========================================================================
    // Request Errors (400, 409)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// The voter already voted in this nomination
    DuplicateVote,

    // ========================================================================
    // Upstream Errors (502, 504)
    // ========================================================================
    /// Identity provider or chat platform call failed
    ExternalService,

    /// Operation timed out
    Timeout,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// A setting needed for this operation is not configured
    ConfigurationMissing,

    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateVote => StatusCode::CONFLICT,
            ErrorCode::ExternalService => StatusCode::BAD_GATEWAY,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::ConfigurationMissing
            | ErrorCode::InternalError
            | ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => LOGIN_REQUIRED_TEXT,
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::DuplicateVote => DUPLICATE_VOTE_TEXT,
            ErrorCode::ExternalService => "Upstream service failed",
            ErrorCode::Timeout => "Operation timed out",
            ErrorCode::ConfigurationMissing => "Required setting is not configured",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => STORAGE_FAILED_TEXT,
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Error returned by every portal handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// User-facing message, sent as the response body
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// No session cookie, or one that no longer resolves.
    pub fn login_required() -> Self {
        Self::unauthorized(LOGIN_REQUIRED_TEXT)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_a_member() -> Self {
        Self::forbidden(NOT_A_MEMBER_TEXT)
    }

    pub fn admin_only() -> Self {
        Self::forbidden(ADMIN_ONLY_TEXT)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::validation_failed(format!("Required field '{}' is missing", field))
    }

    pub fn duplicate_vote() -> Self {
        Self::from_code(ErrorCode::DuplicateVote)
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalService, message)
    }

    /// Identity provider failure, as shown to the user.
    pub fn auth_failed() -> Self {
        Self::external_service(AUTH_FAILED_TEXT)
    }

    /// Identity provider timeout. Same text as `auth_failed`, gateway timeout status.
    pub fn auth_timeout() -> Self {
        Self::new(ErrorCode::Timeout, AUTH_FAILED_TEXT)
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Operation '{}' timed out", operation),
        )
    }

    pub fn configuration_missing(setting: &str) -> Self {
        Self::new(
            ErrorCode::ConfigurationMissing,
            format!("{} is not configured", setting),
        )
    }

    pub fn invalid_setting(setting: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigurationMissing,
            format!("Invalid value for {}: {}", setting, reason),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), self.message).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Vote store error");
        match err {
            StorageError::Unavailable { .. } => {
                ApiError::service_unavailable("Vote store is unavailable")
            }
            StorageError::QueryFailed { .. } | StorageError::LockPoisoned => {
                ApiError::from_code(ErrorCode::DatabaseError)
            }
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(e) => ApiError::validation_failed(e.to_string()),
            SubmitError::Storage(e) => e.into(),
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::from_code(ErrorCode::DatabaseError)
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
