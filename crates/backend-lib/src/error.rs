// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use exoplanet_common::{ErrorBody, UserId};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown identity or wrong password. Both cases look the same to callers.
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Endpoint needs a valid credential and none (or a bad one) was presented
    #[error("Authentication required")]
    AuthenticationRequired,

    /// A credential was presented on an optional-auth path but failed validation
    #[error("Invalid or expired authentication token")]
    AuthenticationRejected,

    /// Missing or weak signing configuration; fatal at startup
    #[error("Auth misconfigured: {0}")]
    MisconfiguredAuth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Too many failed login attempts")]
    AuthRateLimited,

    #[error("User with ID {0} not found")]
    UserNotFound(UserId),

    #[error("Email '{0}' is already registered")]
    EmailAlreadyExists(String),

    #[error("You are not authorized to access this {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored records could not be encoded or decoded
    #[error("Storage format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::AuthenticationRequired
            | AppError::AuthenticationRejected => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "AUTH_001",
            AppError::AuthenticationRequired => "AUTH_002",
            AppError::AuthenticationRejected => "AUTH_003",
            AppError::AuthRateLimited => "AUTH_004",
            AppError::MisconfiguredAuth(_) => "CFG_001",
            AppError::Config(_) => "CFG_002",
            AppError::UserNotFound(_) => "USER_001",
            AppError::EmailAlreadyExists(_) => "USER_002",
            AppError::Forbidden(_) => "USER_003",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// True for the variants answered with `401` and a bearer challenge
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "Incorrect email or password".to_string(),
            AppError::AuthenticationRequired => "Authentication required".to_string(),
            AppError::AuthenticationRejected => {
                "Invalid or expired authentication token".to_string()
            },
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::MisconfiguredAuth(_) | AppError::Config(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::UserNotFound(_) => "Resource not found".to_string(),
            AppError::EmailAlreadyExists(_) => "Email is already registered".to_string(),
            AppError::Forbidden(resource) => {
                format!("You are not authorized to access this {resource}")
            },
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::Io(_) => "Storage unavailable, please try again later".to_string(),
            AppError::Json(_) => "Stored data could not be processed".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Auth failures never carry detail. Everything else is detailed in debug builds only.
        let message = if cfg!(debug_assertions) && !self.is_unauthorized() {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        let body = ErrorBody::new(error_code, message);

        let mut response = (status, axum::Json(body)).into_response();
        if self.is_unauthorized() {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("worker task failed: {err}"))
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
