// ================
// crates/common/src/lib.rs
// ================
//! Request and response bodies exchanged between the Exoplanet API server
//! and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric user identifier
pub type UserId = u64;

/// Token type reported alongside every access token
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Registration request
/// # Fields
/// * `name` - Display name (1-100 chars)
/// * `email` - Unique login identity
/// * `password` - Plain text password, hashed before it is stored
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    /// True when the update would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// OAuth2 password-flow login form (`username` carries the email)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the token in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            expires_in,
        }
    }
}

/// Pagination query for user listings
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "ListQuery::default_limit")]
    pub limit: usize,
}

impl ListQuery {
    /// Largest page a client may request
    pub const MAX_LIMIT: usize = 100;

    fn default_limit() -> usize {
        Self::MAX_LIMIT
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::MAX_LIMIT,
        }
    }
}

/// Error payload returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Stable machine-readable code plus a client-safe message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
