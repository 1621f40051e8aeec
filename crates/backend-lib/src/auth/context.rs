// ============================
// crates/backend-lib/src/auth/context.rs
// ============================
//! Resolved identity of a request and the gates built on top of it.
use std::fmt;

use super::token::Claims;
use crate::error::AppError;

/// Why a presented token was not accepted. Logged, never sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidSignature,
    Malformed,
    Expired,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::InvalidSignature => "invalid-signature",
            Rejection::Malformed => "malformed",
            Rejection::Expired => "expired",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating whatever credential a request carried
#[derive(Debug, Clone, PartialEq)]
pub enum AuthContext {
    /// No credential was presented
    Anonymous,
    /// Valid, unexpired token
    Authenticated(Claims),
    /// A credential was presented and failed validation
    Rejected(Rejection),
}

impl AuthContext {
    /// Subject of an authenticated context
    pub fn subject(&self) -> Option<&str> {
        match self {
            AuthContext::Authenticated(claims) => Some(&claims.sub),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthContext::Anonymous)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AuthContext::Rejected(_))
    }
}

/// Gate for endpoints that need an identity.
///
/// Anonymous and rejected contexts both fail with `AuthenticationRequired`.
pub fn require_authenticated(context: AuthContext) -> Result<Claims, AppError> {
    match context {
        AuthContext::Authenticated(claims) => Ok(claims),
        AuthContext::Anonymous | AuthContext::Rejected(_) => Err(AppError::AuthenticationRequired),
    }
}

/// Gate for guest-friendly endpoints.
///
/// Anonymous yields `None`. A rejected credential is an error and is never
/// downgraded to guest access.
pub fn optional_authenticated(context: AuthContext) -> Result<Option<Claims>, AppError> {
    match context {
        AuthContext::Anonymous => Ok(None),
        AuthContext::Authenticated(claims) => Ok(Some(claims)),
        AuthContext::Rejected(_) => Err(AppError::AuthenticationRejected),
    }
}
