// ============================
// crates/backend-lib/src/auth/extractor.rs
// ============================
//! Axum extractors that resolve the `Authorization` header to a stored user.
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use metrics::counter;
use tracing::debug;

use super::context::{optional_authenticated, require_authenticated, AuthContext, Rejection};
use super::token::extract_bearer_token;
use crate::error::AppError;
use crate::metrics as keys;
use crate::storage::{User, UserStore};
use crate::AppState;

/// Authenticated caller. Anything short of a valid token for an existing
/// user is a 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Optional caller. No credential means `None`; a bad credential is still a
/// 401 and is never treated as guest access.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// Classify the credential carried by a request
pub fn request_context<S>(parts: &Parts, state: &AppState<S>) -> AuthContext {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return AuthContext::Anonymous;
    };

    match header.to_str().ok().and_then(extract_bearer_token) {
        Some(token) => state.auth.validate_token(Some(token)),
        None => {
            debug!("authorization header is not a bearer credential");
            counter!(keys::TOKEN_REJECTED, "reason" => Rejection::Malformed.as_str()).increment(1);
            AuthContext::Rejected(Rejection::Malformed)
        },
    }
}

impl<S> FromRequestParts<Arc<AppState<S>>> for CurrentUser
where
    S: UserStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let claims = require_authenticated(request_context(parts, state))?;
        match state.users().resolve_subject(&claims).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!("token subject no longer exists");
                Err(AppError::AuthenticationRequired)
            },
        }
    }
}

impl<S> FromRequestParts<Arc<AppState<S>>> for MaybeUser
where
    S: UserStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(claims) = optional_authenticated(request_context(parts, state))? else {
            return Ok(MaybeUser(None));
        };
        match state.users().resolve_subject(&claims).await? {
            Some(user) => Ok(MaybeUser(Some(user))),
            None => {
                debug!("token subject no longer exists");
                Err(AppError::AuthenticationRejected)
            },
        }
    }
}
