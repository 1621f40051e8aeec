// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed access tokens (JWT, HMAC).
//!
//! Tokens are stateless: nothing is stored server side and a token stays
//! valid until its `exp`.
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::{AuthContext, Rejection};
use crate::config::AuthSettings;
use crate::error::AppError;
use crate::metrics as keys;

/// Claim names owned by the token service; extras may not override them
pub const RESERVED_CLAIMS: [&str; 7] = ["sub", "iat", "exp", "jti", "nbf", "aud", "iss"];

/// Claim set carried by every access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity reference (the user's email)
    pub sub: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    /// Caller supplied claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Issues and validates access tokens with a fixed secret, algorithm and lifetime
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: chrono::Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build from settings. Fails with `MisconfiguredAuth` on a weak secret.
    pub fn new(settings: &AuthSettings) -> Result<Self, AppError> {
        settings.validate()?;
        let algorithm = settings.jwt_algorithm()?;

        // Expiry is checked by hand so that signature problems are reported first
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(settings.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret_key.as_bytes()),
            validation,
            lifetime: settings.token_lifetime(),
        })
    }

    /// Configured token lifetime
    pub fn lifetime(&self) -> chrono::Duration {
        self.lifetime
    }

    /// Issue a token for `subject` with the configured lifetime
    pub fn issue(&self, subject: &str, extra: Map<String, Value>) -> Result<String, AppError> {
        self.issue_with_lifetime(subject, extra, self.lifetime)
    }

    /// Issue a token with an explicit lifetime (zero or negative yields an already expired token)
    pub fn issue_with_lifetime(
        &self,
        subject: &str,
        extra: Map<String, Value>,
        lifetime: chrono::Duration,
    ) -> Result<String, AppError> {
        if subject.is_empty() {
            return Err(AppError::InvalidInput("token subject must not be empty".to_string()));
        }
        if let Some(key) = extra.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
            return Err(AppError::InvalidInput(format!(
                "claim {key} is reserved"
            )));
        }

        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(lifetime.num_seconds()),
            jti: uuid::Uuid::new_v4().to_string(),
            extra,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Validate a presented token, or the absence of one
    pub fn validate(&self, token: Option<&str>) -> AuthContext {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate against an explicit clock reading (unix seconds)
    pub fn validate_at(&self, token: Option<&str>, now: i64) -> AuthContext {
        let Some(token) = token else {
            return AuthContext::Anonymous;
        };

        let context = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if data.claims.sub.is_empty() => AuthContext::Rejected(Rejection::Malformed),
            Ok(data) if now >= data.claims.exp => AuthContext::Rejected(Rejection::Expired),
            Ok(data) => AuthContext::Authenticated(data.claims),
            Err(err) => AuthContext::Rejected(match err.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    Rejection::InvalidSignature
                },
                _ => Rejection::Malformed,
            }),
        };

        if let AuthContext::Rejected(reason) = &context {
            tracing::debug!(reason = %reason, "access token rejected");
            counter!(keys::TOKEN_REJECTED, "reason" => reason.as_str()).increment(1);
        }
        context
    }
}

/// Extract token from an `Authorization` header value.
///
/// `None` when the value is not a non-empty `Bearer` credential.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
