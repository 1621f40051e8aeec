// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, the seam between request
//! handling and the credential/token primitives.
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{AuthContext, PasswordVerdict};
use crate::error::AppError;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Hash a new password off the async executor
    async fn hash_password(&self, plain: String) -> Result<String, AppError>;

    /// Check a password against a stored hash off the async executor.
    ///
    /// `None` means the identity does not exist; the call still costs one
    /// full verification and reports a mismatch.
    async fn verify_password(
        &self,
        plain: String,
        stored_hash: Option<String>,
    ) -> Result<PasswordVerdict, AppError>;

    fn issue_token(&self, subject: &str, extra: Map<String, Value>) -> Result<String, AppError>;

    fn validate_token(&self, token: Option<&str>) -> AuthContext;

    fn token_lifetime(&self) -> chrono::Duration;
}
