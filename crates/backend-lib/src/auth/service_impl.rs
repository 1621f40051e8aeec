use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use zeroize::Zeroize;

use crate::auth::{AuthContext, AuthService, CredentialHasher, PasswordVerdict, TokenService};
use crate::config::AuthSettings;
use crate::error::AppError;

/// Scrypt hashing on the blocking pool plus HMAC-signed JWTs
#[derive(Clone, Debug)]
pub struct DefaultAuth {
    hasher: Arc<CredentialHasher>,
    tokens: TokenService,
}

impl DefaultAuth {
    /// Build from settings, failing fast on a missing or weak secret
    pub fn new(settings: &AuthSettings) -> Result<Self, AppError> {
        let tokens = TokenService::new(settings)?;
        let hasher = CredentialHasher::new(settings.hash_log_n)?;
        Ok(Self::from_parts(hasher, tokens))
    }

    pub fn from_parts(hasher: CredentialHasher, tokens: TokenService) -> Self {
        Self {
            hasher: Arc::new(hasher),
            tokens,
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn hash_password(&self, mut plain: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash_and_zeroize(&mut plain)).await?
    }

    async fn verify_password(
        &self,
        mut plain: String,
        stored_hash: Option<String>,
    ) -> Result<PasswordVerdict, AppError> {
        let hasher = self.hasher.clone();
        let verdict = tokio::task::spawn_blocking(move || {
            let verdict = match stored_hash {
                Some(hash) => hasher.verify(&plain, &hash),
                None => {
                    hasher.verify_decoy(&plain);
                    PasswordVerdict::Mismatch
                },
            };
            plain.zeroize();
            verdict
        })
        .await?;
        Ok(verdict)
    }

    fn issue_token(&self, subject: &str, extra: Map<String, Value>) -> Result<String, AppError> {
        self.tokens.issue(subject, extra)
    }

    fn validate_token(&self, token: Option<&str>) -> AuthContext {
        self.tokens.validate(token)
    }

    fn token_lifetime(&self) -> chrono::Duration {
        self.tokens.lifetime()
    }
}
