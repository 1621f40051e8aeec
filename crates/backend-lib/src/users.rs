// ============================
// crates/backend-lib/src/users.rs
// ============================
//! User registration, login and profile management.
use exoplanet_common::{TokenResponse, UserCreate, UserId, UserUpdate};
use metrics::counter;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::auth::{AuthRateLimiter, AuthService, Claims, PasswordVerdict};
use crate::config::PasswordRequirements;
use crate::error::AppError;
use crate::metrics as keys;
use crate::storage::{NewUser, User, UserStore};
use crate::validation;

/// Business logic over a user store. Cheap to build per request.
pub struct UserService<'a, S> {
    store: &'a S,
    auth: &'a dyn AuthService,
    limiter: &'a AuthRateLimiter,
    requirements: &'a PasswordRequirements,
}

impl<'a, S: UserStore> UserService<'a, S> {
    pub fn new(
        store: &'a S,
        auth: &'a dyn AuthService,
        limiter: &'a AuthRateLimiter,
        requirements: &'a PasswordRequirements,
    ) -> Self {
        Self {
            store,
            auth,
            limiter,
            requirements,
        }
    }

    /// Create a user with a hashed password
    #[instrument(skip_all)]
    pub async fn register(&self, mut request: UserCreate) -> Result<User, AppError> {
        validation::validate_user_create(&mut request, self.requirements)?;

        if self.store.get_by_email(&request.email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists(request.email));
        }

        let hashed_password = self
            .auth
            .hash_password(std::mem::take(&mut request.password))
            .await?;
        let user = self
            .store
            .insert(NewUser {
                name: request.name,
                email: request.email,
                hashed_password,
            })
            .await?;

        counter!(keys::USER_REGISTERED).increment(1);
        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// Unknown email, wrong password and a corrupted stored hash all end in
    /// `InvalidCredentials` after the same amount of hashing work.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, email: &str, password: String) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();
        if !self.limiter.check_rate_limit(&email) {
            counter!(keys::LOGIN_LOCKED_OUT).increment(1);
            return Err(AppError::AuthRateLimited);
        }

        let user = self.store.get_by_email(&email).await?;
        let stored_hash = user.as_ref().map(|u| u.hashed_password.clone());
        let verdict = self.auth.verify_password(password, stored_hash).await?;

        match (user, verdict) {
            (Some(user), PasswordVerdict::Match) => {
                self.limiter.record_success(&email);
                counter!(keys::LOGIN_SUCCESS).increment(1);
                info!(user_id = user.id, "login succeeded");
                Ok(user)
            },
            (user, verdict) => {
                if verdict == PasswordVerdict::MalformedHash {
                    warn!(
                        user_id = user.as_ref().map(|u| u.id),
                        "stored password hash is malformed"
                    );
                }
                self.limiter.record_failed_attempt(&email);
                counter!(keys::LOGIN_FAILURE).increment(1);
                Err(AppError::InvalidCredentials)
            },
        }
    }

    /// Authenticate and issue an access token (`sub` = email, `uid` = id)
    pub async fn login(&self, email: &str, password: String) -> Result<TokenResponse, AppError> {
        let user = self.authenticate(email, password).await?;

        let mut extra = Map::new();
        extra.insert("uid".to_string(), Value::from(user.id));
        let token = self.auth.issue_token(&user.email, extra)?;
        counter!(keys::TOKEN_ISSUED).increment(1);

        Ok(TokenResponse::bearer(
            token,
            self.auth.token_lifetime().num_seconds(),
        ))
    }

    /// Map validated token claims to the stored user, if it still exists
    pub async fn resolve_subject(&self, claims: &Claims) -> Result<Option<User>, AppError> {
        self.store.get_by_email(&claims.sub).await
    }

    pub async fn get(&self, id: UserId) -> Result<User, AppError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    pub async fn list(&self, skip: usize, limit: usize) -> Result<Vec<User>, AppError> {
        self.store.list(skip, limit).await
    }

    /// Apply a partial update, re-hashing the password when it changes
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: UserId, mut update: UserUpdate) -> Result<User, AppError> {
        validation::validate_user_update(&mut update, self.requirements)?;
        let mut user = self.get(id).await?;

        if let Some(email) = update.email {
            if email != user.email && self.store.get_by_email(&email).await?.is_some() {
                return Err(AppError::EmailAlreadyExists(email));
            }
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(password) = update.password {
            user.hashed_password = self.auth.hash_password(password).await?;
        }

        let user = self.store.update(user).await?;
        info!("user updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<(), AppError> {
        self.store.delete(id).await?;
        counter!(keys::USER_DELETED).increment(1);
        info!("user deleted");
        Ok(())
    }
}

/// Users may only act on their own record
pub fn ensure_owner(current: &User, target: UserId, resource: &str) -> Result<(), AppError> {
    if current.id == target {
        Ok(())
    } else {
        Err(AppError::Forbidden(resource.to_string()))
    }
}
