// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the Exoplanet Detection API: configuration,
//! authentication, the user store and the HTTP router.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod storage;
pub mod users;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthRateLimiter, AuthService, DefaultAuth};
use crate::config::Settings;
use crate::error::AppError;
use crate::storage::UserStore;
use crate::users::UserService;

pub use crate::router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Password hashing and token service
    pub auth: Arc<dyn AuthService>,
    /// Validated settings
    pub settings: Arc<Settings>,
    /// Identity store backend
    pub storage: S,
    /// Per-email login lockout
    pub login_limiter: Arc<AuthRateLimiter>,
}

impl<S: UserStore> AppState<S> {
    /// Create the application state, failing fast on invalid settings
    pub fn new(storage: S, settings: Settings) -> Result<Self, AppError> {
        settings.validate()?;
        let auth = Arc::new(DefaultAuth::new(&settings.auth)?);
        Ok(Self::with_auth(storage, settings, auth))
    }

    /// Create the application state around an existing auth service
    pub fn with_auth(storage: S, settings: Settings, auth: Arc<dyn AuthService>) -> Self {
        let login_limiter = Arc::new(AuthRateLimiter::from_settings(&settings.login_rate_limit));
        Self {
            auth,
            settings: Arc::new(settings),
            storage,
            login_limiter,
        }
    }

    /// User operations bound to this state
    pub fn users(&self) -> UserService<'_, S> {
        UserService::new(
            &self.storage,
            self.auth.as_ref(),
            &self.login_limiter,
            &self.settings.password_requirements,
        )
    }
}
