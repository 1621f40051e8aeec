// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
//!
//! Password hashing, access token issuance/validation, and the gates that
//! turn a request's credential into an identity.

pub mod context;
pub mod extractor;
pub mod password;
pub mod rate_limit;
mod service;
mod service_impl;
pub mod token;

pub use context::{optional_authenticated, require_authenticated, AuthContext, Rejection};
pub use extractor::{CurrentUser, MaybeUser};
pub use password::{validate_password_strength, CredentialHasher, PasswordVerdict};
pub use rate_limit::AuthRateLimiter;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{extract_bearer_token, Claims, TokenService};
