// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::auth::password::{MAX_LOG_N, MIN_LOG_N};
use crate::error::AppError;

/// Shortest signing secret accepted at startup, in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest access token lifetime accepted at startup (one year)
pub const MAX_TOKEN_LIFETIME_MINUTES: i64 = 365 * 24 * 60;

/// Prefix for environment overrides, e.g. `EXOPLANET_AUTH__SECRET_KEY`
pub const ENV_PREFIX: &str = "EXOPLANET_";

/// Default config file looked up by [`Settings::load`]
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub api: ApiSettings,
    pub password_requirements: PasswordRequirements,
    pub login_rate_limit: LoginRateLimitSettings,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines instead of human readable ones
    pub log_json: bool,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Where the identity store keeps its data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: PathBuf,
}

/// Token signing and password hashing parameters
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC signing secret. Must be at least [`MIN_SECRET_LENGTH`] bytes.
    pub secret_key: String,
    /// JWT algorithm name (`HS256`, `HS384` or `HS512`)
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    /// scrypt cost parameter, `N = 2^hash_log_n`
    pub hash_log_n: u8,
}

/// Route prefix and service banner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub prefix: String,
    pub project_name: String,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

/// Lockout applied to an identity after repeated failed logins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRateLimitSettings {
    pub max_attempts: u32,
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            api: ApiSettings::default(),
            password_requirements: PasswordRequirements::default(),
            login_rate_limit: LoginRateLimitSettings::default(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            hash_log_n: scrypt::Params::RECOMMENDED_LOG_N,
        }
    }
}

// Keeps the secret out of debug logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("hash_log_n", &self.hash_log_n)
            .finish()
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            prefix: "/api/v1".to_string(),
            project_name: "Exoplanet Detection API".to_string(),
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 100,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl Default for LoginRateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl AuthSettings {
    /// Parse the configured algorithm, accepting only HMAC variants
    pub fn jwt_algorithm(&self) -> Result<Algorithm, AppError> {
        let algorithm: Algorithm = self.algorithm.parse().map_err(|_| {
            AppError::MisconfiguredAuth(format!("unknown signing algorithm {}", self.algorithm))
        })?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => Err(AppError::MisconfiguredAuth(format!(
                "signing algorithm {other:?} needs a key pair, only HMAC is supported"
            ))),
        }
    }

    /// Token lifetime as a chrono duration
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(
            self.access_token_expire_minutes
                .clamp(0, MAX_TOKEN_LIFETIME_MINUTES),
        )
    }

    /// Check the secret, algorithm, lifetime and work factor
    pub fn validate(&self) -> Result<(), AppError> {
        if self.secret_key.is_empty() {
            return Err(AppError::MisconfiguredAuth(
                "auth.secret_key is not set".to_string(),
            ));
        }
        if self.secret_key.len() < MIN_SECRET_LENGTH {
            return Err(AppError::MisconfiguredAuth(format!(
                "auth.secret_key must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }
        self.jwt_algorithm()?;
        if !(1..=MAX_TOKEN_LIFETIME_MINUTES).contains(&self.access_token_expire_minutes) {
            return Err(AppError::MisconfiguredAuth(format!(
                "auth.access_token_expire_minutes must be between 1 and {MAX_TOKEN_LIFETIME_MINUTES}, got {}",
                self.access_token_expire_minutes
            )));
        }
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&self.hash_log_n) {
            return Err(AppError::MisconfiguredAuth(format!(
                "auth.hash_log_n must be between {MIN_LOG_N} and {MAX_LOG_N}, got {}",
                self.hash_log_n
            )));
        }
        Ok(())
    }
}

impl Settings {
    /// Load from `config.toml` in the working directory plus environment
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load defaults, then the given TOML file (if present), then `EXOPLANET_*` env vars
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let settings: Settings = Self::figment(path.as_ref())
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Provider chain used by [`Settings::load_from`]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), AppError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "invalid log level {}",
                self.log_level
            )));
        }
        if !self.api.prefix.starts_with('/') || self.api.prefix.ends_with('/') {
            return Err(AppError::Config(format!(
                "api.prefix must start with '/' and not end with one, got {}",
                self.api.prefix
            )));
        }
        let reqs = &self.password_requirements;
        if reqs.min_length < 8 || reqs.max_length < reqs.min_length {
            return Err(AppError::Config(
                "password_requirements: min_length must be >= 8 and <= max_length".to_string(),
            ));
        }
        if self.login_rate_limit.max_attempts == 0 {
            return Err(AppError::Config(
                "login_rate_limit.max_attempts must be positive".to_string(),
            ));
        }
        self.auth.validate()
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid bind address: {e}")))
    }
}
