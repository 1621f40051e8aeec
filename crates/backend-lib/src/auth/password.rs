// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Hashes are PHC strings (`$scrypt$ln=..,r=..,p=..$salt$digest`), so the
//! cost parameters travel with the hash and verification needs nothing else.
use scrypt::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Params, Scrypt,
};
use zeroize::Zeroize;

use crate::config::PasswordRequirements;
use crate::error::AppError;

const SCRYPT_ALG_ID: &str = "scrypt";

/// Accepted range for the scrypt work factor `log2(N)`, both when hashing
/// and when reading a stored hash
pub const MIN_LOG_N: u8 = 10;
pub const MAX_LOG_N: u8 = 20;

/// Upper bounds for the block size and parallelism read from stored hashes
const MAX_R: u32 = 32;
const MAX_P: u32 = 16;

/// Outcome of checking a password against a stored hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordVerdict {
    Match,
    Mismatch,
    /// The stored hash could not be parsed or uses another scheme
    MalformedHash,
}

impl PasswordVerdict {
    pub fn is_match(self) -> bool {
        self == PasswordVerdict::Match
    }
}

/// scrypt hasher bound to a configured work factor
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    /// Hash of a random throwaway password, verified whenever there is no
    /// real hash to check so failures cost the same as a mismatch.
    decoy_hash: String,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("log_n", &self.params.log_n())
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// Create a hasher with `N = 2^log_n` and the recommended `r`/`p`
    pub fn new(log_n: u8) -> Result<Self, AppError> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&log_n) {
            return Err(AppError::MisconfiguredAuth(format!(
                "scrypt log_n must be between {MIN_LOG_N} and {MAX_LOG_N}, got {log_n}"
            )));
        }
        let params = Params::new(
            log_n,
            Params::RECOMMENDED_R,
            Params::RECOMMENDED_P,
            Params::RECOMMENDED_LEN,
        )
        .map_err(|e| AppError::MisconfiguredAuth(format!("invalid scrypt parameters: {e}")))?;

        let decoy_hash = Self::hash_with(params, uuid::Uuid::new_v4().to_string().as_bytes())?;
        Ok(Self { params, decoy_hash })
    }

    /// Hash a password using scrypt with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        if plain.is_empty() {
            return Err(AppError::InvalidInput("password must not be empty".to_string()));
        }
        Self::hash_with(self.params, plain.as_bytes())
    }

    /// Hash a password and wipe the plaintext buffer afterwards
    pub fn hash_and_zeroize(&self, plain: &mut String) -> Result<String, AppError> {
        let hash = self.hash(plain);
        plain.zeroize();
        hash
    }

    /// Verify a password against a stored hash.
    ///
    /// Never fails: a corrupted hash yields [`PasswordVerdict::MalformedHash`]
    /// after doing the same amount of work as a real comparison.
    pub fn verify(&self, plain: &str, stored_hash: &str) -> PasswordVerdict {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) if parsed.algorithm.as_str() == SCRYPT_ALG_ID => parsed,
            _ => {
                self.verify_decoy(plain);
                return PasswordVerdict::MalformedHash;
            },
        };

        // Cost parameters come from storage; out-of-range values could make
        // verification allocate without bound
        let params_in_range = Params::try_from(&parsed).is_ok_and(|params| {
            (MIN_LOG_N..=MAX_LOG_N).contains(&params.log_n())
                && params.r() <= MAX_R
                && params.p() <= MAX_P
        });
        if !params_in_range {
            tracing::warn!("stored password hash has out-of-range scrypt parameters");
            self.verify_decoy(plain);
            return PasswordVerdict::MalformedHash;
        }

        match Scrypt.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => PasswordVerdict::Match,
            Err(password_hash::Error::Password) => PasswordVerdict::Mismatch,
            // Unparseable params or output: nothing was hashed yet
            Err(_) => {
                self.verify_decoy(plain);
                PasswordVerdict::MalformedHash
            },
        }
    }

    /// Burn one verification worth of CPU. Always false.
    pub fn verify_decoy(&self, plain: &str) -> bool {
        match PasswordHash::new(&self.decoy_hash) {
            Ok(parsed) => {
                let _ = Scrypt.verify_password(plain.as_bytes(), &parsed);
            },
            Err(_) => tracing::error!("decoy password hash failed to parse"),
        }
        false
    }

    fn hash_with(params: Params, plain: &[u8]) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain, None, None, params, &salt)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?
            .to_string();
        Ok(hash)
    }
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    let length = password.chars().count();
    if length < requirements.min_length || length > requirements.max_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}
