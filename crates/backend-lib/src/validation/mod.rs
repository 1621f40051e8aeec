// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use std::sync::LazyLock;

use exoplanet_common::{UserCreate, UserUpdate};
use regex::Regex;
use thiserror::Error;

use crate::auth::validate_password_strength;
use crate::config::PasswordRequirements;
use crate::error::AppError;

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex compiles")
});

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Update contains no fields")]
    EmptyUpdate,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a display name, returning it trimmed
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Validate an email address, returning it trimmed and lowercased
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "email must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ValidationError::InvalidEmail("malformed address".to_string()));
    }
    Ok(email)
}

/// Validate a new password against the configured policy
pub fn validate_password(password: &str, requirements: &PasswordRequirements) -> ValidationResult<()> {
    if validate_password_strength(password, requirements) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPassword(describe_requirements(requirements)))
    }
}

fn describe_requirements(requirements: &PasswordRequirements) -> String {
    let mut rules = vec![format!(
        "{} to {} characters",
        requirements.min_length, requirements.max_length
    )];
    if requirements.require_uppercase {
        rules.push("an uppercase letter".to_string());
    }
    if requirements.require_lowercase {
        rules.push("a lowercase letter".to_string());
    }
    if requirements.require_digit {
        rules.push("a digit".to_string());
    }
    if requirements.require_special {
        rules.push("a special character".to_string());
    }
    format!("password must have {}", rules.join(", "))
}

/// Validate a registration request, normalizing name and email in place
pub fn validate_user_create(
    user: &mut UserCreate,
    requirements: &PasswordRequirements,
) -> ValidationResult<()> {
    user.name = validate_name(&user.name)?;
    user.email = validate_email(&user.email)?;
    validate_password(&user.password, requirements)
}

/// Validate a partial update, normalizing the fields that are present
pub fn validate_user_update(
    update: &mut UserUpdate,
    requirements: &PasswordRequirements,
) -> ValidationResult<()> {
    if update.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    if let Some(name) = update.name.take() {
        update.name = Some(validate_name(&name)?);
    }
    if let Some(email) = update.email.take() {
        update.email = Some(validate_email(&email)?);
    }
    if let Some(password) = &update.password {
        validate_password(password, requirements)?;
    }
    Ok(())
}
