//! Credential Shape Validation
//!
//! Checks email and password shape before any store access, reporting
//! failures as a field-to-message mapping rather than a single string.
//! Both fields are always checked, so one response carries every
//! problem the caller must fix.

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::domain::value_object::email::Email;
use crate::error::FieldError;

/// Validate submitted credentials against the configured policy.
pub fn validate_credentials(
    raw_email: &str,
    raw_password: String,
    config: &AuthConfig,
) -> Result<(Email, ClearTextPassword), Vec<FieldError>> {
    let mut errors = Vec::new();

    let email = if raw_email.trim().len() > config.email_max_length {
        errors.push(FieldError::new(
            "email",
            format!("Email must not exceed {} characters", config.email_max_length),
        ));
        None
    } else {
        match Email::new(raw_email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(FieldError::new("email", e.to_string()));
                None
            }
        }
    };

    let password = match ClearTextPassword::new(raw_password, &config.password_policy) {
        Ok(password) => Some(password),
        Err(e) => {
            errors.push(FieldError::new("password", e.to_string()));
            None
        }
    };

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok((email, password)),
        _ => Err(errors),
    }
}
