//! Authentication forms and validation helpers.
//!
//! Validation is declarative via [`validator`]. A form reports one message at
//! a time, the first failing field in [`FIELD_ORDER`], so that the same
//! input always yields the same message.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

/// Maximum length of email and password inputs.
pub const MAX_CREDENTIAL_LEN: u64 = 255;

/// Display order of form fields, used to pick the first error to show.
pub const FIELD_ORDER: &[&str] = &[
    "email",
    "password",
    "confirm_password",
    "title",
    "description",
    "slug",
    "category",
];

/// Stricter shape check applied after the generic email validator.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,4}$").expect("email pattern is valid")
});

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Sign-in form. Serializes as the `POST /auth/signin` body.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginForm {
    #[validate(
        length(min = 1, message = "Email is required"),
        custom(function = "within_credential_len"),
        email(message = "Must be a valid email"),
        regex(path = *EMAIL_PATTERN, message = "The email should be like this test@example.com")
    )]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        custom(function = "within_credential_len")
    )]
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Reset-password form. Only `password` is sent to the server.
#[derive(Debug, Clone, Validate)]
pub struct ResetPasswordForm {
    #[validate(
        length(min = 1, message = "Password is required"),
        custom(function = "within_credential_len")
    )]
    pub password: String,
    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "Passwords must match")
    )]
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn new(password: impl Into<String>, confirm_password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn within_credential_len(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() as u64 > MAX_CREDENTIAL_LEN {
        let mut err = ValidationError::new("length");
        err.message = Some(Cow::Owned(format!(
            "Must be at most {MAX_CREDENTIAL_LEN} characters"
        )));
        return Err(err);
    }
    Ok(())
}

/// Validate `input`, mapping the first failure to [`CoreError::Validation`].
pub fn check<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(first_message(&errors)))
}

/// The message of the first failing field, in [`FIELD_ORDER`] and then by
/// field name for anything not listed there.
pub fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();

    for name in FIELD_ORDER {
        if let Some(list) = fields.get(*name) {
            if let Some(err) = list.first() {
                return render(name, err);
            }
        }
    }

    let mut rest: Vec<_> = fields.iter().collect();
    rest.sort_by(|a, b| a.0.cmp(b.0));
    rest.into_iter()
        .find_map(|(name, list)| list.first().map(|err| render(name, err)))
        .unwrap_or_else(|| "Invalid input".to_string())
}

fn render(field: &str, err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => format!("{field} is invalid"),
    }
}
