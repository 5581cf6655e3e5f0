//! Field-level checks shared by registration, admin user creation and
//! expense writes. Every breach maps to a `Validation` error.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 255 && EMAIL_RE.is_match(email)
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ApiError::Validation("invalid email".into()))
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if !(8..=40).contains(&len) {
        return Err(ApiError::Validation(
            "password must be between 8 and 40 characters".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_title(title: &str) -> Result<(), ApiError> {
    let len = title.chars().count();
    if !(1..=255).contains(&len) {
        return Err(ApiError::Validation(
            "title must be between 1 and 255 characters".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > 511 {
        return Err(ApiError::Validation(
            "description must be at most 511 characters".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    Ok(())
}
