//! Input checks shared by the users, products and reviews modules.
//!
//! The checks return `Error::Validation` with a message naming the offending
//! field, so handlers can pass the error straight back to the client.

use crate::errors::{Error, Result};
use sea_orm::sea_query::LikeExpr;

/// Escape character used in substring search patterns.
const LIKE_ESCAPE: char = '\\';

/// Checks that `value` (trimmed) has between `min` and `max` characters.
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let length = value.trim().chars().count();
    if length < min {
        return Err(Error::validation(format!(
            "\"{field}\" length must be at least {min} characters long"
        )));
    }
    if length > max {
        return Err(Error::validation(format!(
            "\"{field}\" length must be less than or equal to {max} characters long"
        )));
    }
    Ok(())
}

/// Checks that `value` is finite and within `min..=max`.
pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(format!("\"{field}\" must be a number")));
    }
    if value < min || value > max {
        return Err(Error::validation(format!(
            "\"{field}\" must be between {min} and {max}"
        )));
    }
    Ok(())
}

/// Checks that `value` is finite and strictly positive.
pub fn check_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::validation(format!(
            "\"{field}\" must be greater than 0"
        )));
    }
    Ok(())
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain.
/// Surrounding whitespace is ignored, as stored emails are trimmed.
pub fn check_email(value: &str) -> Result<()> {
    let value = value.trim();
    check_length("email", value, 3, 100)?;
    let invalid = || Error::validation("\"email\" must be a valid email");
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}

/// Password policy: at least six characters, no whitespace, mixed case, and not
/// containing the word "password".
pub fn check_password(value: &str) -> Result<()> {
    if value.chars().count() < 6 {
        return Err(Error::validation(
            "\"password\" length must be at least 6 characters long",
        ));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::validation("\"password\" should not contain white spaces"));
    }
    if !value.chars().any(char::is_uppercase) {
        return Err(Error::validation(
            "\"password\" should contain at least 1 uppercase character",
        ));
    }
    if !value.chars().any(char::is_lowercase) {
        return Err(Error::validation(
            "\"password\" should contain at least 1 lowercase character",
        ));
    }
    if value.to_lowercase().contains("password") {
        return Err(Error::validation("\"password\" contains a forbidden word"));
    }
    Ok(())
}

/// `LIKE` pattern matching `needle` anywhere, with `%`, `_` and the escape
/// character taken literally.
#[must_use]
pub fn contains_literal(needle: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length_trims_and_bounds() {
        assert!(check_length("title", "abc", 3, 50).is_ok());
        assert!(check_length("title", "  ab  ", 3, 50).is_err());
        assert!(check_length("title", &"x".repeat(51), 3, 50).is_err());
    }

    #[test]
    fn test_check_range_rejects_non_finite() {
        assert!(check_range("rating", 0.0, 0.0, 5.0).is_ok());
        assert!(check_range("rating", 5.0, 0.0, 5.0).is_ok());
        assert!(check_range("rating", 5.1, 0.0, 5.0).is_err());
        assert!(check_range("rating", -0.1, 0.0, 5.0).is_err());
        assert!(check_range("rating", f64::NAN, 0.0, 5.0).is_err());
    }

    #[test]
    fn test_check_email() {
        assert!(check_email("john.doe@gmail.com").is_ok());
        assert!(check_email("admin@email.com").is_ok());
        assert!(check_email("no-at-sign.com").is_err());
        assert!(check_email("@example.com").is_err());
        assert!(check_email("john@localhost").is_err());
        assert!(check_email("john doe@example.com").is_err());
        assert!(check_email(" Alice@Example.COM ").is_ok());
        assert!(check_email("   ").is_err());
    }

    #[test]
    fn test_check_password_policy() {
        assert!(check_password("Aa12345678").is_ok());
        assert!(check_password("Aa1").is_err());
        assert!(check_password("aa12345678").is_err());
        assert!(check_password("AA12345678").is_err());
        assert!(check_password("Aa 12345678").is_err());
        assert!(check_password("MyPassword1").is_err());
    }
}
