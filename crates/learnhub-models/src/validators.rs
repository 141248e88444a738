//! Field format checks used from `#[validate(custom(...))]`.
//!
//! Each check mirrors a simple character-class pattern and is written out
//! by hand so the models stay free of a regex engine.

use std::borrow::Cow;

use chrono::{Datelike, Utc};
use validator::ValidationError;

pub const MIN_PASSING_YEAR: i64 = 1950;

fn fail(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn is_phone_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')')
}

/// 10 to 15 characters of digits, `+`, `-`, spaces and parentheses.
pub fn teacher_phone(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if (10..=15).contains(&len) && value.chars().all(is_phone_char) {
        Ok(())
    } else {
        Err(fail("phone", "Please provide a valid phone number"))
    }
}

/// Optional leading `+`, then 8 to 20 digits, spaces, dashes or parentheses.
pub fn staff_phone(value: &str) -> Result<(), ValidationError> {
    let rest = value.strip_prefix('+').unwrap_or(value);
    let len = rest.chars().count();
    if (8..=20).contains(&len) && rest.chars().all(|c| c != '+' && is_phone_char(c)) {
        Ok(())
    } else {
        Err(fail("phone", "Please provide a valid phone number"))
    }
}

/// Exactly 13 digits, no separators.
pub fn teacher_cnic(value: &str) -> Result<(), ValidationError> {
    if value.len() == 13 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(fail("cnic", "Please provide a valid 13-digit CNIC"))
    }
}

/// `#####-#######-#`.
pub fn staff_cnic(value: &str) -> Result<(), ValidationError> {
    let groups: Vec<&str> = value.split('-').collect();
    let valid = matches!(groups.as_slice(), [a, b, c]
        if a.len() == 5 && b.len() == 7 && c.len() == 1
            && groups.iter().all(|g| g.bytes().all(|b| b.is_ascii_digit())));
    if valid {
        Ok(())
    } else {
        Err(fail("cnic", "Please provide a valid CNIC"))
    }
}

pub fn validate_passing_year(value: i64) -> Result<(), ValidationError> {
    let current = i64::from(Utc::now().year());
    if (MIN_PASSING_YEAR..=current).contains(&value) {
        Ok(())
    } else {
        Err(fail(
            "year",
            "Passing year must be between 1950 and the current year",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_phone() {
        assert!(teacher_phone("+92 300 1234567").is_ok());
        assert!(teacher_phone("(042) 111-2222").is_ok());
        assert!(teacher_phone("12345").is_err());
        assert!(teacher_phone("0300-12345ab").is_err());
        assert!(teacher_phone("0300123456789012").is_err());
    }

    #[test]
    fn test_staff_phone() {
        assert!(staff_phone("+923001234567").is_ok());
        assert!(staff_phone("0300 1234").is_ok());
        assert!(staff_phone("+1234").is_err());
        assert!(staff_phone("++923001234567").is_err());
    }

    #[test]
    fn test_cnic_formats() {
        assert!(teacher_cnic("3520212345671").is_ok());
        assert!(teacher_cnic("35202-1234567-1").is_err());
        assert!(staff_cnic("35202-1234567-1").is_ok());
        assert!(staff_cnic("3520212345671").is_err());
        assert!(staff_cnic("35202-12345a7-1").is_err());
    }

    #[test]
    fn test_passing_year_bounds() {
        assert!(validate_passing_year(1950).is_ok());
        assert!(validate_passing_year(i64::from(Utc::now().year())).is_ok());
        assert!(validate_passing_year(1949).is_err());
        assert!(validate_passing_year(i64::from(Utc::now().year()) + 1).is_err());
    }
}
