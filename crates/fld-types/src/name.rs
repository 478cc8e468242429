//! Field name and value rules.
//!
//! Valid field names:
//! - Must contain at least one non-whitespace character
//! - Must not contain control characters (tabs and line breaks included)
//! - Must not exceed the configured length, counted in characters
//!
//! Names are compared case-insensitively, so `Port` and `PORT` collide.

use crate::error::{FieldError, FieldResult};

/// Default upper bound on a field name's length, in characters.
pub const DEFAULT_MAX_NAME_LEN: usize = 100;

/// Validate a field name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use fld_types::name::{validate_name, DEFAULT_MAX_NAME_LEN};
///
/// assert!(validate_name("host", DEFAULT_MAX_NAME_LEN).is_ok());
/// assert!(validate_name("", DEFAULT_MAX_NAME_LEN).is_err());
/// assert!(validate_name("two\nlines", DEFAULT_MAX_NAME_LEN).is_err());
/// ```
pub fn validate_name(name: &str, max_len: usize) -> FieldResult<()> {
    if name.trim().is_empty() {
        return Err(FieldError::EmptyName);
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(FieldError::NonPrintableName {
            name: name.to_string(),
            ch,
        });
    }

    let len = name.chars().count();
    if len > max_len {
        return Err(FieldError::NameTooLong { len, max: max_len });
    }

    Ok(())
}

/// Validate a field value. Only blank values are rejected.
pub fn validate_value(name: &str, value: &str) -> FieldResult<()> {
    if value.trim().is_empty() {
        return Err(FieldError::EmptyValue {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Case-insensitive name comparison used for uniqueness checks.
pub fn names_match(a: &str, b: &str) -> bool {
    if a.len() == b.len() && a.eq_ignore_ascii_case(b) {
        return true;
    }
    // Non-ASCII names: compare Unicode lowercase forms.
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
