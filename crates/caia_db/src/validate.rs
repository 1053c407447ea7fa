//! Input validation applied before rows are written.

use chrono::{DateTime, Datelike, Utc};

use crate::error::{DbError, DbResult};

const MAX_SLUG_LEN: usize = 64;

/// Check a URL-safe slug: ASCII letters, digits and `-`, not starting
/// or ending with `-`. Case is preserved and significant.
pub fn slug(field: &str, value: &str) -> DbResult<()> {
    let valid_chars = value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-');

    if value.is_empty()
        || value.len() > MAX_SLUG_LEN
        || !valid_chars
        || value.starts_with('-')
        || value.ends_with('-')
    {
        return Err(DbError::invalid_data(format!(
            "{field} must be 1-{MAX_SLUG_LEN} ASCII letters, digits or '-': {value:?}"
        )));
    }
    Ok(())
}

/// Check that an email has a local part and a dotted domain.
pub fn email(value: &str) -> DbResult<()> {
    let ok = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !ok || value.chars().any(char::is_whitespace) {
        return Err(DbError::invalid_data(format!("invalid email: {value:?}")));
    }
    Ok(())
}

/// Check that a required text field is not blank.
pub fn non_empty(field: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::invalid_data(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Check that a timestamp stays within four-digit years, so its stored
/// text sorts and compares chronologically.
pub fn timestamp(field: &str, value: &DateTime<Utc>) -> DbResult<()> {
    if !(0..=9999).contains(&value.year()) {
        return Err(DbError::invalid_data(format!(
            "{field} is outside years 0000-9999: {value}"
        )));
    }
    Ok(())
}
