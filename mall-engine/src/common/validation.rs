//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen as reasonable UX limits for names, remarks and
//! addresses; redb values have no built-in length enforcement.

use shared::{ApiError, ApiResult};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, recipient, carrier, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Remarks, descriptions, cancel reasons.
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, tracking number, specification values.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Address region parts and the detail line.
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(ApiError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: &Option<String>, field: &str, max_len: usize) -> ApiResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(ApiError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a phone number: optional leading `+`, then 5 to 15 digits.
pub fn validate_phone(value: &str, field: &str) -> ApiResult<()> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    if digits.is_empty()
        || !(5..=15).contains(&digits.len())
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ApiError::validation(format!(
            "{field} is not a valid phone number"
        )));
    }
    Ok(())
}
