use thiserror::Error;

/// Input that failed shape or range checks.
///
/// These are expected, recoverable conditions: callers surface them to the
/// client as-is and nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),

    #[error("price_range must be between 1 and 4, got {0}")]
    PriceRangeOutOfRange(i64),

    #[error("invalid email address `{0}`")]
    InvalidEmail(String),

    #[error("unknown moderation status `{0}`")]
    UnknownModerationStatus(String),

    /// Payload could not be decoded at all (bad JSON, unknown or read-only fields).
    #[error("malformed request: {0}")]
    Malformed(String),
}

/// Trim a required string field, rejecting absent or blank values.
pub(crate) fn required_text(
    value: Option<String>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Normalise an optional string: blank becomes `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
