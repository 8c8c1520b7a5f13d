//! Core error types.
//!
//! Every scoring and evaluation operation reports failures through
//! [`AdvisorError`] so collaborators can match on the kind instead of
//! parsing messages.

use thiserror::Error;

/// Errors raised by the scoring, ranking, explanation and evaluation code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdvisorError {
    /// A numeric field is out of range or not finite.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two sequences that must be paired element-wise differ in length.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

impl AdvisorError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AdvisorError::InvalidInput(msg.into())
    }
}

/// Shorthand for results produced by the core.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Reject NaN and infinities for a named field.
pub(crate) fn ensure_finite(name: &str, value: f64) -> AdvisorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AdvisorError::invalid(format!("{name} must be finite, got {value}")))
    }
}

/// Reject negative or non-finite values for a named field.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> AdvisorResult<()> {
    ensure_finite(name, value)?;
    if value < 0.0 {
        return Err(AdvisorError::invalid(format!(
            "{name} cannot be negative, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_is_rejected() {
        assert!(ensure_finite("gpa", f64::NAN).is_err());
        assert!(ensure_finite("gpa", f64::INFINITY).is_err());
        assert!(ensure_finite("gpa", 3.2).is_ok());
    }

    #[test]
    fn negative_is_rejected() {
        let err = ensure_non_negative("budget", -1.0).unwrap_err();
        assert!(err.to_string().contains("budget cannot be negative"));
        assert!(ensure_non_negative("budget", 0.0).is_ok());
    }

    #[test]
    fn length_mismatch_message() {
        let err = AdvisorError::LengthMismatch { left: 3, right: 4 };
        assert_eq!(err.to_string(), "length mismatch: 3 vs 4");
    }
}
