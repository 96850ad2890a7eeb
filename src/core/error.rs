use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} is required")]
    Missing { field: String },

    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: String, value: String },

    #[error("{field} must be a finite number")]
    NonFinite { field: String },

    #[error("{field} {reason}")]
    OutOfRange { field: String, reason: String },

    #[error("{field} has unknown option {value:?}")]
    UnknownOption { field: String, value: String },
}

impl InputError {
    pub fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        InputError::OutOfRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Rejects `NaN` and infinities before they reach the arithmetic.
pub fn ensure_finite(field: &str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NonFinite {
            field: field.to_string(),
        })
    }
}
