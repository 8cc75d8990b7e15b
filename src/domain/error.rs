use thiserror::Error;

/// Errors raised by the closed-form models.
///
/// Every variant is fatal for the computation that raised it. Advisory
/// conditions (a wetland stage exceeding the COD limit) are logged instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Argument '{argument}' must be an ordered sequence, got a scalar")]
    InvalidArgumentType { argument: &'static str },

    #[error("Conversion factor {value:.4} outside feasible range [{min}, {max}]")]
    ConversionFactorOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Non-physical input: {0}")]
    NonPhysicalGeometry(String),

    #[error("Series length mismatch: left={left}, right={right}")]
    SeriesLengthMismatch { left: usize, right: usize },

    #[error("Empty series provided for '{0}'")]
    EmptySeries(&'static str),

    #[error("Column '{0}' missing from one or more samples")]
    MissingColumn(&'static str),
}

impl ModelError {
    pub(crate) fn non_physical(what: impl Into<String>) -> Self {
        ModelError::NonPhysicalGeometry(what.into())
    }
}

/// Convenience alias for model results.
pub type ModelResult<T> = Result<T, ModelError>;

/// Reject non-finite or non-positive values.
pub(crate) fn require_positive(name: &str, value: f64) -> ModelResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::non_physical(format!(
            "{name} must be a finite positive number, got {value}"
        )))
    }
}

/// Reject values outside the closed unit interval.
pub(crate) fn require_fraction(name: &str, value: f64) -> ModelResult<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ModelError::non_physical(format!(
            "{name} must be a fraction in [0, 1], got {value}"
        )))
    }
}
