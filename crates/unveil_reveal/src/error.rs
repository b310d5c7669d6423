//! Configuration errors
//!
//! Registration races (a view that has not rendered yet, an element attached
//! twice, an event for a released element) are expected during mount churn
//! and never surface as errors. Only invalid configuration does, at the
//! moment the configuration is built.

use thiserror::Error;
use unveil_core::{MarginParseError, RootMargin};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f32),

    #[error("{field} must not be negative, got {value}ms")]
    NegativeDelay { field: &'static str, value: i64 },

    #[error("{field} of {value}ms is too large")]
    DelayTooLarge { field: &'static str, value: i64 },

    #[error("root margin must be finite, got '{0}'")]
    NonFiniteMargin(RootMargin),

    #[error("invalid root margin: {0}")]
    RootMargin(#[from] MarginParseError),
}

/// Convert a signed millisecond delay into the unsigned form the scheduler uses
pub(crate) fn delay_ms(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeDelay { field, value });
    }
    u32::try_from(value).map_err(|_| ConfigError::DelayTooLarge { field, value })
}
