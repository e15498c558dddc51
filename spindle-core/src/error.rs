//! Error types for configuration and record parsing.

use thiserror::Error;

/// A configuration that cannot drive a run.
///
/// Raised once, by [`crate::config::Config::validate`], before any random
/// draw or simulated tick happens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{name}` must be finite")]
    NotFinite { name: &'static str },

    #[error("`{name}` must be strictly positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("`{name}` must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("`alpha` must be zero (neighbor table) or positive (beta weighting), got {0}")]
    NegativeAlpha(f64),

    #[error("invalid beta shape (alpha = {alpha}, beta = {beta}): {reason}")]
    InvalidBetaShape { alpha: f64, beta: f64, reason: String },

    #[error("cannot sample the midzone edge from N({mu}, {sigma})")]
    MidzoneSampling { mu: f64, sigma: f64 },
}

/// A line that does not follow the `id time position event orientation` grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRecordError {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid `{field}` field: {text:?}")]
    InvalidField { field: &'static str, text: String },

    #[error("unknown event code {0}")]
    UnknownEvent(i32),
}
