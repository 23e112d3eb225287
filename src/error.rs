//! Construction errors.
//!
//! Only misconfiguration is an error. Missing keys are reported through
//! `bool` returns, and invariant violations are bugs caught by
//! `check_invariants`.

use thiserror::Error;

/// Result type for constructors that validate their configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A configuration that cannot produce a well-formed structure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `epsilon` must lie strictly between 0 and 1.
    #[error("epsilon must be in (0, 1), got {0}")]
    EpsilonOutOfRange(f64),

    /// The promotion probability must lie strictly between 0 and 1.
    #[error("promotion probability must be in (0, 1), got {0}")]
    ProbabilityOutOfRange(f64),

    /// A structure needs at least one level below the sentinel's top.
    #[error("height must be positive")]
    ZeroHeight,

    /// Node link arrays are bounded.
    #[error("height {height} exceeds the maximum of {max}")]
    HeightTooLarge { height: usize, max: usize },
}
