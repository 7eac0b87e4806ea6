use thiserror::Error;

/// Why the closed-loop runner stopped before settling.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    #[error("shutdown requested")]
    Shutdown,
    #[error("cycle budget exhausted")]
    CycleBudget,
}

#[derive(Debug, Error, Clone)]
pub enum ControlError {
    #[error("perception error: {0}")]
    Perception(String),
    #[error("drive error: {0}")]
    Drive(String),
    #[error("drive rejected command: {0}")]
    DriveFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("aborted: {0}")]
    Abort(AbortReason),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("cycle length must be finite and > 0")]
    NonPositiveCycle,
    #[error("natural frequency must be finite and > 0")]
    NonPositiveNaturalFrequency,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
