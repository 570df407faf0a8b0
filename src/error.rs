use thiserror::Error;

/// A hard constraint rejected the request before any prompt was built.
///
/// The display strings are the causes reported to the caller verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("No remaining budget available")]
    NoRemainingBudget,

    #[error("Invalid time slot")]
    InvalidTimeSlot,

    #[error("Invalid day number")]
    InvalidDay,
}

/// Main error type for the suggestion pipeline
#[derive(Error, Debug)]
pub enum VegaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VegaError>;

impl VegaError {
    /// Whether the orchestrator absorbs this error into an empty suggestion set.
    ///
    /// Constraint violations cross the pipeline boundary and configuration errors are fatal;
    /// everything that can go wrong talking to the backend or reading its reply degrades.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, VegaError::Config(_) | VegaError::Constraint(_))
    }

    /// Stable machine-readable code, logged alongside the message
    pub fn error_code(&self) -> &'static str {
        match self {
            VegaError::Config(_) => "CONFIG_ERROR",
            VegaError::Validation(_) => "VALIDATION_ERROR",
            VegaError::Constraint(_) => "CONSTRAINT_VIOLATION",
            VegaError::GenerationUnavailable(_) => "GENERATION_UNAVAILABLE",
            VegaError::Timeout(_) => "TIMEOUT_ERROR",
            VegaError::RateLimit { .. } => "RATE_LIMIT_ERROR",
        }
    }
}
