use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("cost base must be a finite number, got {0}")]
    NonFiniteCostBase(f64),
    #[error("cost-plus current price must be positive, got {0}")]
    NonPositiveCurrentPrice(f64),
    #[error("as-of month must be in range 1..=12, got {0}")]
    InvalidMonth(u32),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures surfaced by application services such as a price-update gateway.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApplicationError {
    /// Stable, log-friendly classification of the failure.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain_validation",
        }
    }
}
