//! Shared error type used across all Pryx core crates.
//!
//! Variants line up with the abstract error kinds of the error handling
//! design: each kind carries a short machine-readable discriminant (the
//! variant itself) and a human reason.

/// Errors produced by the Pryx core gateway.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("cancelled")]
    Cancelled,

    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The abstract kind name, for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidConfig(_) => "invalid_config",
            Error::ResourceExhausted(_) => "resource_exhausted",
            Error::ConstraintViolation(_) => "constraint_violation",
            Error::StorageFailure(_) => "storage_failure",
            Error::Cancelled => "cancelled",
            Error::UpstreamFailure(_) => "upstream_failure",
            Error::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
        assert_eq!(Error::Cancelled.kind(), "cancelled");
        assert_eq!(
            Error::ResourceExhausted("max sub-agents reached (10)".into()).kind(),
            "resource_exhausted"
        );
    }
}
