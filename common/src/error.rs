use thiserror::Error;

/// Failures raised by the lifecycle and authorization rules.
///
/// Each variant corresponds to one class of HTTP response at the transport
/// boundary; nothing here is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// Malformed input (empty name, unparseable date, bad JSON).
    #[error("{0}")]
    Validation(String),
    /// Unknown id, or an id whose item is in the wrong state for the operation.
    #[error("{0}")]
    NotFound(String),
    /// The admin secret was required and missing or wrong.
    #[error("{0}")]
    Authorization(String),
    /// The server has no admin secret configured. Fatal to the operation only.
    #[error("{0}")]
    Configuration(String),
}

impl TrackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TrackerError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        TrackerError::NotFound(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound(_))
    }
}
