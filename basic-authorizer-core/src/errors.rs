use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the authorization engine.
///
/// `Deny` is not an error: a credential that parses but does not verify
/// produces a [`Decision`](crate::decision::Decision) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Missing or unparseable credential. Carries no detail on purpose.
    #[error("Unauthorized")]
    Unauthorized,
    /// The secret store could not answer.
    #[error("secret store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Faults raised at the secret store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid record for `{key}`: {reason}")]
    InvalidRecord { key: String, reason: String },
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        Error::StoreUnavailable(value.to_string())
    }
}
