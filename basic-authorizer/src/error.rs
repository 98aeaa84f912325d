use authorizer_core::Effect;
use serde::Serialize;
use thiserror::Error;

pub const CHALLENGE_HEADER: (&str, &str) = ("WWW-Authenticate", "Basic");

/// How an invocation result is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No usable credential: ask the client to authenticate.
    Challenge,
    Forbidden,
    Permitted,
    Failure,
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Challenge => 401,
            Outcome::Forbidden => 403,
            Outcome::Permitted => 200,
            Outcome::Failure => 500,
        }
    }

    pub fn challenge(&self) -> Option<(&'static str, &'static str)> {
        matches!(self, Outcome::Challenge).then_some(CHALLENGE_HEADER)
    }
}

impl From<Effect> for Outcome {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Outcome::Permitted,
            Effect::Deny => Outcome::Forbidden,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppErrorKind {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("secret store unavailable: {0}")]
    StoreUnavailable(String),
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AppError {
    kind: AppErrorKind,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &AppErrorKind {
        &self.kind
    }

    pub fn outcome(&self) -> Outcome {
        match self.kind {
            AppErrorKind::Unauthorized => Outcome::Challenge,
            AppErrorKind::StoreUnavailable(_) => Outcome::Failure,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: match self.kind {
                AppErrorKind::Unauthorized => "unauthorized",
                AppErrorKind::StoreUnavailable(_) => "store_unavailable",
            },
            message: self.kind.to_string(),
            status: self.outcome().status(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub status: u16,
}

impl From<authorizer_core::Error> for AppError {
    fn from(value: authorizer_core::Error) -> Self {
        let kind = match value {
            authorizer_core::Error::Unauthorized => AppErrorKind::Unauthorized,
            authorizer_core::Error::StoreUnavailable(reason) => {
                AppErrorKind::StoreUnavailable(reason)
            }
        };
        AppError::new(kind)
    }
}
