//! Error taxonomy for the synchronization engine.
//!
//! Everything the engine can surface to a caller is a [`SyncError`]. Failures of
//! best-effort steps (notifications, off-chain purge) never become one; they are
//! logged where they happen.

use serde::Serialize;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// Rejection of a caller-supplied record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown property: {0}")]
    UnknownField(String),

    #[error("Missing property: {0}")]
    MissingField(String),

    #[error("{message}: {path}")]
    Invalid { path: String, message: String },
}

impl ValidationError {
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden by upstream: {0}")]
    UpstreamForbidden(String),

    #[error("invalid response from upstream: {0}")]
    UpstreamBadGateway(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("on-chain error: {0}")]
    Chain(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// HTTP-equivalent status code of the error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::UpstreamForbidden(_) => 403,
            Self::UpstreamBadGateway(_) => 502,
            _ => 500,
        }
    }

    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validationFailed",
            Self::BadRequest(_) => "badRequest",
            Self::NotFound(_) => "notFound",
            Self::UpstreamForbidden(_) => "forbidden",
            Self::UpstreamBadGateway(_) => "badGatewayError",
            _ => "genericError",
        }
    }

    fn short(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation did not pass.",
            Self::BadRequest(_) => "Bad request.",
            Self::NotFound(_) => "Not found.",
            Self::UpstreamForbidden(_) => "Forbidden.",
            Self::UpstreamBadGateway(_) => "Bad gateway.",
            _ => "Something went wrong.",
        }
    }

    /// Plain representation handed to whatever transport sits in front of the engine.
    ///
    /// Internal failures do not leak their message.
    pub fn to_body(&self) -> ErrorBody {
        let long = match self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest(m)
            | Self::NotFound(m)
            | Self::UpstreamForbidden(m)
            | Self::UpstreamBadGateway(m) => m.clone(),
            _ => "Something went wrong. Please contact the administrator.".to_string(),
        };
        ErrorBody {
            status: self.status(),
            code: format!("#{}", self.code()),
            short: self.short().to_string(),
            long,
        }
    }
}

/// Serializable error body: `{status, code, short, long}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: String,
    pub short: String,
    pub long: String,
}
