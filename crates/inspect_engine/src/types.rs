use std::fmt;

/// Why a single URL inspection failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailureKind {
    InvalidUrl,
    Auth,
    HttpStatus(u16),
    RateLimited,
    Timeout,
    Network,
    MalformedResponse,
}

impl fmt::Display for CheckFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailureKind::InvalidUrl => write!(f, "invalid url"),
            CheckFailureKind::Auth => write!(f, "authentication failed"),
            CheckFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            CheckFailureKind::RateLimited => write!(f, "rate limited"),
            CheckFailureKind::Timeout => write!(f, "timeout"),
            CheckFailureKind::Network => write!(f, "network error"),
            CheckFailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CheckError {
    pub kind: CheckFailureKind,
    pub message: String,
}

impl CheckError {
    pub(crate) fn new(kind: CheckFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> CheckError {
    if err.is_timeout() {
        return CheckError::new(CheckFailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return CheckError::new(CheckFailureKind::InvalidUrl, err.to_string());
    }
    CheckError::new(CheckFailureKind::Network, err.to_string())
}
