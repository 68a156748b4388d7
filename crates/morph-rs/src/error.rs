//! Error taxonomy shared by the engine and the applications built on it.
//!
//! Runtime failures that a user should hear about ([`UpstreamError`],
//! [`FileIoError`], [`CredentialError`]) are turned into chat text by the
//! transition handlers. [`TransportError`] escapes the turn because there is
//! nobody left to tell. [`GraphError`] only happens while a graph is being
//! built.
//!
//! Unmatched input is not an error: the engine drops it silently.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the LLM gateway. Never retried by the exchange.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status returned by the gateway.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("LLM gateway HTTP {status}: {body}");
        match status {
            401 | 403 => Self::auth(message),
            429 => Self::rate_limit(message),
            500..=599 => Self::server_error(message),
            400..=499 => Self::invalid_request(message),
            _ => Self::unknown(message),
        }
    }
}

/// Coarse classification of an [`UpstreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// Connection failures, timeouts, unreadable bodies.
    Network,
    /// 401 / 403: bad or missing API key.
    Auth,
    /// 429: quota or rate limit.
    RateLimit,
    /// 5xx.
    ServerError,
    /// Other 4xx.
    InvalidRequest,
    Unknown,
}

/// Which filesystem operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Read,
    Write,
}

impl std::fmt::Display for FileOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOp::Read => write!(f, "read"),
            FileOp::Write => write!(f, "write"),
        }
    }
}

/// Read or write failure on a target file. The display text carries the
/// underlying I/O message so it can be shown to the user as-is.
#[derive(Debug, Error)]
#[error("failed to {op} '{}': {source}", path.display())]
pub struct FileIoError {
    pub op: FileOp,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FileIoError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            op: FileOp::Read,
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            op: FileOp::Write,
            path: path.into(),
            source,
        }
    }

    /// Whether the target simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::NotFound
    }
}

/// A reply could not be delivered to the user.
#[derive(Debug, Error)]
#[error("failed to deliver reply to session '{session_id}': {message}")]
pub struct TransportError {
    pub session_id: String,
    pub message: String,
}

/// Authentication through a [`CredentialProvider`](crate::credentials::CredentialProvider)
/// did not produce a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no credential provider is configured")]
    Unavailable,
    #[error("authentication failed: {0}")]
    Failed(String),
}

/// Defects in a state graph, detected while it is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge {from} -> {to} refers to unknown handler '{handler}'")]
    UnknownHandler {
        from: String,
        to: String,
        handler: String,
    },
    #[error("initial state '{0}' has no outgoing edges")]
    DeadInitialState(String),
    #[error("invalid pattern trigger '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Umbrella error returned by transition handlers and the session dispatcher.
#[derive(Debug, Error)]
pub enum MorphError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    FileIo(#[from] FileIoError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            UpstreamError::from_status(401, "").kind,
            UpstreamErrorKind::Auth
        );
        assert_eq!(
            UpstreamError::from_status(403, "").kind,
            UpstreamErrorKind::Auth
        );
        assert_eq!(
            UpstreamError::from_status(429, "").kind,
            UpstreamErrorKind::RateLimit
        );
        assert_eq!(
            UpstreamError::from_status(503, "").kind,
            UpstreamErrorKind::ServerError
        );
        assert_eq!(
            UpstreamError::from_status(400, "").kind,
            UpstreamErrorKind::InvalidRequest
        );
    }

    #[test]
    fn upstream_message_is_shown_verbatim() {
        let err = UpstreamError::from_status(401, "invalid api key");
        assert_eq!(err.to_string(), "LLM gateway HTTP 401: invalid api key");
    }

    #[test]
    fn file_io_error_carries_io_text() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let err = FileIoError::read("missing.rs", io);
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "failed to read 'missing.rs': No such file or directory"
        );
    }

    #[test]
    fn morph_error_is_transparent() {
        let err: MorphError = UpstreamError::auth("bad key").into();
        assert_eq!(err.to_string(), "bad key");
    }
}
