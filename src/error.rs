//! Error types shared across the crate.
//!
//! Library code returns [`UserPoolError`]; the command layer wraps it in
//! `anyhow` with additional context.

use thiserror::Error;

/// Result alias used by library code.
pub type Result<T, E = UserPoolError> = std::result::Result<T, E>;

/// An error reported by the Cognito API itself.
///
/// Code and message are preserved verbatim so failures can be surfaced to
/// the user exactly as the directory reported them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message} (status {status})")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the directory reported that the requested user does not exist.
    pub fn is_user_not_found(&self) -> bool {
        self.code == "UserNotFoundException"
    }
}

#[derive(Debug, Error)]
pub enum UserPoolError {
    /// Malformed input line. Fatal for the whole run.
    #[error("line {line}: {message}")]
    Decode { line: usize, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} name is ambiguous: {name}")]
    AmbiguousName { kind: &'static str, name: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Transport, timeout or configuration failure inside the AWS SDK.
    #[error("request to Cognito failed: {0}")]
    Sdk(String),

    #[error("failed to generate password: {0}")]
    Generation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A step of the per-user reconciliation failed.
    #[error("{step} for user {username}: {source}")]
    ApplyUser {
        username: String,
        step: &'static str,
        #[source]
        source: Box<UserPoolError>,
    },

    /// Attributes a per-record failure to its input line.
    #[error("line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: Box<UserPoolError>,
    },

    #[error(transparent)]
    Cache(#[from] crate::token_cache::CacheError),

    #[error("reconciliation task failed: {0}")]
    Task(String),
}

impl UserPoolError {
    pub(crate) fn step(username: &str, step: &'static str, source: Self) -> Self {
        Self::ApplyUser {
            username: username.to_string(),
            step,
            source: Box::new(source),
        }
    }

    pub(crate) fn at_line(line: usize, source: Self) -> Self {
        Self::Record {
            line,
            source: Box::new(source),
        }
    }

    /// The directory error underneath any context wrappers, if there is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::ApplyUser { source, .. } | Self::Record { source, .. } => source.api_error(),
            _ => None,
        }
    }
}
