//! Error types for GitLab client operations.
//!
//! This module defines the error types that can occur when interacting with the GitLab REST
//! API through the gitlab_client crate. Failures are classified by HTTP status so callers can
//! tell a missing project from an authorization problem or a transient server fault.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitLab client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use gitlab_client::Error;
///
/// match client.get_project("group/project", token).await {
///     Ok(project) => println!("Project id: {}", project.id),
///     Err(Error::NotFound) => eprintln!("No such project"),
///     Err(err) if err.is_retryable() => eprintln!("Transient failure: {}", err),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GitLab answered with a non-success status that has no more specific variant.
    ///
    /// The status is kept so callers can decide on their own handling, e.g. 5xx responses
    /// that were still failing after all retry attempts.
    #[error("GitLab API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The token was rejected (401) or lacks permission for the resource (403).
    ///
    /// Parameters: (status, message)
    #[error("Authentication failed with status {0}: {1}")]
    AuthError(u16, String),

    /// Error deserializing the response from GitLab.
    ///
    /// This may indicate an API version change or an unexpected response format.
    #[error("Failed to deserialize GitLab response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The client could not be constructed from the supplied settings.
    #[error("Invalid client configuration: {0}")]
    InvalidConfiguration(String),

    /// The requested resource was not found.
    ///
    /// GitLab also answers 404 for projects the token cannot see, so this can mean
    /// "not visible" as well as "does not exist".
    #[error("Resource not found")]
    NotFound,

    /// GitLab API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The request never produced an HTTP response (DNS, connect, TLS, timeout).
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl Error {
    /// Builds the error matching a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Error::AuthError(status, message),
            404 => Error::NotFound,
            429 => Error::RateLimitExceeded,
            _ => Error::ApiError { status, message },
        }
    }

    /// The HTTP status associated with this error, if GitLab sent one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::ApiError { status, .. } => Some(*status),
            Error::AuthError(status, _) => Some(*status),
            Error::NotFound => Some(404),
            Error::RateLimitExceeded => Some(429),
            Error::Deserialization(_) | Error::InvalidConfiguration(_) | Error::Transport(_) => {
                None
            }
        }
    }

    /// Whether a request failing with this error may succeed when repeated.
    ///
    /// Server errors and transport failures are retryable; client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Error::from_status(status.as_u16(), value.to_string()),
            None => Error::Transport(value.to_string()),
        }
    }
}
