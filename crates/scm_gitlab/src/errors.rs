//! Error types for the GitLab SCM adapter.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised by the adapter.
///
/// Unsupported or irrelevant webhook deliveries are not errors; the hook parser returns
/// `Ok(None)` for those. Only a delivery that cannot belong to GitLab at all is rejected.
#[derive(Error, Debug)]
pub enum Error {
    /// The delivery is structurally not a GitLab webhook (missing discriminating header).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Adapter configuration failed validation.
    #[error("Invalid configuration: {field} - {reason}")]
    Config { field: String, reason: String },

    /// A configuration file could not be read or parsed.
    #[error("Failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    /// A checkout URL did not match any supported form.
    #[error("Invalid checkout URL: {0}")]
    InvalidCheckoutUrl(String),

    /// A stored repository key is not of the form `hostname:repoId:branch[:rootDir]`.
    #[error("Invalid SCM URI: {0}")]
    InvalidScmUri(String),

    /// The repository lives on a different host than the one this adapter serves.
    #[error("Host mismatch: expected {expected}, found {actual}")]
    HostMismatch { expected: String, actual: String },

    /// A GitLab API call failed.
    #[error("GitLab request failed: {0}")]
    Client(#[from] gitlab_client::Error),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
