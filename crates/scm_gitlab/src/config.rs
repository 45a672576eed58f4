//! Adapter configuration.
//!
//! The configuration is immutable once the adapter is built. It is usually loaded from a
//! TOML file:
//!
//! ```toml
//! hostname = "gitlab.example.com"
//! username = "ci-bot"
//! email = "ci-bot@example.com"
//!
//! [read_only]
//! enabled = true
//! username = "readonly-bot"
//! access_token = "glpat-..."
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use gitlab_client::RetryPolicy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{Error, Result};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

pub const DEFAULT_HOSTNAME: &str = "gitlab.com";
pub const DEFAULT_USERNAME: &str = "sd-buildbot";
pub const DEFAULT_EMAIL: &str = "dev-null@screwdriver.cd";
pub const DEFAULT_STATUS_CONTEXT: &str = "Screwdriver";

/// Transport used to clone with the read-only identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneType {
    #[default]
    Https,
    Ssh,
}

/// Read-only service identity used for clones instead of the build's own credentials.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadOnlyConfig {
    pub enabled: bool,
    pub username: Option<String>,
    pub access_token: Option<SecretString>,
    pub clone_type: CloneType,
}

/// REST retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: gitlab_client::DEFAULT_MAX_ATTEMPTS,
            delay_ms: gitlab_client::DEFAULT_RETRY_DELAY.as_millis() as u64,
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(value: RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: value.max_attempts,
            delay: Duration::from_millis(value.delay_ms),
        }
    }
}

/// Construction options for [`crate::GitlabScm`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScmConfig {
    /// GitLab host, without scheme or path (e.g. "gitlab.example.com")
    pub hostname: String,

    /// Whether the REST API is reached over https
    pub https: bool,

    /// Git identity used when checking out code
    pub username: String,
    pub email: String,

    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<SecretString>,

    pub read_only: ReadOnlyConfig,

    /// Prefix for commit status names
    pub status_context: String,

    pub retry: RetryConfig,
}

impl Default for ScmConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            https: true,
            username: DEFAULT_USERNAME.to_string(),
            email: DEFAULT_EMAIL.to_string(),
            oauth_client_id: None,
            oauth_client_secret: None,
            read_only: ReadOnlyConfig::default(),
            status_context: DEFAULT_STATUS_CONTEXT.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl ScmConfig {
    /// Loads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigLoad` if the file cannot be read or parsed, and `Error::Config`
    /// if the parsed values fail [`ScmConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: ScmConfig = toml::from_str(&content).map_err(|e| Error::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the adapter cannot work with.
    pub fn validate(&self) -> Result<()> {
        let hostname = self.hostname.trim();
        if hostname.is_empty() {
            return Err(invalid("hostname", "must not be empty"));
        }
        if hostname.contains("://") || hostname.contains('/') || hostname.contains(' ') {
            return Err(invalid(
                "hostname",
                "must be a bare host name without scheme or path",
            ));
        }
        if hostname.contains(':') {
            return Err(invalid("hostname", "must not include a port"));
        }

        if self.username.trim().is_empty() {
            return Err(invalid("username", "must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(invalid("email", "must be an email address"));
        }

        match (&self.oauth_client_id, &self.oauth_client_secret) {
            (Some(id), Some(secret)) => {
                if id.trim().is_empty() || secret.expose_secret().trim().is_empty() {
                    return Err(invalid("oauth_client_id", "OAuth credentials must not be empty"));
                }
            }
            (None, None) => {}
            _ => {
                return Err(invalid(
                    "oauth_client_id",
                    "OAuth client id and secret must be set together",
                ))
            }
        }

        if self.read_only.enabled && self.read_only.clone_type == CloneType::Https {
            let has_username = self
                .read_only
                .username
                .as_deref()
                .is_some_and(|u| !u.trim().is_empty());
            let has_token = self
                .read_only
                .access_token
                .as_ref()
                .is_some_and(|t| !t.expose_secret().is_empty());
            if !has_username || !has_token {
                return Err(invalid(
                    "read_only",
                    "https read-only clones need both username and access_token",
                ));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }

        Ok(())
    }

    /// Identifies this provider instance to the platform, e.g. `gitlab:gitlab.com`.
    pub fn scm_context(&self) -> String {
        format!("gitlab:{}", self.hostname)
    }

    /// Root of the REST API, e.g. `https://gitlab.com/api/v4`.
    pub fn api_base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}/api/v4", scheme, self.hostname)
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::Config {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
