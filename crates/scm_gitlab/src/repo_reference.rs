//! Repository identity parsing.
//!
//! Two textual forms identify a repository:
//! - checkout URLs as users paste them (`https://host/owner/repo.git#branch:rootDir`), parsed
//!   into a [`RepoReference`];
//! - the platform's persisted key `hostname:repoId:branch[:rootDir]`, parsed into a [`ScmUri`].

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

#[cfg(test)]
#[path = "repo_reference_tests.rs"]
mod tests;

fn checkout_url_regex() -> &'static Regex {
    static CHECKOUT_URL: OnceLock<Regex> = OnceLock::new();
    CHECKOUT_URL.get_or_init(|| {
        Regex::new(
            r"^(?:(?:https?)://(?:[^@/\s]+@)?(?P<web_host>[^/:\s@]+(?::\d+)?)/|(?:ssh|git)://(?:[^@/\s]+@)?(?P<ssh_host>[^/:\s@]+)(?::\d+)?/|[^@/:\s]+@(?P<scp_host>[^/:\s]+):)(?P<owner>[^\s#]+)/(?P<repo>[^/\s#]+?)(?:\.git)?(?:#(?P<fragment>[^\s]*))?$",
        )
        .expect("checkout URL pattern is valid")
    })
}

/// Parsed identity of a repository, branch and optional subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoReference {
    pub hostname: String,

    /// Owning namespace; may span nested groups (`acme/platform`)
    pub owner: String,

    pub repo_name: String,

    /// Branch requested in the URL fragment, if any
    pub branch: Option<String>,

    /// Relative subdirectory without a leading slash
    pub root_dir: Option<String>,
}

impl RepoReference {
    /// Parses a checkout URL.
    ///
    /// Accepted forms:
    /// - `https://[user@]host[:port]/owner/repo[.git][#branch[:rootDir]]`
    /// - `ssh://git@host[:port]/owner/repo[.git][#branch[:rootDir]]`
    /// - `git@host:owner/repo.git[#branch[:rootDir]]`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scm_gitlab::RepoReference;
    ///
    /// let reference =
    ///     RepoReference::from_checkout_url("https://gitlab.com/acme/widgets.git#main:services/api")
    ///         .unwrap();
    /// assert_eq!(reference.owner, "acme");
    /// assert_eq!(reference.repo_name, "widgets");
    /// assert_eq!(reference.branch.as_deref(), Some("main"));
    /// assert_eq!(reference.root_dir.as_deref(), Some("services/api"));
    /// ```
    pub fn from_checkout_url(checkout_url: &str) -> Result<Self> {
        let trimmed = checkout_url.trim();
        let captures = checkout_url_regex()
            .captures(trimmed)
            .ok_or_else(|| Error::InvalidCheckoutUrl(checkout_url.to_string()))?;

        let hostname = captures
            .name("web_host")
            .or_else(|| captures.name("ssh_host"))
            .or_else(|| captures.name("scp_host"))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::InvalidCheckoutUrl(checkout_url.to_string()))?;

        let owner = captures["owner"].trim_matches('/').to_string();
        if owner.is_empty() || owner.split('/').any(str::is_empty) {
            return Err(Error::InvalidCheckoutUrl(checkout_url.to_string()));
        }

        let (branch, root_dir) = match captures.name("fragment") {
            Some(fragment) => split_fragment(fragment.as_str()),
            None => (None, None),
        };

        Ok(Self {
            hostname,
            owner,
            repo_name: captures["repo"].to_string(),
            branch,
            root_dir,
        })
    }

    /// `owner/repo`, the project path GitLab resolves projects by.
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.owner, self.repo_name)
    }
}

/// Splits a `branch[:rootDir]` fragment.
fn split_fragment(fragment: &str) -> (Option<String>, Option<String>) {
    let (branch, root_dir) = match fragment.split_once(':') {
        Some((branch, root_dir)) => (branch, Some(root_dir)),
        None => (fragment, None),
    };

    let branch = Some(branch.trim()).filter(|b| !b.is_empty()).map(String::from);
    (branch, root_dir.and_then(normalize_root_dir))
}

/// Strips surrounding slashes; an empty result means "repository root".
pub(crate) fn normalize_root_dir(root_dir: &str) -> Option<String> {
    let normalized = root_dir.trim().trim_matches('/');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// The platform's canonical repository key, `hostname:repoId:branch[:rootDir]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmUri {
    pub hostname: String,

    /// GitLab numeric project ID
    pub repo_id: u64,

    pub branch: String,

    pub root_dir: Option<String>,
}

impl ScmUri {
    pub fn new(hostname: impl Into<String>, repo_id: u64, branch: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            repo_id,
            branch: branch.into(),
            root_dir: None,
        }
    }

    pub fn with_root_dir(mut self, root_dir: Option<&str>) -> Self {
        self.root_dir = root_dir.and_then(normalize_root_dir);
        self
    }
}

impl FromStr for ScmUri {
    type Err = Error;

    /// Parses `hostname:repoId:branch[:rootDir]`. The root directory is everything after
    /// the third separator, so it may itself contain colons.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidScmUri(s.to_string());
        let mut parts = s.splitn(4, ':');

        let hostname = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let repo_id = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let branch = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let root_dir = parts.next();

        Ok(ScmUri::new(hostname, repo_id, branch).with_root_dir(root_dir))
    }
}

impl fmt::Display for ScmUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hostname, self.repo_id, self.branch)?;
        if let Some(root_dir) = &self.root_dir {
            write!(f, ":{root_dir}")?;
        }
        Ok(())
    }
}
