//! # Models
//!
//! REST resources returned by, or sent to, the GitLab v4 API. Only the fields the adapter
//! reads are declared; everything else in GitLab's responses is ignored on deserialization.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a GitLab project (repository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Numeric project ID, stable across renames and transfers
    pub id: u64,

    /// Project slug, the last path segment (e.g. "widgets")
    pub path: String,

    /// Full path including all groups (e.g. "acme/platform/widgets")
    pub path_with_namespace: String,

    /// Default branch; absent for empty repositories
    #[serde(default)]
    pub default_branch: Option<String>,

    /// HTTPS clone URL
    #[serde(default)]
    pub http_url_to_repo: Option<String>,

    /// SSH clone URL
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,

    /// Browser URL of the project
    #[serde(default)]
    pub web_url: Option<String>,
}

impl Project {
    /// Group path of the project, i.e. `path_with_namespace` without the project slug.
    ///
    /// ```rust
    /// use gitlab_client::models::Project;
    ///
    /// let project = Project {
    ///     id: 1,
    ///     path: "widgets".to_string(),
    ///     path_with_namespace: "acme/platform/widgets".to_string(),
    ///     default_branch: None,
    ///     http_url_to_repo: None,
    ///     ssh_url_to_repo: None,
    ///     web_url: None,
    /// };
    /// assert_eq!(project.namespace(), "acme/platform");
    /// ```
    pub fn namespace(&self) -> &str {
        self.path_with_namespace
            .rsplit_once('/')
            .map(|(namespace, _)| namespace)
            .unwrap_or("")
    }
}

/// A commit as embedded in branch responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit SHA
    pub id: String,

    #[serde(default)]
    pub message: Option<String>,
}

/// Represents a repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,

    /// Tip commit of the branch
    pub commit: Commit,
}

/// Commit status states accepted by GitLab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

/// Payload for `POST /projects/:id/statuses/:sha`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitStatusPayload {
    pub state: CommitState,

    /// Status name, distinguishes multiple statuses on the same commit
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
