//! Provider-neutral webhook events handed to the platform.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

/// What happened, in the platform's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookAction {
    Opened,
    Closed,
    Push,
}

/// Where a pull request's changes come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrSource {
    /// Source branch lives in the target repository
    #[default]
    Branch,
    /// Source branch lives in a fork
    Fork,
}

impl PrSource {
    /// Remote name that the checkout script qualifies the PR head branch with.
    pub fn remote_name(&self) -> &'static str {
        match self {
            Self::Branch => "origin",
            Self::Fork => "upstream",
        }
    }
}

/// Fields shared by every normalized event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCommon {
    pub action: HookAction,
    pub checkout_url: String,
    pub branch: String,
    pub sha: String,
    pub username: String,

    /// Delivery id; GitLab does not supply one, so this is empty
    pub hook_id: String,

    /// Provider instance that handled the delivery (e.g. `gitlab:gitlab.com`)
    pub scm_context: String,
}

/// A merge request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEvent {
    #[serde(flatten)]
    pub common: EventCommon,

    pub pr_num: u64,
    pub pr_title: String,

    /// Provider ref locator used by the checkout script to fetch the change
    pub pr_ref: String,

    /// Synthetic merge ref, `pull/<prNum>/merge`
    #[serde(rename = "ref")]
    pub git_ref: String,

    pub pr_source: PrSource,

    /// True only when the merge request was merged rather than closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_merged: Option<bool>,
}

/// A branch push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoEvent {
    #[serde(flatten)]
    pub common: EventCommon,

    /// One author name per pushed commit, in payload order
    pub commit_authors: Vec<String>,

    pub last_commit_message: String,

    /// Raw ref, e.g. `refs/heads/main`
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Files changed by the first pushed commit only
    pub added_files: Vec<String>,
    pub modified_files: Vec<String>,
    pub removed_files: Vec<String>,
}

/// Normalized webhook event, tagged by `type` (`pr` or `repo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookEvent {
    #[serde(rename = "pr")]
    PullRequest(PullRequestEvent),
    #[serde(rename = "repo")]
    Repo(RepoEvent),
}

impl WebhookEvent {
    pub fn common(&self) -> &EventCommon {
        match self {
            Self::PullRequest(event) => &event.common,
            Self::Repo(event) => &event.common,
        }
    }

    pub fn action(&self) -> HookAction {
        self.common().action
    }

    pub fn is_pull_request(&self) -> bool {
        matches!(self, Self::PullRequest(_))
    }
}
