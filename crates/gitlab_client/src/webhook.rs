//! GitLab webhook types.
//!
//! Two groups of types live here: the project-hook registration resources used by
//! `/projects/:id/hooks`, and the native JSON payloads GitLab delivers to a hook endpoint.
//! Payload fields are declared optional wherever GitLab omits them for some deliveries, and
//! list fields fall back to empty when missing or not an array, so shape drift degrades to
//! defaults instead of deserialization failures.
//!
//! See [GitLab webhook events documentation](https://docs.gitlab.com/ee/user/project/integrations/webhook_events.html).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header carrying the GitLab event name, e.g. `Push Hook` or `Merge Request Hook`.
pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";

/// Event families, as reported in the payload's `object_kind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    TagPush,
    MergeRequest,
    Note,
    Issue,
    Pipeline,
    Build,
    WikiPage,
    Deployment,
    Release,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::TagPush => "tag_push",
            Self::MergeRequest => "merge_request",
            Self::Note => "note",
            Self::Issue => "issue",
            Self::Pipeline => "pipeline",
            Self::Build => "build",
            Self::WikiPage => "wiki_page",
            Self::Deployment => "deployment",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "tag_push" => Ok(Self::TagPush),
            "merge_request" => Ok(Self::MergeRequest),
            "note" => Ok(Self::Note),
            "issue" => Ok(Self::Issue),
            "pipeline" => Ok(Self::Pipeline),
            "build" => Ok(Self::Build),
            "wiki_page" => Ok(Self::WikiPage),
            "deployment" => Ok(Self::Deployment),
            "release" => Ok(Self::Release),
            other => Err(format!("unknown GitLab event kind: {other}")),
        }
    }
}

/// Merge request state as found in `object_attributes.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Merged,
    Locked,
    /// Any state this crate does not know about
    #[serde(other)]
    Other,
}

/// User block attached to merge request events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventUser {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Project block attached to webhook payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventProject {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub path_with_namespace: Option<String>,

    #[serde(default)]
    pub git_http_url: Option<String>,

    #[serde(default)]
    pub git_ssh_url: Option<String>,

    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Commit author in push and merge request payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// A commit entry in a push payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushCommit {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "null_or_default")]
    pub author: CommitAuthor,

    #[serde(default, deserialize_with = "array_or_empty")]
    pub added: Vec<String>,

    #[serde(default, deserialize_with = "array_or_empty")]
    pub modified: Vec<String>,

    #[serde(default, deserialize_with = "array_or_empty")]
    pub removed: Vec<String>,
}

/// Payload of a `Push Hook` delivery (`object_kind = "push"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    /// Declared event name; GitLab sends "push" for branch pushes
    #[serde(default)]
    pub event_name: Option<String>,

    /// Full ref, e.g. `refs/heads/main`
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,

    #[serde(default)]
    pub before: Option<String>,

    #[serde(default)]
    pub after: Option<String>,

    /// Commit the ref points at after the push; null when the branch was deleted
    #[serde(default)]
    pub checkout_sha: Option<String>,

    #[serde(default)]
    pub user_username: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default, deserialize_with = "null_or_default")]
    pub project: EventProject,

    #[serde(default, deserialize_with = "array_or_empty")]
    pub commits: Vec<PushCommit>,

    #[serde(default)]
    pub total_commits_count: Option<u64>,
}

/// Last commit of a merge request's source branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MergeRequestCommit {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// `object_attributes` of a merge request event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MergeRequestAttributes {
    /// Project-scoped merge request number
    #[serde(default)]
    pub iid: Option<u64>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub state: Option<MergeRequestState>,

    /// Action that triggered the delivery (open, close, merge, update, ...)
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub source_branch: Option<String>,

    #[serde(default)]
    pub target_branch: Option<String>,

    #[serde(default)]
    pub source_project_id: Option<u64>,

    #[serde(default)]
    pub target_project_id: Option<u64>,

    #[serde(default, deserialize_with = "null_or_default")]
    pub last_commit: MergeRequestCommit,

    #[serde(default, deserialize_with = "null_or_default")]
    pub source: EventProject,

    #[serde(default, deserialize_with = "null_or_default")]
    pub target: EventProject,

    #[serde(default)]
    pub url: Option<String>,
}

/// Payload of a `Merge Request Hook` delivery (`object_kind = "merge_request"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MergeRequestEvent {
    #[serde(default, deserialize_with = "null_or_default")]
    pub user: EventUser,

    #[serde(default, deserialize_with = "null_or_default")]
    pub project: EventProject,

    #[serde(default, deserialize_with = "null_or_default")]
    pub object_attributes: MergeRequestAttributes,
}

/// Events a project hook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Push,
    MergeRequests,
}

impl HookEvent {
    /// Name of the boolean flag GitLab uses for this event on hook resources.
    pub fn flag_name(&self) -> &'static str {
        match self {
            Self::Push => "push_events",
            Self::MergeRequests => "merge_requests_events",
        }
    }
}

/// A project hook as returned by `/projects/:id/hooks`.
///
/// # Examples
///
/// ```rust
/// use gitlab_client::ProjectHook;
///
/// let json = r#"{
///     "id": 1,
///     "url": "https://ci.example.com/webhooks",
///     "push_events": true,
///     "merge_requests_events": true,
///     "enable_ssl_verification": true,
///     "created_at": "2024-01-01T00:00:00Z"
/// }"#;
///
/// let hook: ProjectHook = serde_json::from_str(json).unwrap();
/// assert_eq!(hook.id, 1);
/// assert!(hook.push_events);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHook {
    /// GitLab-assigned hook ID
    pub id: u64,

    pub url: String,

    #[serde(default)]
    pub push_events: bool,

    #[serde(default)]
    pub merge_requests_events: bool,

    #[serde(default = "default_ssl_verification")]
    pub enable_ssl_verification: bool,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for creating or updating a project hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookPayload {
    pub url: String,
    pub push_events: bool,
    pub merge_requests_events: bool,
    pub enable_ssl_verification: bool,
}

impl HookPayload {
    /// Hook payload subscribing `url` to the given events, with SSL verification on.
    pub fn for_events(url: impl Into<String>, events: &[HookEvent]) -> Self {
        Self {
            url: url.into(),
            push_events: events.contains(&HookEvent::Push),
            merge_requests_events: events.contains(&HookEvent::MergeRequests),
            enable_ssl_verification: default_ssl_verification(),
        }
    }
}

fn default_ssl_verification() -> bool {
    true
}

/// Deserializes a nested block, treating an explicit null like a missing key.
///
/// GitLab sends `"source": null` for merge requests whose source project was deleted.
fn null_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a list, treating a missing, null or non-array value as empty.
fn array_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
