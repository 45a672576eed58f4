//! Classification of inbound GitLab webhook deliveries.
//!
//! A delivery is first checked for the `X-Gitlab-Event` header, which is what marks it as
//! coming from GitLab at all. The payload's `object_kind` then selects the event family:
//! merge requests become `pr` events, branch pushes become `repo` events, and everything
//! else is ignored (`Ok(None)`). Ignored deliveries are normal traffic, not errors.

use std::str::FromStr;

use gitlab_client::webhook::{EventKind, MergeRequestEvent, MergeRequestState, PushEvent};
use gitlab_client::GITLAB_EVENT_HEADER;
use http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};
use crate::events::{
    EventCommon, HookAction, PrSource, PullRequestEvent, RepoEvent, WebhookEvent,
};

#[cfg(test)]
#[path = "hook_parser_tests.rs"]
mod tests;

/// The only push event name GitLab uses for branch pushes.
const PUSH_EVENT_NAME: &str = "push";

/// Turns GitLab webhook deliveries into [`WebhookEvent`]s.
#[derive(Debug, Clone)]
pub struct HookParser {
    scm_context: String,
}

impl HookParser {
    /// Creates a parser stamping events with `scm_context` (e.g. `gitlab:gitlab.com`).
    pub fn new(scm_context: impl Into<String>) -> Self {
        Self {
            scm_context: scm_context.into(),
        }
    }

    /// Whether this provider can handle the delivery.
    ///
    /// True exactly when [`HookParser::parse`] succeeds with an event. Errors are collapsed
    /// to `false` so a dispatcher can move on to the next provider.
    pub fn can_handle(&self, headers: &HeaderMap, payload: &Value) -> bool {
        match self.parse(headers, payload) {
            Ok(event) => event.is_some(),
            Err(e) => {
                debug!("Delivery not handled by GitLab provider: {}", e);
                false
            }
        }
    }

    /// Normalizes a delivery.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` for merge requests that were opened, closed or merged, and for
    ///   branch pushes
    /// - `Ok(None)` for any other event kind or merge request state
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` when the `X-Gitlab-Event` header is missing.
    pub fn parse(&self, headers: &HeaderMap, payload: &Value) -> Result<Option<WebhookEvent>> {
        if !headers.contains_key(GITLAB_EVENT_HEADER) {
            return Err(Error::BadRequest(format!(
                "Missing {GITLAB_EVENT_HEADER} header"
            )));
        }

        let object_kind = payload
            .get("object_kind")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match EventKind::from_str(object_kind) {
            Ok(EventKind::MergeRequest) => Ok(self.parse_merge_request(payload)),
            Ok(EventKind::Push) => Ok(self.parse_push(payload)),
            Ok(other) => {
                info!(event_kind = %other, "Ignoring unsupported GitLab event");
                Ok(None)
            }
            Err(_) => {
                info!(
                    object_kind = object_kind,
                    "Ignoring unrecognized GitLab event"
                );
                Ok(None)
            }
        }
    }

    fn parse_merge_request(&self, payload: &Value) -> Option<WebhookEvent> {
        let event = match MergeRequestEvent::deserialize(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Ignoring merge request event with unexpected shape: {}", e);
                return None;
            }
        };
        let attributes = event.object_attributes;

        let (action, pr_merged) = match attributes.state {
            Some(MergeRequestState::Opened) => (HookAction::Opened, None),
            Some(MergeRequestState::Closed) => (HookAction::Closed, Some(false)),
            Some(MergeRequestState::Merged) => (HookAction::Closed, Some(true)),
            state => {
                debug!(state = ?state, "Ignoring merge request in non-actionable state");
                return None;
            }
        };

        let Some(pr_num) = attributes.iid else {
            warn!("Ignoring merge request event without an iid");
            return None;
        };

        let pr_source = if attributes.source_project_id == attributes.target_project_id {
            PrSource::Branch
        } else {
            PrSource::Fork
        };

        let checkout_url = attributes
            .target
            .git_http_url
            .or(event.project.git_http_url)
            .unwrap_or_default();

        Some(WebhookEvent::PullRequest(PullRequestEvent {
            common: EventCommon {
                action,
                checkout_url,
                branch: attributes.target_branch.unwrap_or_default(),
                sha: attributes.last_commit.id.unwrap_or_default(),
                username: event.user.username.unwrap_or_default(),
                hook_id: String::new(),
                scm_context: self.scm_context.clone(),
            },
            pr_num,
            pr_title: attributes.title.unwrap_or_default(),
            pr_ref: merge_request_ref(pr_num),
            git_ref: format!("pull/{pr_num}/merge"),
            pr_source,
            pr_merged,
        }))
    }

    fn parse_push(&self, payload: &Value) -> Option<WebhookEvent> {
        let event = match PushEvent::deserialize(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Ignoring push event with unexpected shape: {}", e);
                return None;
            }
        };

        if event.event_name.as_deref() != Some(PUSH_EVENT_NAME) {
            debug!(
                event_name = ?event.event_name,
                "Ignoring push-shaped payload with a different event name"
            );
            return None;
        }

        let git_ref = event.git_ref.unwrap_or_default();
        let branch = git_ref.rsplit('/').next().unwrap_or_default().to_string();

        let commit_authors = event
            .commits
            .iter()
            .map(|commit| commit.author.name.clone().unwrap_or_default())
            .collect();
        let last_commit_message = event
            .commits
            .last()
            .and_then(|commit| commit.message.clone())
            .unwrap_or_default();

        // Changed files come from the first commit only
        let (added_files, modified_files, removed_files) = event
            .commits
            .into_iter()
            .next()
            .map(|commit| (commit.added, commit.modified, commit.removed))
            .unwrap_or_default();

        Some(WebhookEvent::Repo(RepoEvent {
            common: EventCommon {
                action: HookAction::Push,
                checkout_url: event.project.git_http_url.unwrap_or_default(),
                branch,
                sha: event.checkout_sha.unwrap_or_default(),
                username: event.user_username.unwrap_or_default(),
                hook_id: String::new(),
                scm_context: self.scm_context.clone(),
            },
            commit_authors,
            last_commit_message,
            git_ref,
            added_files,
            modified_files,
            removed_files,
        }))
    }
}

/// Ref locator the checkout script fetches a merge request's head from.
pub fn merge_request_ref(pr_num: u64) -> String {
    format!("merge-requests/{pr_num}/head")
}
