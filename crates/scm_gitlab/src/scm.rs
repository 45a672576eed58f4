//! The adapter facade handed to the platform.

use std::sync::Arc;

use gitlab_client::{
    CommitState, CommitStatusPayload, GitLabClient, HookEvent, HookPayload, ProjectClient,
};
use http::HeaderMap;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::checkout::{CheckoutCommand, CheckoutPlan, CheckoutSynthesizer};
use crate::config::ScmConfig;
use crate::errors::{Error, Result};
use crate::events::WebhookEvent;
use crate::hook_parser::HookParser;
use crate::repo_reference::{RepoReference, ScmUri};

#[cfg(test)]
#[path = "scm_tests.rs"]
mod tests;

/// Events every registered webhook subscribes to.
pub const WEBHOOK_EVENTS: [HookEvent; 2] = [HookEvent::Push, HookEvent::MergeRequests];

/// Maps a platform build status to a GitLab commit state.
///
/// Statuses the adapter does not know are reported as failures.
pub fn commit_state_for(build_status: &str) -> CommitState {
    match build_status {
        "SUCCESS" => CommitState::Success,
        "FAILURE" => CommitState::Failed,
        "ABORTED" => CommitState::Canceled,
        "RUNNING" => CommitState::Running,
        "QUEUED" | "BLOCKED" => CommitState::Pending,
        _ => CommitState::Failed,
    }
}

fn default_description(state: CommitState) -> &'static str {
    match state {
        CommitState::Success => "Everything looks good!",
        CommitState::Failed => "Did not work as expected.",
        CommitState::Canceled => "Aborted mid-flight",
        CommitState::Running => "Testing your code...",
        CommitState::Pending => "Looking good so far!",
    }
}

/// A build result to report against a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatusUpdate {
    pub scm_uri: String,
    pub sha: String,

    /// Platform status, e.g. `SUCCESS` or `RUNNING`
    pub build_status: String,

    pub job_name: String,

    /// Link back to the build
    pub url: Option<String>,

    pub description: Option<String>,
}

/// GitLab implementation of the platform's SCM adapter.
pub struct GitlabScm {
    config: ScmConfig,
    client: Arc<dyn ProjectClient>,
    hook_parser: HookParser,
    checkout: CheckoutSynthesizer,
}

impl std::fmt::Debug for GitlabScm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabScm")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GitlabScm {
    /// Validates `config` and connects to its GitLab host.
    pub fn new(config: ScmConfig) -> Result<Self> {
        config.validate()?;

        let client =
            GitLabClient::new(&config.api_base_url())?.with_retry_policy(config.retry.into());

        info!(
            hostname = %config.hostname,
            scm_context = %config.scm_context(),
            "Created GitLab SCM adapter"
        );
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Builds the adapter on top of an existing client.
    pub fn with_client(config: ScmConfig, client: Arc<dyn ProjectClient>) -> Self {
        let hook_parser = HookParser::new(config.scm_context());
        let checkout = CheckoutSynthesizer::new(&config);
        Self {
            config,
            client,
            hook_parser,
            checkout,
        }
    }

    pub fn config(&self) -> &ScmConfig {
        &self.config
    }

    pub fn scm_context(&self) -> String {
        self.config.scm_context()
    }

    /// Returns whether this adapter recognizes the delivery. Never fails.
    pub fn can_handle_webhook(&self, headers: &HeaderMap, payload: &Value) -> bool {
        self.hook_parser.can_handle(headers, payload)
    }

    /// Normalizes a webhook delivery; `Ok(None)` means the event is ignored.
    pub fn parse_hook(&self, headers: &HeaderMap, payload: &Value) -> Result<Option<WebhookEvent>> {
        self.hook_parser.parse(headers, payload)
    }

    pub fn get_checkout_command(&self, plan: &CheckoutPlan) -> CheckoutCommand {
        self.checkout.build(plan)
    }

    /// Resolves a checkout URL to the platform's `host:repoId:branch[:rootDir]` key.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostMismatch` when the URL points at another GitLab instance, and
    /// `Error::Client` when the project cannot be read.
    #[instrument(skip(self, token))]
    pub async fn parse_url(&self, checkout_url: &str, token: &SecretString) -> Result<ScmUri> {
        let reference = RepoReference::from_checkout_url(checkout_url)?;
        self.ensure_host(&reference.hostname)?;

        let project = self
            .client
            .get_project(&reference.full_path(), token)
            .await?;

        let branch = match reference.branch {
            Some(branch) => branch,
            None => project.default_branch.clone().unwrap_or_else(|| {
                debug!(project_id = project.id, "Project has no default branch");
                "master".to_string()
            }),
        };

        let scm_uri = ScmUri::new(reference.hostname, project.id, branch)
            .with_root_dir(reference.root_dir.as_deref());
        debug!(scm_uri = %scm_uri, "Parsed checkout URL");
        Ok(scm_uri)
    }

    /// Resolves a platform key back to the repository it names.
    #[instrument(skip(self, token))]
    pub async fn lookup_scm_uri(&self, scm_uri: &str, token: &SecretString) -> Result<RepoReference> {
        let uri = self.parse_scm_uri(scm_uri)?;
        let project = self
            .client
            .get_project(&uri.repo_id.to_string(), token)
            .await?;

        Ok(RepoReference {
            hostname: uri.hostname,
            owner: project.namespace().to_string(),
            repo_name: project.path,
            branch: Some(uri.branch),
            root_dir: uri.root_dir,
        })
    }

    /// Returns the sha at the tip of the branch named by `scm_uri`.
    #[instrument(skip(self, token))]
    pub async fn get_commit_sha(&self, scm_uri: &str, token: &SecretString) -> Result<String> {
        let uri = self.parse_scm_uri(scm_uri)?;
        let branch = self
            .client
            .get_branch(uri.repo_id, &uri.branch, token)
            .await?;
        Ok(branch.commit.id)
    }

    /// Reports a build result as a commit status named `<status_context>/<job name>`.
    ///
    /// A missing project or insufficient access is logged and otherwise ignored.
    #[instrument(skip(self, update, token), fields(scm_uri = %update.scm_uri, sha = %update.sha))]
    pub async fn update_commit_status(
        &self,
        update: &CommitStatusUpdate,
        token: &SecretString,
    ) -> Result<()> {
        let uri = self.parse_scm_uri(&update.scm_uri)?;
        let state = commit_state_for(&update.build_status);
        let status = CommitStatusPayload {
            state,
            name: format!("{}/{}", self.config.status_context, update.job_name),
            target_url: update.url.clone(),
            description: Some(
                update
                    .description
                    .clone()
                    .unwrap_or_else(|| default_description(state).to_string()),
            ),
        };

        match self
            .client
            .create_commit_status(uri.repo_id, &update.sha, &status, token)
            .await
        {
            Ok(()) => Ok(()),
            Err(e @ (gitlab_client::Error::NotFound | gitlab_client::Error::AuthError(..))) => {
                warn!(
                    project_id = uri.repo_id,
                    sha = %update.sha,
                    error = %e,
                    "Skipping commit status update"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads `path` at `git_ref`, or at the branch of `scm_uri` when no ref is given.
    ///
    /// Paths are relative to the root directory of `scm_uri`, when it has one.
    #[instrument(skip(self, token))]
    pub async fn get_file(
        &self,
        scm_uri: &str,
        path: &str,
        git_ref: Option<&str>,
        token: &SecretString,
    ) -> Result<String> {
        let uri = self.parse_scm_uri(scm_uri)?;
        let path = path.trim_start_matches('/');
        let file_path = match uri.root_dir.as_deref() {
            Some(root_dir) => format!("{}/{}", root_dir, path),
            None => path.to_string(),
        };
        let git_ref = git_ref.unwrap_or(&uri.branch);

        Ok(self
            .client
            .get_raw_file(uri.repo_id, &file_path, git_ref, token)
            .await?)
    }

    /// Subscribes `url` to push and merge request events of the project.
    ///
    /// An existing hook with the same URL is updated instead of duplicated.
    #[instrument(skip(self, token))]
    pub async fn add_webhook(&self, scm_uri: &str, url: &str, token: &SecretString) -> Result<()> {
        let uri = self.parse_scm_uri(scm_uri)?;
        let payload = HookPayload::for_events(url, &WEBHOOK_EVENTS);

        let hooks = self.client.list_hooks(uri.repo_id, token).await?;
        match hooks.iter().find(|hook| hook.url == url) {
            Some(existing) => {
                self.client
                    .update_hook(uri.repo_id, existing.id, &payload, token)
                    .await?;
                info!(project_id = uri.repo_id, hook_id = existing.id, "Updated webhook");
            }
            None => {
                let hook = self.client.create_hook(uri.repo_id, &payload, token).await?;
                info!(project_id = uri.repo_id, hook_id = hook.id, "Created webhook");
            }
        }
        Ok(())
    }

    fn parse_scm_uri(&self, scm_uri: &str) -> Result<ScmUri> {
        let uri: ScmUri = scm_uri.parse()?;
        self.ensure_host(&uri.hostname)?;
        Ok(uri)
    }

    fn ensure_host(&self, hostname: &str) -> Result<()> {
        if hostname.eq_ignore_ascii_case(&self.config.hostname) {
            Ok(())
        } else {
            Err(Error::HostMismatch {
                expected: self.config.hostname.clone(),
                actual: hostname.to_string(),
            })
        }
    }
}
