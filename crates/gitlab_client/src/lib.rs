//! Crate for interacting with the GitLab REST API.
//!
//! This crate provides a small client for the GitLab v4 API operations a CI/CD platform
//! needs from a source-control provider: project lookup, branch tips, commit statuses, raw
//! file contents and project hooks. It also carries the typed schema of GitLab's native
//! webhook payloads (see [`webhook`]).
//!
//! Requests authenticate with a per-call token sent as `PRIVATE-TOKEN`. Server errors and
//! transport failures are retried according to a [`RetryPolicy`]; client errors are not.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::{Branch, Commit, CommitState, CommitStatusPayload, Project};

pub mod webhook;
pub use webhook::{
    EventKind, HookEvent, HookPayload, MergeRequestEvent, MergeRequestState, ProjectHook,
    PushEvent, GITLAB_EVENT_HEADER,
};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Default number of attempts for a request, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// How often, and how patiently, a failed request is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first; values below 1 are treated as 1
    pub max_attempts: u32,

    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Project-scoped GitLab operations used by the SCM adapter.
///
/// Every call takes the token to authenticate with, since the adapter acts on behalf of
/// different users from one client instance.
#[async_trait]
pub trait ProjectClient: Send + Sync {
    /// Fetches a project by numeric ID or by full `group/project` path.
    async fn get_project(&self, id_or_path: &str, token: &SecretString) -> Result<Project, Error>;

    async fn get_branch(
        &self,
        project_id: u64,
        branch: &str,
        token: &SecretString,
    ) -> Result<Branch, Error>;

    async fn create_commit_status(
        &self,
        project_id: u64,
        sha: &str,
        status: &CommitStatusPayload,
        token: &SecretString,
    ) -> Result<(), Error>;

    /// Returns the raw contents of `file_path` at `git_ref`.
    async fn get_raw_file(
        &self,
        project_id: u64,
        file_path: &str,
        git_ref: &str,
        token: &SecretString,
    ) -> Result<String, Error>;

    async fn list_hooks(
        &self,
        project_id: u64,
        token: &SecretString,
    ) -> Result<Vec<ProjectHook>, Error>;

    async fn create_hook(
        &self,
        project_id: u64,
        hook: &HookPayload,
        token: &SecretString,
    ) -> Result<ProjectHook, Error>;

    async fn update_hook(
        &self,
        project_id: u64,
        hook_id: u64,
        hook: &HookPayload,
        token: &SecretString,
    ) -> Result<ProjectHook, Error>;
}

/// A client for the GitLab v4 REST API.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl GitLabClient {
    /// Creates a client for the API rooted at `base_url`, e.g. `https://gitlab.com/api/v4`.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfiguration` if the URL cannot be parsed or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        // A trailing slash makes Url::join append instead of replacing the last segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| Error::InvalidConfiguration(format!("{base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("scm-gitlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidConfiguration(format!("{path}: {e}")))
    }

    /// Sends a request, repeating it while the failure is retryable and attempts remain.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: &SecretString,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, Error> {
        let url = self.endpoint(path)?;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header("PRIVATE-TOKEN", token.expose_secret())
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let outcome = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let message = response.text().await.unwrap_or_default();
                    Error::from_status(status.as_u16(), failure_message(status, &message))
                }
                Err(e) => Error::from(e),
            };

            if !outcome.is_retryable() || attempt >= max_attempts {
                debug!(
                    method = %method,
                    path = path,
                    attempt = attempt,
                    "GitLab request failed: {}",
                    outcome
                );
                return Err(outcome);
            }

            warn!(
                method = %method,
                path = path,
                attempt = attempt,
                max_attempts = max_attempts,
                "GitLab request failed, retrying: {}",
                outcome
            );
            attempt += 1;
            tokio::time::sleep(self.retry.delay).await;
        }
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: &SecretString,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let response = self.send(method, path, token, body, query).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            error!(path = path, "Failed to deserialize GitLab response");
            Error::Deserialization(e)
        })
    }
}

#[async_trait]
impl ProjectClient for GitLabClient {
    #[instrument(skip(self, token))]
    async fn get_project(&self, id_or_path: &str, token: &SecretString) -> Result<Project, Error> {
        let path = format!("projects/{}", urlencoding::encode(id_or_path));
        let project: Project = self
            .send_json(Method::GET, &path, token, None::<&()>, &[])
            .await?;

        debug!(
            project_id = project.id,
            path_with_namespace = project.path_with_namespace,
            "Retrieved project"
        );
        Ok(project)
    }

    #[instrument(skip(self, token))]
    async fn get_branch(
        &self,
        project_id: u64,
        branch: &str,
        token: &SecretString,
    ) -> Result<Branch, Error> {
        let path = format!(
            "projects/{}/repository/branches/{}",
            project_id,
            urlencoding::encode(branch)
        );
        self.send_json(Method::GET, &path, token, None::<&()>, &[])
            .await
    }

    #[instrument(skip(self, status, token), fields(state = status.state.as_str()))]
    async fn create_commit_status(
        &self,
        project_id: u64,
        sha: &str,
        status: &CommitStatusPayload,
        token: &SecretString,
    ) -> Result<(), Error> {
        let path = format!("projects/{}/statuses/{}", project_id, sha);
        self.send(Method::POST, &path, token, Some(status), &[])
            .await?;

        info!(
            project_id = project_id,
            sha = sha,
            name = status.name,
            "Updated commit status"
        );
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn get_raw_file(
        &self,
        project_id: u64,
        file_path: &str,
        git_ref: &str,
        token: &SecretString,
    ) -> Result<String, Error> {
        let path = format!(
            "projects/{}/repository/files/{}/raw",
            project_id,
            urlencoding::encode(file_path)
        );
        let response = self
            .send(Method::GET, &path, token, None::<&()>, &[("ref", git_ref)])
            .await?;
        Ok(response.text().await?)
    }

    #[instrument(skip(self, token))]
    async fn list_hooks(
        &self,
        project_id: u64,
        token: &SecretString,
    ) -> Result<Vec<ProjectHook>, Error> {
        let path = format!("projects/{}/hooks", project_id);
        self.send_json(
            Method::GET,
            &path,
            token,
            None::<&()>,
            &[("per_page", "100")],
        )
        .await
    }

    #[instrument(skip(self, hook, token), fields(url = %hook.url))]
    async fn create_hook(
        &self,
        project_id: u64,
        hook: &HookPayload,
        token: &SecretString,
    ) -> Result<ProjectHook, Error> {
        let path = format!("projects/{}/hooks", project_id);
        self.send_json(Method::POST, &path, token, Some(hook), &[])
            .await
    }

    #[instrument(skip(self, hook, token), fields(url = %hook.url))]
    async fn update_hook(
        &self,
        project_id: u64,
        hook_id: u64,
        hook: &HookPayload,
        token: &SecretString,
    ) -> Result<ProjectHook, Error> {
        let path = format!("projects/{}/hooks/{}", project_id, hook_id);
        self.send_json(Method::PUT, &path, token, Some(hook), &[])
            .await
    }
}

/// Builds the message for a failed response, falling back to the status reason.
fn failure_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string()
    } else {
        body.to_string()
    }
}
