//! # scm_gitlab
//!
//! GitLab implementation of a CI/CD platform's source control adapter.
//!
//! The adapter has two cores that need no network access:
//! - [`HookParser`] turns GitLab webhook deliveries into provider-neutral [`WebhookEvent`]s
//! - [`CheckoutSynthesizer`] composes the shell command that checks out source for a build
//!
//! Around them, [`GitlabScm`] offers the REST-backed operations the platform needs (resolving
//! checkout URLs, reading files, reporting commit statuses, registering webhooks) on top of
//! [`gitlab_client`].
//!
//! ## Examples
//!
//! ```rust
//! use scm_gitlab::{CheckoutPlan, GitlabScm, ScmConfig};
//!
//! let scm = GitlabScm::new(ScmConfig::default()).unwrap();
//! let command = scm.get_checkout_command(&CheckoutPlan::new(
//!     "main", "gitlab.com", "acme", "widgets", "abc123",
//! ));
//! assert_eq!(command.name, "sd-checkout-code");
//! ```

pub mod checkout;
pub use checkout::{CheckoutCommand, CheckoutPlan, CheckoutSynthesizer, ParentConfig};

pub mod config;
pub use config::{CloneType, ReadOnlyConfig, RetryConfig, ScmConfig};

pub mod errors;
pub use errors::{Error, Result};

pub mod events;
pub use events::{
    EventCommon, HookAction, PrSource, PullRequestEvent, RepoEvent, WebhookEvent,
};

pub mod hook_parser;
pub use hook_parser::HookParser;

pub mod repo_reference;
pub use repo_reference::{RepoReference, ScmUri};

pub mod scm;
pub use scm::{commit_state_for, CommitStatusUpdate, GitlabScm};

pub mod shell;
