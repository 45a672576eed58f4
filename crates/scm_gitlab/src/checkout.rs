//! Synthesis of the shell command that checks out source for a build.
//!
//! The command is composed once, without I/O, from a [`CheckoutPlan`]. Every choice that
//! depends on the build agent (platform, credentials, clone depth, checkout directory) is
//! emitted as a runtime conditional so the same command works on differently configured
//! agents. The sandbox is expected to provide `SD_SOURCE_DIR` and `SD_CONFIG_DIR`, and may
//! set any of the tuning variables below.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::{CloneType, ScmConfig};
use crate::events::PrSource;
use crate::shell::{
    echo, equals, export, git, git_arg, if_then, if_then_else, is_set, is_unset, shell_word,
    CommandSequence,
};

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;

/// Name of the build step running the synthesized command.
pub const CHECKOUT_STEP_NAME: &str = "sd-checkout-code";

/// Local branch the pull request head is fetched into.
pub const LOCAL_PR_BRANCH: &str = "pr";

/// Depth used for shallow clones when the agent sets neither a depth nor a date.
pub const DEFAULT_CLONE_DEPTH: u32 = 50;

const RECURSIVE_CLONE_VAR: &str = "GIT_RECURSIVE_CLONE";
const RECURSIVE_OPTION_VAR: &str = "GIT_RECURSIVE_OPTION";
const SPARSE_PATH_VAR: &str = "GIT_SPARSE_CHECKOUT_PATH";
const SPARSE_OPTION_VAR: &str = "GIT_SPARSE_OPTION";
const SHALLOW_CLONE_VAR: &str = "GIT_SHALLOW_CLONE";
const SHALLOW_DEPTH_VAR: &str = "GIT_SHALLOW_CLONE_DEPTH";
const SHALLOW_SINCE_VAR: &str = "GIT_SHALLOW_CLONE_SINCE";
const SHALLOW_SINGLE_BRANCH_VAR: &str = "GIT_SHALLOW_CLONE_SINGLE_BRANCH";
const CLONE_TYPE_VAR: &str = "SCM_CLONE_TYPE";
const SCM_USERNAME_VAR: &str = "SCM_USERNAME";
const SCM_TOKEN_VAR: &str = "SCM_ACCESS_TOKEN";
const CHECKOUT_DIR_VAR: &str = "SD_CHECKOUT_DIR_FINAL";
const CONFIG_DIR_VAR: &str = "SD_CONFIG_DIR";

/// macOS agents run git directly; everywhere else git runs through the sandboxed helper.
const GIT_WRAPPER_SELECTION: &str = "export SD_GIT_WRAPPER=\"$(if [ \"$(uname)\" = Darwin ]; then echo 'eval'; else echo 'sd-step exec core/git'; fi)\"";

/// Upstream repository holding the build configuration of a child pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentConfig {
    pub branch: String,
    pub host: String,
    pub org: String,
    pub repo: String,
    pub sha: String,
}

/// Everything needed to check out one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPlan {
    /// Pipeline branch; for pull requests, the target branch
    pub branch: String,

    /// Branch to clone when it differs from `branch`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_branch: Option<String>,

    pub host: String,
    pub org: String,
    pub repo: String,
    pub sha: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    /// Provider ref to fetch the pull request head from, e.g. `merge-requests/3/head`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_source: Option<PrSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_branch_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_config: Option<ParentConfig>,
}

impl CheckoutPlan {
    /// Creates a plan for a plain branch build.
    pub fn new(
        branch: impl Into<String>,
        host: impl Into<String>,
        org: impl Into<String>,
        repo: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Self {
            branch: branch.into(),
            commit_branch: None,
            host: host.into(),
            org: org.into(),
            repo: repo.into(),
            sha: sha.into(),
            root_dir: None,
            pr_ref: None,
            pr_source: None,
            pr_branch_name: None,
            parent_config: None,
        }
    }
}

/// A named build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutCommand {
    pub name: String,
    pub command: String,
}

/// Read-only identity baked into the command.
#[derive(Debug, Clone)]
enum ReadOnlyClone {
    Ssh,
    Https { username: String, token: String },
}

/// Builds checkout commands for one adapter instance.
#[derive(Debug, Clone)]
pub struct CheckoutSynthesizer {
    git_username: String,
    git_email: String,
    read_only: Option<ReadOnlyClone>,
}

impl CheckoutSynthesizer {
    pub fn new(config: &ScmConfig) -> Self {
        let read_only = if config.read_only.enabled {
            match config.read_only.clone_type {
                CloneType::Ssh => Some(ReadOnlyClone::Ssh),
                CloneType::Https => Some(ReadOnlyClone::Https {
                    username: config.read_only.username.clone().unwrap_or_default(),
                    token: config
                        .read_only
                        .access_token
                        .as_ref()
                        .map(|t| t.expose_secret().to_string())
                        .unwrap_or_default(),
                }),
            }
        } else {
            None
        };

        Self {
            git_username: config.username.clone(),
            git_email: config.email.clone(),
            read_only,
        }
    }

    /// Composes the checkout command for `plan`.
    ///
    /// The result depends only on `plan` and the adapter configuration.
    pub fn build(&self, plan: &CheckoutPlan) -> CheckoutCommand {
        let mut sequence = CommandSequence::new()
            .then_all(preamble())
            .then(self.url_selection("SCM_URL", &plan.host, &plan.org, &plan.repo))
            .then(export("GIT_URL", "$SCM_URL.git"))
            .then(export("GIT_MERGE_AUTOEDIT", "no"))
            .then(self.identity())
            .then(checkout_dir());

        if let Some(parent) = &plan.parent_config {
            sequence = sequence.then_all(self.parent_checkout(parent));
        }

        sequence = sequence.then_all(primary_checkout(plan));

        sequence = match &plan.pr_ref {
            Some(pr_ref) => sequence.then_all(pr_merge(plan, pr_ref)),
            None => sequence.then(export(
                "GIT_BRANCH",
                &shell_word(&format!("origin/{}", plan.branch)),
            )),
        };

        sequence = sequence.then(submodules());

        if let Some(root_dir) = plan.root_dir.as_deref().filter(|d| !d.is_empty()) {
            sequence = sequence.then(format!("cd {}", shell_word(root_dir)));
        }

        CheckoutCommand {
            name: CHECKOUT_STEP_NAME.to_string(),
            command: sequence.join(),
        }
    }

    /// Exports `var` as the repository URL without the `.git` suffix.
    fn url_selection(&self, var: &str, host: &str, org: &str, repo: &str) -> String {
        let path = format!("{org}/{repo}");
        let ssh_url = shell_word(&format!("git@{host}:{path}"));
        let https_url = shell_word(&format!("https://{host}/{path}"));

        match &self.read_only {
            Some(ReadOnlyClone::Ssh) => export(var, &ssh_url),
            Some(ReadOnlyClone::Https { username, token }) => export(
                var,
                &shell_word(&format!("https://{username}:{token}@{host}/{path}")),
            ),
            None => {
                let with_credentials = format!(
                    "https://${SCM_USERNAME_VAR}:${SCM_TOKEN_VAR}@{}",
                    shell_word(&format!("{host}/{path}"))
                );
                format!(
                    "if {}; then {}; elif {} && {}; then {}; else {}; fi",
                    equals(CLONE_TYPE_VAR, "ssh"),
                    export(var, &ssh_url),
                    is_set(SCM_USERNAME_VAR),
                    is_set(SCM_TOKEN_VAR),
                    export(var, &with_credentials),
                    export(var, &https_url),
                )
            }
        }
    }

    fn identity(&self) -> String {
        git(&format!(
            "git config --global user.name {} && git config --global user.email {}",
            git_arg(&self.git_username),
            git_arg(&self.git_email)
        ))
    }

    fn parent_checkout(&self, parent: &ParentConfig) -> Vec<String> {
        let config_dir = format!("${CONFIG_DIR_VAR}");
        let mut fragments = vec![echo(&format!(
            "Cloning external config repo {}/{}/{}",
            parent.host, parent.org, parent.repo
        ))];
        fragments.push(self.url_selection("CONFIG_URL", &parent.host, &parent.org, &parent.repo));
        fragments.push(clone("$CONFIG_URL.git", &parent.branch, &config_dir, false));
        fragments.push(git(&format!(
            "git -C {config_dir} reset --hard {} --",
            git_arg(&parent.sha)
        )));
        fragments.push(echo(&format!("Reset external config repo to {}", parent.sha)));
        fragments
    }
}

/// Git wrapper plus the recursive and sparse clone toggles.
fn preamble() -> Vec<String> {
    vec![
        GIT_WRAPPER_SELECTION.to_string(),
        if_then_else(
            &format!(
                "{} && {}",
                is_set(RECURSIVE_CLONE_VAR),
                equals(RECURSIVE_CLONE_VAR, "false")
            ),
            &export(RECURSIVE_OPTION_VAR, "\"\""),
            &export(RECURSIVE_OPTION_VAR, "\"--recursive\""),
        ),
        if_then_else(
            &is_set(SPARSE_PATH_VAR),
            &export(SPARSE_OPTION_VAR, "\"--no-checkout\""),
            &export(SPARSE_OPTION_VAR, "\"\""),
        ),
    ]
}

fn checkout_dir() -> String {
    if_then_else(
        &is_set("SD_CHECKOUT_DIR"),
        &export(CHECKOUT_DIR_VAR, "\"$SD_CHECKOUT_DIR\""),
        &export(CHECKOUT_DIR_VAR, "\"$SD_SOURCE_DIR\""),
    )
}

/// Clones `url` into `dest`, full or shallow depending on the agent's toggles.
fn clone(url: &str, branch: &str, dest: &str, sparse: bool) -> String {
    let options = if sparse {
        format!("${RECURSIVE_OPTION_VAR} ${SPARSE_OPTION_VAR}")
    } else {
        format!("${RECURSIVE_OPTION_VAR}")
    };
    let target = format!("--quiet --progress --branch {} {url} {dest}", git_arg(branch));

    let full_clone = git(&format!("git clone {options} {target}"));

    let depth = if_then_else(
        &is_set(SHALLOW_DEPTH_VAR),
        &export("GIT_SHALLOW_DEPTH_OPTION", &format!("\"--depth=${SHALLOW_DEPTH_VAR}\"")),
        &if_then_else(
            &is_set(SHALLOW_SINCE_VAR),
            &export(
                "GIT_SHALLOW_DEPTH_OPTION",
                &format!("\"--shallow-since='${SHALLOW_SINCE_VAR}'\""),
            ),
            &export(
                "GIT_SHALLOW_DEPTH_OPTION",
                &format!("\"--depth={DEFAULT_CLONE_DEPTH}\""),
            ),
        ),
    );
    let single_branch = if_then_else(
        &equals(SHALLOW_SINGLE_BRANCH_VAR, "true"),
        &export("GIT_SHALLOW_BRANCH_OPTION", "\"\""),
        &export("GIT_SHALLOW_BRANCH_OPTION", "\"--no-single-branch\""),
    );
    let shallow_clone = format!(
        "{depth} && {single_branch} && {}",
        git(&format!(
            "git clone $GIT_SHALLOW_DEPTH_OPTION $GIT_SHALLOW_BRANCH_OPTION {options} {target}"
        ))
    );

    if_then_else(
        &format!(
            "{} && {}",
            is_set(SHALLOW_CLONE_VAR),
            equals(SHALLOW_CLONE_VAR, "false")
        ),
        &full_clone,
        &shallow_clone,
    )
}

fn primary_checkout(plan: &CheckoutPlan) -> Vec<String> {
    let clone_branch = plan.commit_branch.as_deref().unwrap_or(&plan.branch);
    // Pull requests reset to the target branch tip; the head is merged in afterwards.
    let reset_ref = if plan.pr_ref.is_some() {
        &plan.branch
    } else {
        &plan.sha
    };

    vec![
        echo(&format!(
            "Cloning {}/{}/{}, on branch {}",
            plan.host, plan.org, plan.repo, clone_branch
        )),
        clone("$GIT_URL", clone_branch, &format!("${CHECKOUT_DIR_VAR}"), true),
        format!("cd ${CHECKOUT_DIR_VAR}"),
        if_then(
            &is_set(SPARSE_PATH_VAR),
            &format!(
                "{} && {}",
                git(&format!("git sparse-checkout set ${SPARSE_PATH_VAR}")),
                git("git checkout")
            ),
        ),
        echo(&format!("Reset to {reset_ref}")),
        git(&format!("git reset --hard {} --", git_arg(reset_ref))),
    ]
}

fn pr_merge(plan: &CheckoutPlan, pr_ref: &str) -> Vec<String> {
    let remote = plan.pr_source.unwrap_or_default().remote_name();
    let head_branch = plan.pr_branch_name.as_deref().unwrap_or(LOCAL_PR_BRANCH);

    vec![
        echo(&format!("Fetching PR and merging with {}", plan.branch)),
        git(&format!(
            "git fetch origin {}",
            git_arg(&format!("{pr_ref}:{LOCAL_PR_BRANCH}"))
        )),
        export("PR_BASE_BRANCH_NAME", &shell_word(&plan.branch)),
        export(
            "PR_BRANCH_NAME",
            &shell_word(&format!("{remote}/{head_branch}")),
        ),
        git(&format!("git checkout {LOCAL_PR_BRANCH}")),
        git(&format!("git merge {}", git_arg(&plan.branch))),
    ]
}

fn submodules() -> String {
    if_then_else(
        &is_unset(RECURSIVE_OPTION_VAR),
        &git("git submodule init"),
        &git("git submodule update --init --recursive"),
    )
}
