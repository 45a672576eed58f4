use super::*;
use serde_json::json;

fn common(action: HookAction) -> EventCommon {
    EventCommon {
        action,
        checkout_url: "https://gitlab.com/acme/widgets.git".to_string(),
        branch: "main".to_string(),
        sha: "da1560886d4f094c3e6c9ef40349f7d38b5d27d7".to_string(),
        username: "jsmith".to_string(),
        hook_id: String::new(),
        scm_context: "gitlab:gitlab.com".to_string(),
    }
}

#[test]
fn test_pull_request_event_serializes_platform_shape() {
    let event = WebhookEvent::PullRequest(PullRequestEvent {
        common: common(HookAction::Closed),
        pr_num: 3,
        pr_title: "Add widgets".to_string(),
        pr_ref: "merge-requests/3/head".to_string(),
        git_ref: "pull/3/merge".to_string(),
        pr_source: PrSource::Fork,
        pr_merged: Some(true),
    });

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "pr");
    assert_eq!(value["action"], "closed");
    assert_eq!(value["prNum"], 3);
    assert_eq!(value["ref"], "pull/3/merge");
    assert_eq!(value["prSource"], "fork");
    assert_eq!(value["prMerged"], true);
    assert_eq!(value["hookId"], "");
    assert_eq!(value["scmContext"], "gitlab:gitlab.com");
}

#[test]
fn test_repo_event_serializes_platform_shape() {
    let event = WebhookEvent::Repo(RepoEvent {
        common: common(HookAction::Push),
        commit_authors: vec!["Jordi".to_string(), "Jordi".to_string()],
        last_commit_message: "fixed readme".to_string(),
        git_ref: "refs/heads/main".to_string(),
        added_files: vec![],
        modified_files: vec!["README.md".to_string()],
        removed_files: vec![],
    });

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "repo");
    assert_eq!(value["action"], "push");
    assert_eq!(value["commitAuthors"], json!(["Jordi", "Jordi"]));
    assert_eq!(value["modifiedFiles"], json!(["README.md"]));
    assert!(value.get("prMerged").is_none());
}

#[test]
fn test_pr_merged_omitted_when_absent() {
    let event = PullRequestEvent {
        common: common(HookAction::Opened),
        pr_num: 1,
        pr_title: String::new(),
        pr_ref: "merge-requests/1/head".to_string(),
        git_ref: "pull/1/merge".to_string(),
        pr_source: PrSource::Branch,
        pr_merged: None,
    };

    let value = serde_json::to_value(&event).unwrap();
    assert!(value.get("prMerged").is_none());
}

#[test]
fn test_webhook_event_accessors() {
    let event = WebhookEvent::Repo(RepoEvent {
        common: common(HookAction::Push),
        commit_authors: vec![],
        last_commit_message: String::new(),
        git_ref: "refs/heads/main".to_string(),
        added_files: vec![],
        modified_files: vec![],
        removed_files: vec![],
    });

    assert_eq!(event.action(), HookAction::Push);
    assert!(!event.is_pull_request());
    assert_eq!(event.common().branch, "main");
}

#[test]
fn test_pr_source_remote_name() {
    assert_eq!(PrSource::Branch.remote_name(), "origin");
    assert_eq!(PrSource::Fork.remote_name(), "upstream");
    assert_eq!(PrSource::default(), PrSource::Branch);
}
