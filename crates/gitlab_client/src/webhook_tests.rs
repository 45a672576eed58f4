//! Tests for webhook types.

use super::*;
use serde_json::json;

#[test]
fn test_event_kind_from_str() {
    assert_eq!(EventKind::from_str("push"), Ok(EventKind::Push));
    assert_eq!(
        EventKind::from_str("merge_request"),
        Ok(EventKind::MergeRequest)
    );
    assert_eq!(EventKind::from_str("tag_push"), Ok(EventKind::TagPush));
    assert!(EventKind::from_str("Push Hook").is_err());
    assert!(EventKind::from_str("").is_err());
}

#[test]
fn test_event_kind_as_str_matches_serde() {
    assert_eq!(EventKind::MergeRequest.as_str(), "merge_request");
    assert_eq!(
        serde_json::to_string(&EventKind::WikiPage).unwrap(),
        r#""wiki_page""#
    );
    assert_eq!(EventKind::TagPush.to_string(), "tag_push");
}

#[test]
fn test_push_event_deserialization() {
    let payload = json!({
        "object_kind": "push",
        "event_name": "push",
        "before": "95790bf891e76fee5e1747ab589903a6a1f80f22",
        "after": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
        "ref": "refs/heads/master",
        "checkout_sha": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
        "user_username": "jsmith",
        "project": {
            "id": 15,
            "git_http_url": "https://gitlab.example.com/mike/diaspora.git",
            "path_with_namespace": "mike/diaspora"
        },
        "commits": [
            {
                "id": "b6568db1bc1dcd7f8b4d5a946b0b91f9dacd7327",
                "message": "Update Catalan translation",
                "author": {"name": "Jordi Mallach", "email": "jordi@softcatala.org"},
                "added": ["CHANGELOG"],
                "modified": ["app/controller/application.rb"],
                "removed": []
            }
        ],
        "total_commits_count": 1
    });

    let event: PushEvent = serde_json::from_value(payload).unwrap();
    assert_eq!(event.event_name.as_deref(), Some("push"));
    assert_eq!(event.git_ref.as_deref(), Some("refs/heads/master"));
    assert_eq!(event.project.id, Some(15));
    assert_eq!(event.commits.len(), 1);
    assert_eq!(event.commits[0].author.name.as_deref(), Some("Jordi Mallach"));
    assert_eq!(event.commits[0].added, vec!["CHANGELOG".to_string()]);
    assert!(event.commits[0].removed.is_empty());
}

#[test]
fn test_push_event_tolerates_missing_and_malformed_lists() {
    let missing: PushEvent = serde_json::from_value(json!({"ref": "refs/heads/main"})).unwrap();
    assert!(missing.commits.is_empty());

    let null: PushEvent = serde_json::from_value(json!({"commits": null})).unwrap();
    assert!(null.commits.is_empty());

    let object: PushEvent =
        serde_json::from_value(json!({"commits": {"unexpected": "shape"}})).unwrap();
    assert!(object.commits.is_empty());

    let commit: PushCommit = serde_json::from_value(json!({"added": "not-a-list"})).unwrap();
    assert!(commit.added.is_empty());
    assert!(commit.modified.is_empty());
}

#[test]
fn test_merge_request_event_deserialization() {
    let payload = json!({
        "object_kind": "merge_request",
        "user": {"name": "Administrator", "username": "root"},
        "object_attributes": {
            "iid": 1,
            "title": "MS-Viewport",
            "state": "opened",
            "action": "open",
            "source_branch": "ms-viewport",
            "target_branch": "master",
            "source_project_id": 14,
            "target_project_id": 14,
            "last_commit": {"id": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7", "message": "fixed readme"},
            "target": {"git_http_url": "https://gitlab.example.com/awesome_space/awesome_project.git"}
        }
    });

    let event: MergeRequestEvent = serde_json::from_value(payload).unwrap();
    let attributes = &event.object_attributes;
    assert_eq!(attributes.iid, Some(1));
    assert_eq!(attributes.state, Some(MergeRequestState::Opened));
    assert_eq!(attributes.source_project_id, attributes.target_project_id);
    assert_eq!(
        attributes.last_commit.id.as_deref(),
        Some("da1560886d4f094c3e6c9ef40349f7d38b5d27d7")
    );
    assert_eq!(event.user.username.as_deref(), Some("root"));
}

#[test]
fn test_merge_request_unknown_state_maps_to_other() {
    let attributes: MergeRequestAttributes =
        serde_json::from_value(json!({"state": "reopened"})).unwrap();
    assert_eq!(attributes.state, Some(MergeRequestState::Other));

    let attributes: MergeRequestAttributes =
        serde_json::from_value(json!({"state": "locked"})).unwrap();
    assert_eq!(attributes.state, Some(MergeRequestState::Locked));
}

#[test]
fn test_project_hook_default_ssl_verification() {
    // enable_ssl_verification defaults to true when not provided
    let json = r#"{"id": 3, "url": "https://ci.example.com/hook"}"#;
    let hook: ProjectHook = serde_json::from_str(json).unwrap();
    assert!(hook.enable_ssl_verification);
    assert!(!hook.push_events);
}

#[test]
fn test_hook_payload_for_events() {
    let payload = HookPayload::for_events(
        "https://ci.example.com/hook",
        &[HookEvent::Push, HookEvent::MergeRequests],
    );
    assert!(payload.push_events);
    assert!(payload.merge_requests_events);
    assert!(payload.enable_ssl_verification);

    let push_only = HookPayload::for_events("https://ci.example.com/hook", &[HookEvent::Push]);
    let json = serde_json::to_value(&push_only).unwrap();
    assert_eq!(json[HookEvent::Push.flag_name()], true);
    assert_eq!(json[HookEvent::MergeRequests.flag_name()], false);
}

#[test]
fn test_merge_request_event_null_blocks_default() {
    let payload = json!({
        "object_kind": "merge_request",
        "user": null,
        "project": {"id": 2},
        "object_attributes": {
            "iid": 3,
            "state": "closed",
            "source_project_id": null,
            "target_project_id": 2,
            "last_commit": null,
            "source": null,
            "target": {"git_http_url": "https://gitlab.com/acme/widgets.git"}
        }
    });

    let event: MergeRequestEvent = serde_json::from_value(payload).unwrap();

    assert_eq!(event.user, EventUser::default());
    assert_eq!(event.object_attributes.source, EventProject::default());
    assert_eq!(event.object_attributes.last_commit, MergeRequestCommit::default());
    assert_eq!(event.object_attributes.source_project_id, None);
    assert_eq!(
        event.object_attributes.target.git_http_url.as_deref(),
        Some("https://gitlab.com/acme/widgets.git")
    );
}

#[test]
fn test_null_object_attributes_default() {
    let event: MergeRequestEvent =
        serde_json::from_value(json!({"object_attributes": null, "project": null})).unwrap();

    assert_eq!(event.object_attributes, MergeRequestAttributes::default());
    assert_eq!(event.project, EventProject::default());
}

#[test]
fn test_push_commit_null_author_defaults() {
    let payload = json!({
        "event_name": "push",
        "project": null,
        "commits": [
            {"id": "abc", "message": "Squashed", "author": null, "added": ["a.txt"]}
        ]
    });

    let event: PushEvent = serde_json::from_value(payload).unwrap();

    assert_eq!(event.project, EventProject::default());
    assert_eq!(event.commits.len(), 1);
    assert_eq!(event.commits[0].author, CommitAuthor::default());
    assert_eq!(event.commits[0].added, vec!["a.txt"]);
}
