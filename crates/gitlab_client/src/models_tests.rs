use super::*;

#[test]
fn test_project_deserialization_ignores_unknown_fields() {
    let json = r#"{
        "id": 42,
        "path": "widgets",
        "path_with_namespace": "acme/widgets",
        "default_branch": "main",
        "http_url_to_repo": "https://gitlab.com/acme/widgets.git",
        "ssh_url_to_repo": "git@gitlab.com:acme/widgets.git",
        "web_url": "https://gitlab.com/acme/widgets",
        "star_count": 3,
        "visibility": "private"
    }"#;

    let project: Project = serde_json::from_str(json).unwrap();
    assert_eq!(project.id, 42);
    assert_eq!(project.default_branch.as_deref(), Some("main"));
    assert_eq!(project.namespace(), "acme");
}

#[test]
fn test_project_without_default_branch() {
    // Empty repositories have no default branch
    let json = r#"{"id": 7, "path": "empty", "path_with_namespace": "acme/empty"}"#;

    let project: Project = serde_json::from_str(json).unwrap();
    assert!(project.default_branch.is_none());
    assert!(project.web_url.is_none());
}

#[test]
fn test_project_namespace_nested_groups() {
    let json = r#"{"id": 7, "path": "api", "path_with_namespace": "acme/backend/services/api"}"#;

    let project: Project = serde_json::from_str(json).unwrap();
    assert_eq!(project.namespace(), "acme/backend/services");
}

#[test]
fn test_branch_deserialization() {
    let json = r#"{
        "name": "main",
        "merged": false,
        "commit": {"id": "7b5c3cc8be40ee161ae89a06bba6229da1032a0c", "message": "add projects API"}
    }"#;

    let branch: Branch = serde_json::from_str(json).unwrap();
    assert_eq!(branch.name, "main");
    assert_eq!(branch.commit.id, "7b5c3cc8be40ee161ae89a06bba6229da1032a0c");
}

#[test]
fn test_commit_status_payload_serialization() {
    let payload = CommitStatusPayload {
        state: CommitState::Canceled,
        name: "Screwdriver/main".to_string(),
        target_url: Some("https://ci.example.com/builds/1".to_string()),
        description: None,
    };

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["state"], "canceled");
    assert_eq!(json["name"], "Screwdriver/main");
    assert_eq!(json["target_url"], "https://ci.example.com/builds/1");
    assert!(json.get("description").is_none());
}

#[test]
fn test_commit_state_as_str_matches_serde() {
    for state in [
        CommitState::Pending,
        CommitState::Running,
        CommitState::Success,
        CommitState::Failed,
        CommitState::Canceled,
    ] {
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, format!("\"{}\"", state.as_str()));
    }
}
