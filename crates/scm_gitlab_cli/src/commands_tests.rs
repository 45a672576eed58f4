use super::*;
use std::io::Write;

use tempfile::NamedTempFile;

fn json_file(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", value).unwrap();
    file
}

fn scm() -> GitlabScm {
    GitlabScm::new(ScmConfig::default()).unwrap()
}

fn gitlab_headers(event: &str) -> HeaderMap {
    build_headers(&[("X-Gitlab-Event".to_string(), event.to_string())]).unwrap()
}

fn push_payload() -> Value {
    serde_json::json!({
        "object_kind": "push",
        "event_name": "push",
        "ref": "refs/heads/master",
        "checkout_sha": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
        "user_username": "jsmith",
        "project": { "git_http_url": "https://gitlab.com/acme/widgets.git" },
        "commits": [{
            "id": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
            "message": "Update README",
            "author": { "name": "Jordan Smith", "email": "jsmith@example.com" },
            "added": [],
            "modified": ["README.md"],
            "removed": []
        }]
    })
}

#[test]
fn test_parse_key_val() {
    assert_eq!(
        parse_key_val("X-Gitlab-Event=Push Hook"),
        Ok(("X-Gitlab-Event".to_string(), "Push Hook".to_string()))
    );
    assert_eq!(
        parse_key_val("X-Token=a=b"),
        Ok(("X-Token".to_string(), "a=b".to_string()))
    );
    assert!(parse_key_val("no-separator").is_err());
}

#[test]
fn test_build_headers_rejects_invalid_name() {
    let result = build_headers(&[("bad header".to_string(), "x".to_string())]);

    assert!(matches!(result, Err(Error::InvalidArguments(_))));
}

#[test]
fn test_load_config_defaults() {
    let config = load_config(None).unwrap();

    assert_eq!(config.hostname, "gitlab.com");
}

#[test]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "hostname = \"gitlab.example.com\"").unwrap();

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.hostname, "gitlab.example.com");
    assert_eq!(config.scm_context(), "gitlab:gitlab.example.com");
}

#[test]
fn test_parse_hook_prints_event() {
    let payload = json_file(&push_payload());

    let output = parse_hook(&scm(), payload.path(), &gitlab_headers("Push Hook")).unwrap();

    let event: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(event["type"], "repo");
    assert_eq!(event["action"], "push");
    assert_eq!(event["branch"], "master");
    assert_eq!(event["scmContext"], "gitlab:gitlab.com");
}

#[test]
fn test_parse_hook_prints_null_for_ignored_event() {
    let payload = json_file(&serde_json::json!({ "object_kind": "note" }));

    let output = parse_hook(&scm(), payload.path(), &gitlab_headers("Note Hook")).unwrap();

    assert_eq!(output, "null");
}

#[test]
fn test_parse_hook_without_header_fails() {
    let payload = json_file(&push_payload());

    let result = parse_hook(&scm(), payload.path(), &HeaderMap::new());

    assert!(matches!(
        result,
        Err(Error::Scm(scm_gitlab::Error::BadRequest(_)))
    ));
}

#[test]
fn test_parse_hook_missing_file() {
    let result = parse_hook(
        &scm(),
        Path::new("/nonexistent/payload.json"),
        &gitlab_headers("Push Hook"),
    );

    assert!(matches!(result, Err(Error::LoadFile { .. })));
}

#[test]
fn test_can_handle() {
    let payload = json_file(&push_payload());

    assert_eq!(
        can_handle(&scm(), payload.path(), &gitlab_headers("Push Hook")).unwrap(),
        "true"
    );
    assert_eq!(
        can_handle(&scm(), payload.path(), &HeaderMap::new()).unwrap(),
        "false"
    );
}

#[test]
fn test_can_handle_invalid_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let result = can_handle(&scm(), file.path(), &gitlab_headers("Push Hook"));

    assert!(matches!(result, Err(Error::ParseJson { .. })));
}

#[test]
fn test_checkout_prints_command() {
    let plan = json_file(&serde_json::json!({
        "branch": "main",
        "host": "gitlab.com",
        "org": "acme",
        "repo": "widgets",
        "sha": "abc123",
        "rootDir": "services/api"
    }));

    let output = checkout(&scm(), plan.path()).unwrap();

    let command: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(command["name"], "sd-checkout-code");
    assert!(command["command"]
        .as_str()
        .unwrap()
        .ends_with("cd services/api"));
}

#[test]
fn test_checkout_rejects_incomplete_plan() {
    let plan = json_file(&serde_json::json!({ "branch": "main" }));

    let result = checkout(&scm(), plan.path());

    assert!(matches!(result, Err(Error::ParseJson { .. })));
}

#[tokio::test]
async fn test_parse_url_rejects_other_host() {
    let result = parse_url(
        &scm(),
        "https://gitlab.example.com/acme/widgets.git",
        &SecretString::from("glpat-test"),
    )
    .await;

    assert!(matches!(
        result,
        Err(Error::Scm(scm_gitlab::Error::HostMismatch { .. }))
    ));
}
