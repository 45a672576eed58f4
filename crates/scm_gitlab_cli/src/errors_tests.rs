use super::*;

#[test]
fn test_invalid_arguments_error_display() {
    let error = Error::InvalidArguments("--header needs KEY=VALUE".to_string());
    assert_eq!(error.to_string(), "Invalid arguments: --header needs KEY=VALUE");
}

#[test]
fn test_load_file_error_display() {
    let error = Error::LoadFile {
        path: "payload.json".to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "File not found"),
    };
    assert_eq!(
        error.to_string(),
        "Failed to load file payload.json: File not found"
    );
}

#[test]
fn test_parse_json_error_display() {
    let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error = Error::ParseJson {
        path: "plan.json".to_string(),
        source,
    };
    assert!(error
        .to_string()
        .starts_with("Failed to parse JSON from plan.json:"));
}

#[test]
fn test_scm_error_is_transparent() {
    let error: Error = scm_gitlab::Error::BadRequest("Missing X-Gitlab-Event header".to_string()).into();
    assert_eq!(
        error.to_string(),
        scm_gitlab::Error::BadRequest("Missing X-Gitlab-Event header".to_string()).to_string()
    );
    assert!(matches!(error, Error::Scm(_)));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
