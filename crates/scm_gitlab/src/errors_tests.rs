use super::*;
use std::error::Error as StdError;

#[test]
fn test_bad_request_message() {
    let error = Error::BadRequest("Missing x-gitlab-event header".to_string());
    assert_eq!(error.to_string(), "Bad request: Missing x-gitlab-event header");
    assert!(error.source().is_none());
}

#[test]
fn test_config_error_message() {
    let error = Error::Config {
        field: "hostname".to_string(),
        reason: "must not be empty".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Invalid configuration: hostname - must not be empty"
    );
}

#[test]
fn test_client_error_is_wrapped_with_source() {
    let error: Error = gitlab_client::Error::NotFound.into();

    assert!(matches!(error, Error::Client(gitlab_client::Error::NotFound)));
    assert_eq!(error.to_string(), "GitLab request failed: Resource not found");
    assert!(error.source().is_some());
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
