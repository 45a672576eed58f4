use super::*;
use std::error::Error as StdError;

#[test]
fn test_api_error() {
    let error = Error::ApiError {
        status: 502,
        message: "Bad Gateway".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "GitLab API request failed with status 502: Bad Gateway"
    );
    assert!(error.source().is_none());
    assert_eq!(error.status_code(), Some(502));
}

#[test]
fn test_from_status_classification() {
    assert!(matches!(Error::from_status(401, "x"), Error::AuthError(401, _)));
    assert!(matches!(Error::from_status(403, "x"), Error::AuthError(403, _)));
    assert!(matches!(Error::from_status(404, "x"), Error::NotFound));
    assert!(matches!(Error::from_status(429, "x"), Error::RateLimitExceeded));
    assert!(matches!(
        Error::from_status(422, "x"),
        Error::ApiError { status: 422, .. }
    ));
}

#[test]
fn test_retryable_errors() {
    assert!(Error::from_status(500, "boom").is_retryable());
    assert!(Error::from_status(503, "unavailable").is_retryable());
    assert!(Error::Transport("connection reset".to_string()).is_retryable());

    assert!(!Error::from_status(400, "bad").is_retryable());
    assert!(!Error::from_status(404, "missing").is_retryable());
    assert!(!Error::RateLimitExceeded.is_retryable());
}

#[test]
fn test_status_code_absent_for_local_failures() {
    assert_eq!(Error::Transport("timeout".to_string()).status_code(), None);
    assert_eq!(
        Error::InvalidConfiguration("bad url".to_string()).status_code(),
        None
    );
}

#[test]
fn test_auth_error_message() {
    let error = Error::AuthError(401, "401 Unauthorized".to_string());

    assert_eq!(
        error.to_string(),
        "Authentication failed with status 401: 401 Unauthorized"
    );
}

#[test]
fn test_error_is_send_sync() {
    // This test verifies that Error implements Send and Sync traits
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
