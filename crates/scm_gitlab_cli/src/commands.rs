//! Command implementations for the scm-gitlab CLI.
//!
//! Each command reads its input from disk, runs it through the adapter and returns the
//! JSON text to print, so the binary only has to deal with argument parsing and output.

use std::fs;
use std::path::Path;

use http::{HeaderMap, HeaderName, HeaderValue};
use scm_gitlab::{CheckoutPlan, GitlabScm, ScmConfig};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::errors::Error;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Splits a `KEY=VALUE` argument.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Builds a header map from `KEY=VALUE` pairs.
pub fn build_headers(pairs: &[(String, String)]) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    for (key, value) in pairs {
        let name = HeaderName::from_bytes(key.trim().as_bytes())
            .map_err(|e| Error::InvalidArguments(format!("header name `{}`: {}", key, e)))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| Error::InvalidArguments(format!("header `{}` value: {}", key, e)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Loads the adapter configuration, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ScmConfig, Error> {
    match path {
        Some(path) => Ok(ScmConfig::load(path)?),
        None => {
            debug!("No configuration file given, using defaults");
            Ok(ScmConfig::default())
        }
    }
}

fn read_json(path: &Path) -> Result<Value, Error> {
    let content = fs::read_to_string(path).map_err(|source| Error::LoadFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| Error::ParseJson {
        path: path.display().to_string(),
        source,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(Error::Output)
}

/// Prints the normalized event for a delivery, or `null` when it is ignored.
#[instrument(skip(scm, headers))]
pub fn parse_hook(scm: &GitlabScm, payload_path: &Path, headers: &HeaderMap) -> Result<String, Error> {
    let payload = read_json(payload_path)?;
    let event = scm.parse_hook(headers, &payload)?;
    match &event {
        Some(event) => info!(action = ?event.action(), "Parsed webhook"),
        None => info!("Webhook ignored"),
    }
    to_json(&event)
}

/// Prints whether the adapter recognizes a delivery.
#[instrument(skip(scm, headers))]
pub fn can_handle(scm: &GitlabScm, payload_path: &Path, headers: &HeaderMap) -> Result<String, Error> {
    let payload = read_json(payload_path)?;
    to_json(&scm.can_handle_webhook(headers, &payload))
}

/// Prints the checkout command for a plan stored as JSON.
#[instrument(skip(scm))]
pub fn checkout(scm: &GitlabScm, plan_path: &Path) -> Result<String, Error> {
    let plan: CheckoutPlan =
        serde_json::from_value(read_json(plan_path)?).map_err(|source| Error::ParseJson {
            path: plan_path.display().to_string(),
            source,
        })?;
    to_json(&scm.get_checkout_command(&plan))
}

/// Prints the platform key for a checkout URL.
#[instrument(skip(scm, token))]
pub async fn parse_url(scm: &GitlabScm, checkout_url: &str, token: &SecretString) -> Result<String, Error> {
    let scm_uri = scm.parse_url(checkout_url, token).await?;
    Ok(scm_uri.to_string())
}
