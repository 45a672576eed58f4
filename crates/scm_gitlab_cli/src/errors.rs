use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the scm-gitlab CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid command-line arguments were provided.
    ///
    /// Returned for malformed `KEY=VALUE` headers and similar input the adapter never sees.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to read an input file.
    #[error("Failed to load file {path}: {source}")]
    LoadFile { path: String, source: io::Error },

    /// An input file is not valid JSON, or does not have the expected shape.
    #[error("Failed to parse JSON from {path}: {source}")]
    ParseJson {
        path: String,
        source: serde_json::Error,
    },

    /// The adapter rejected the request.
    #[error(transparent)]
    Scm(#[from] scm_gitlab::Error),

    /// Failed to write the result.
    #[error("Failed to serialize output: {0}")]
    Output(serde_json::Error),
}
