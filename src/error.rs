//! Error types shared across the companion.
//!
//! Backend and OS-action errors are always recovered inside the core and
//! turned into chat text. Store and config errors belong to the host.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} API error ({status}): {body}")]
    Api {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned no text")]
    EmptyResponse(&'static str),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

#[derive(Error, Debug)]
pub enum OsActionError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with status {status}")]
    CommandFailed { program: String, status: String },

    #[error("not supported on {0}")]
    Unsupported(&'static str),

    #[error("system probe failed: {0}")]
    Probe(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid personality profile: {0}")]
    InvalidProfile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
