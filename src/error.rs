use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single request before a response could be read.
///
/// Cloneable so it can ride along on every `ExecutionResult`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("prepare body: {0}")]
    PrepareBody(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classifies a reqwest failure; `timeout` is the deadline the call ran under.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout { after: timeout }
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() || err.is_request() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unsupported auth type: {0}")]
    UnsupportedType(String),
    #[error("auth type '{auth_type}' requires config key '{key}'")]
    MissingConfig { auth_type: String, key: String },
    #[error("unsupported api key location: {0}")]
    UnsupportedLocation(String),
    #[error("invalid header for auth: {0}")]
    InvalidHeader(String),
    #[error("failed to sign request: {0}")]
    Signing(String),
}

/// Setup-time problems. These abort a run before any request is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment '{name}' is not defined in collection '{collection}'")]
    UnknownEnvironment { name: String, collection: String },
    #[error("request #{index} ('{name}') has an empty url")]
    EmptyUrl { index: usize, name: String },
    #[error("request #{index} ('{name}') has an invalid method '{method}'")]
    InvalidMethod {
        index: usize,
        name: String,
        method: String,
    },
    #[error("request '{0}' not found in collection")]
    UnknownRequest(String),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unmarshal yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unmarshal json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("load test needs at least one virtual user")]
    NoVirtualUsers,
    #[error("load test needs a positive duration or iteration count")]
    NoTermination,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start worker pool: {0}")]
    Pool(String),
}
