use serde::Serialize;
use thiserror::Error;

/// Failure talking to the academic API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("No student ID found.")]
    MissingIdentity,
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Upstream returned HTTP {0}")]
    Status(u16),
    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a single wire session was left out
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SessionRejection {
    #[error("unknown day '{0}'")]
    UnknownDay(String),
    #[error("malformed time '{0}'")]
    BadTime(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid slot file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid slot time '{0}'")]
    BadSlotTime(String),
    #[error("Slot boundaries must be non-empty and strictly ascending")]
    SlotOrder,
    #[error("Invalid port '{0}'")]
    BadPort(String),
}
