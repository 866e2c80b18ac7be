//! Domain error taxonomy.
//!
//! Adapters report failures through the narrow `StoreError`,
//! `UpstreamError` and `SinkError` enums. `ResourceError` is what callers
//! of the application service see.

use thiserror::Error;

/// Failure reported by the authoritative store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The composite key already exists.
    #[error("resource already exists: {0}")]
    Conflict(String),
    /// No record carries the key.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// The storage engine failed.
    #[error("store error: {0}")]
    Backend(String),
}

/// Failure talking to the upstream introspection API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("unexpected upstream status: {0}")]
    Status(u16),
    #[error("invalid upstream response: {0}")]
    Decode(String),
    #[error("{0} not found upstream")]
    NotFound(String),
}

/// Failure writing or removing a transport fragment.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create fragment directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize fragment: {0}")]
    Serialize(String),
    #[error("failed to write fragment {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete fragment {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure loading the embedded schema documents.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema {name} is not valid JSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema {name} failed to compile: {message}")]
    Compile { name: String, message: String },
}

/// Caller-facing error of the resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),
    #[error("invalid type {resource_type} for protocol {protocol}")]
    InvalidType {
        protocol: String,
        resource_type: String,
    },
    #[error("no schema for {0}")]
    SchemaNotFound(String),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("resource not found")]
    NotFound,
    #[error("resource already exists")]
    Conflict,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<StoreError> for ResourceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::Conflict,
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}
