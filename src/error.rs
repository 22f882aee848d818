//! Unified error types.
//!
//! Client mistakes (bad JSON, unsupported verbs, rejected merges) are not
//! errors at this level: they are answered with an [`Envelope`](crate::Envelope)
//! and a 4xx status. What lives here are the failures that abort one request
//! or prevent the server from starting.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout pathdoc.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A second document was inserted for a `path` that already has one.
    #[error("duplicate key error: path {0:?} already exists")]
    DuplicateKey(String),

    /// The store refused an update document. The message is shown to the
    /// client verbatim.
    #[error("{0}")]
    UpdateRejected(String),

    /// A stored value could not be converted to or from JSON.
    #[error("document conversion failed: {0}")]
    Conversion(String),

    /// Anything else the backend reports.
    #[error("{0}")]
    Backend(String),
}

/// The crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding the listener or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Reading the request from the connection failed.
    #[error("transport: {0}")]
    Transport(#[from] hyper::Error),

    /// The document store reported a failure.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// A single store operation exceeded its deadline.
    #[error("store operation `{operation}` timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    /// The final response body could not be serialized.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configuration could not be loaded.
    #[error("configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// `true` when the failure is an expired store deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
