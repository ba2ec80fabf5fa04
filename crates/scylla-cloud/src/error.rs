//! Error types for cluster lifecycle management

use std::time::Duration;
use thiserror::Error;

/// Failures reported by the remote control-plane API or the transport
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Cluster lifecycle errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("unrecognized value {value:?} for {attribute:?} attribute")]
    UnrecognizedAttribute { attribute: String, value: String },

    #[error("missing required attribute {0:?}")]
    MissingAttribute(String),

    #[error("invalid value for {attribute:?} attribute: {message}")]
    InvalidAttribute { attribute: String, message: String },

    #[error("error reading id={0:?}")]
    InvalidId(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("error {context}: {source}")]
    Remote {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("unrecognized cluster request status: {0:?}")]
    UnrecognizedRequestStatus(String),

    #[error("unexpected number of {kind} requests, expected 1, got: {count}")]
    UnexpectedRequestCount { kind: String, count: usize },

    #[error("multi-datacenter clusters are not currently supported: {0}")]
    MultipleDatacenters(usize),

    #[error("instance id {0} is not present in the metadata catalog")]
    UnknownInstance(i64),

    #[error("{0}")]
    DeleteRejected(String),

    #[error(r#"updating "scylla_cluster" resource is not supported"#)]
    UpdateNotSupported,

    #[error("timed out after {limit:?} while {operation}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("State file error: {0}")]
    State(String),

    #[error("Lock acquisition failed: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub(crate) fn remote(context: &'static str) -> impl FnOnce(ApiError) -> CloudError {
        move |source| CloudError::Remote { context, source }
    }

    pub(crate) fn unrecognized(attribute: &str, value: impl Into<String>) -> Self {
        CloudError::UnrecognizedAttribute {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    /// Whether this error came from validation alone, with no remote call made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CloudError::UnrecognizedAttribute { .. }
                | CloudError::MissingAttribute(_)
                | CloudError::InvalidAttribute { .. }
                | CloudError::InvalidId(_)
                | CloudError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
