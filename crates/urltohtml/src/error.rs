//! Error types for the URL to HTML node

use thiserror::Error;

/// Failure of the authenticated call to the conversion API
///
/// Network errors, non-2xx responses, rejected credentials and timeouts all
/// end up here; only the message text differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::new(format!("Failed to connect to server: {err}"))
        } else {
            Self::new(err.to_string())
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A node parameter could not be resolved into its typed value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Required parameter has no value
    #[error("Missing required parameter: {name}")]
    Missing { name: &'static str },

    /// Parameter value has the wrong type or is out of range
    #[error("Invalid value for parameter '{name}': expected {expected}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
    },

    /// `wait_till` is not one of the supported events
    #[error("Invalid value for parameter 'wait_till': {0}")]
    InvalidWaitTill(String),
}

/// Why a single item failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Call(#[from] TransportError),
}

/// Item failure surfaced to the host when continue-on-fail is off
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{node} ({node_type}) failed on item {item}: {source}")]
pub struct NodeOperationError {
    /// Name of the node instance in the workflow
    pub node: String,
    /// Type name of the node
    pub node_type: String,
    /// Index of the failing input item
    pub item: usize,
    #[source]
    pub source: ConversionError,
}
