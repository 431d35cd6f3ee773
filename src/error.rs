use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinicityError {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{resource} operation failed with status {status}: {body}")]
    Operation {
        resource: Resource,
        status: StatusCode,
        body: String,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("could not encode request body: {0}")]
    Encode(#[from] quick_xml::se::SeError),

    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("invalid date range: start {start} must be before or equal to end {end}")]
    InvalidDateRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}

impl FinicityError {
    /// Status code of the rejected call, when the API answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FinicityError::Operation { status, .. } => Some(*status),
            FinicityError::Authentication(AuthenticationError::Rejected { status, .. }) => {
                Some(*status)
            }
            FinicityError::Authentication(AuthenticationError::Concurrent { status, .. }) => {
                *status
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("unexpected status {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("could not encode credentials: {0}")]
    Encode(#[from] quick_xml::se::SeError),

    /// The refresh this caller waited on failed.
    #[error("concurrent refresh failed: {message}")]
    Concurrent {
        status: Option<StatusCode>,
        message: String,
    },
}

/// Network or protocol failure below the HTTP status level.
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };
        Self::with_source(message, err)
    }
}

/// A response body that did not match the expected XML shape.
#[derive(Debug, Error)]
#[error("could not parse response body: {source}")]
pub struct ParseError {
    pub body: String,
    #[source]
    pub source: quick_xml::de::DeError,
}

/// API resource family an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Partner,
    Account,
    Customer,
    Institution,
    Transaction,
    TxPush,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = match self {
            Resource::Partner => "partner",
            Resource::Account => "account",
            Resource::Customer => "customer",
            Resource::Institution => "institution",
            Resource::Transaction => "transaction",
            Resource::TxPush => "txpush",
        };
        f.write_str(v)
    }
}
