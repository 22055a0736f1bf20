use thiserror::Error;

/// Why a fetch produced no usable XML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-success HTTP status, e.g. `HTTP 404 Not Found`.
    #[error("HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    /// Body was empty or whitespace only.
    #[error("Empty response body")]
    Empty,

    /// Body is not well-formed XML.
    #[error("Invalid XML: {0}")]
    Malformed(String),

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection, TLS or body decoding failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Invalid XML: {0}")]
    Malformed(String),
}

impl From<ConvertError> for FetchError {
    fn from(e: ConvertError) -> Self {
        match e {
            ConvertError::Malformed(msg) => FetchError::Malformed(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
