//! Error types shared by the store, the dispatcher, and the wire protocol.
//!
//! CHANGELOG:
//! - 10/19/2026 - Encoding and line-length decode errors
//! - 10/19/2026 - Initial implementation

use thiserror::Error;

/// Failures from the persistent store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database file could not be opened or created.
    #[error("Cannot open database at {path}: {source}")]
    ConnectionFailed {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed for a reason other than a tolerated duplicate insert.
    #[error("SQL error: {0}")]
    QueryFailed(#[from] rusqlite::Error),
}

impl StoreError {
    /// Stable wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::ConnectionFailed { .. } => "STORE_CONNECTION_FAILED",
            StoreError::QueryFailed(_) => "STORE_QUERY_FAILED",
        }
    }
}

/// A call rejected before any store access.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to parse request JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Request line is not valid UTF-8: {0}")]
    InvalidEncoding(#[source] std::str::Utf8Error),

    #[error("Request line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Unknown object or interface: {0}")]
    UnknownObject(String),

    #[error("Failed to parse parameters for {method}: {source}")]
    InvalidParams {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Stable wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::InvalidJson(_) | DecodeError::InvalidEncoding(_) => "INVALID_JSON",
            DecodeError::LineTooLong(_) => "REQUEST_TOO_LARGE",
            DecodeError::UnsupportedVersion(_) => "UNSUPPORTED_VERSION",
            DecodeError::UnknownMethod(_) => "UNKNOWN_METHOD",
            DecodeError::UnknownObject(_) => "UNKNOWN_OBJECT",
            DecodeError::InvalidParams { .. } => "INVALID_PARAMS",
        }
    }
}

/// Anything a single call can fail with.
#[derive(Error, Debug)]
pub enum CallError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CallError {
    pub fn code(&self) -> &'static str {
        match self {
            CallError::Decode(e) => e.code(),
            CallError::Store(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let store = StoreError::QueryFailed(rusqlite::Error::InvalidQuery);
        let decode = DecodeError::UnknownMethod("Frobnicate".to_string());
        assert_eq!(store.code(), "STORE_QUERY_FAILED");
        assert_eq!(decode.code(), "UNKNOWN_METHOD");
        assert_eq!(CallError::from(decode).code(), "UNKNOWN_METHOD");
    }

    #[test]
    fn test_bad_bytes_report_as_invalid_json() {
        let utf8 = String::from_utf8(vec![b'a', 0xff]).unwrap_err().utf8_error();
        assert_eq!(DecodeError::InvalidEncoding(utf8).code(), "INVALID_JSON");
        assert_eq!(DecodeError::LineTooLong(8).code(), "REQUEST_TOO_LARGE");
    }

    #[test]
    fn test_connection_error_message_names_path() {
        let err = StoreError::ConnectionFailed {
            path: "/nope/extensions.db".to_string(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert!(err.to_string().contains("/nope/extensions.db"));
        assert_eq!(err.code(), "STORE_CONNECTION_FAILED");
    }
}
