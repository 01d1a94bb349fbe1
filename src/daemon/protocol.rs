//! Daemon protocol types for NDJSON communication over the UNIX socket.
//!
//! One JSON object per line in each direction. Requests name an operation of
//! the `net.handsome.Daemon` interface; responses echo the request id.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{INTERFACE_NAME, OBJECT_PATH};
use crate::error::DecodeError;

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// NDJSON request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID (UUID)
    pub id: String,
    /// Protocol version
    #[serde(default = "default_version")]
    pub v: u8,
    /// Operation name ("Add", "Delete", "Variants", "Health")
    pub method: String,
    /// Named call arguments
    #[serde(default = "empty_params")]
    pub params: Value,
    /// Target object path; defaults to the service's only object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Target interface; defaults to the service's only interface
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

fn default_version() -> u8 {
    PROTOCOL_VERSION
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Request {
    /// Build a request with a fresh id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            v: PROTOCOL_VERSION,
            method: method.into(),
            params,
            object: None,
            interface: None,
        }
    }

    /// Parse request from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> Result<Self, DecodeError> {
        let request: Request = serde_json::from_str(line).map_err(DecodeError::InvalidJson)?;
        request.validate()?;
        Ok(request)
    }

    /// Reject calls aimed at a different protocol version, object or interface.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.v != PROTOCOL_VERSION {
            return Err(DecodeError::UnsupportedVersion(self.v));
        }
        if let Some(object) = self.object.as_deref().filter(|o| *o != OBJECT_PATH) {
            return Err(DecodeError::UnknownObject(object.to_string()));
        }
        if let Some(interface) = self.interface.as_deref().filter(|i| *i != INTERFACE_NAME) {
            return Err(DecodeError::UnknownObject(interface.to_string()));
        }
        Ok(())
    }

    /// Serialize request to NDJSON line.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Best-effort id recovery from a line that failed to decode.
pub fn salvage_id(line: &str) -> String {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// NDJSON response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID (matches request)
    pub id: String,
    /// False when the call failed at the protocol level
    pub ok: bool,
    /// Result payload; on Add/Delete failure this still carries status 1
    pub result: Option<Value>,
    /// Error information (if failed)
    pub error: Option<ErrorInfo>,
    /// Response metadata
    pub meta: ResponseMeta,
}

/// Error details in response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (e.g. "STORE_QUERY_FAILED", "INVALID_PARAMS")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    pub details: Option<Value>,
}

/// Response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    /// Protocol version
    pub protocol_v: u8,
}

impl ResponseMeta {
    fn new(server_ms: f64) -> Self {
        Self {
            server_ms,
            protocol_v: PROTOCOL_VERSION,
        }
    }
}

impl Response {
    /// Create a success response.
    pub fn success(id: String, result: Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta::new(server_ms),
        }
    }

    /// Create an error response.
    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self::failure(id, code, message, None, server_ms)
    }

    /// Create an error response that still carries a result payload.
    pub fn failure(
        id: String,
        code: &str,
        message: String,
        result: Option<Value>,
        server_ms: f64,
    ) -> Self {
        Self {
            id,
            ok: false,
            result,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
                details: None,
            }),
            meta: ResponseMeta::new(server_ms),
        }
    }

    /// Parse response from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Serialize response to NDJSON line.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}
