//! Registry service - dispatches the `net.handsome.Daemon` operations.
//!
//! Arguments are decoded before the store is touched. Store failures come
//! back as `CallError::Store`; the server turns them into `ok: false`
//! responses and, for Add/Delete, keeps the legacy status `1` as the result.
//!
//! CHANGELOG:
//! - 10/19/2026 - Health stays up when the store is unreachable
//! - 10/19/2026 - Initial implementation

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::{INTERFACE_NAME, OBJECT_PATH, SERVICE_NAME};
use crate::daemon::marshal;
use crate::db::Store;
use crate::error::{CallError, DecodeError};

/// Status returned by Add/Delete on success.
pub const STATUS_OK: i64 = 0;
/// Status carried alongside a protocol error when Add/Delete fail.
pub const STATUS_FAILED: i64 = 1;

/// Operations exposed on the service's interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Add,
    Delete,
    Variants,
    Health,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Add => "Add",
            Method::Delete => "Delete",
            Method::Variants => "Variants",
            Method::Health => "Health",
        }
    }

    /// In-band status to attach when the call fails, if the operation has one.
    pub fn failure_status(&self) -> Option<i64> {
        match self {
            Method::Add | Method::Delete => Some(STATUS_FAILED),
            Method::Variants | Method::Health => None,
        }
    }
}

impl FromStr for Method {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Add" => Ok(Method::Add),
            "Delete" => Ok(Method::Delete),
            "Variants" => Ok(Method::Variants),
            "Health" => Ok(Method::Health),
            other => Err(DecodeError::UnknownMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddParams {
    path: String,
    extension: String,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    path: String,
}

#[derive(Debug, Deserialize)]
struct VariantsParams {
    #[serde(alias = "fileName")]
    file_name: String,
}

fn decode<T: DeserializeOwned>(method: Method, params: Value) -> Result<T, DecodeError> {
    serde_json::from_value(params).map_err(|source| DecodeError::InvalidParams {
        method: method.name().to_string(),
        source,
    })
}

/// Extension of `file_name`: the text after its last `.`, or `""` without one.
pub fn extension_of(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .unwrap_or("")
}

/// Registry service bound to one store.
pub struct RegistryService {
    store: Store,
    started_at: String,
}

impl RegistryService {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            store: Store::new(db_path),
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Dispatch a call by method name.
    pub fn dispatch(&self, method: Method, params: Value) -> Result<Value, CallError> {
        match method {
            Method::Add => self.add(decode(method, params)?),
            Method::Delete => self.delete(decode(method, params)?),
            Method::Variants => self.variants(decode(method, params)?),
            Method::Health => self.health(),
        }
    }

    fn add(&self, params: AddParams) -> Result<Value, CallError> {
        self.store.ensure_schema()?;
        self.store
            .insert(&params.path, &params.extension)
            .inspect_err(|e| {
                warn!(path = %params.path, extension = %params.extension, error = %e, "Add failed")
            })?;
        info!(path = %params.path, extension = %params.extension, "registered program");
        Ok(Value::from(STATUS_OK))
    }

    fn delete(&self, params: DeleteParams) -> Result<Value, CallError> {
        self.store
            .delete_by_path(&params.path)
            .inspect_err(|e| warn!(path = %params.path, error = %e, "Delete failed"))?;
        info!(path = %params.path, "removed program");
        Ok(Value::from(STATUS_OK))
    }

    fn variants(&self, params: VariantsParams) -> Result<Value, CallError> {
        let extension = extension_of(&params.file_name);
        let paths = self.store.lookup_by_extension(extension)?;
        Ok(marshal::encode_list(paths))
    }

    /// Liveness report. A store problem is reported in the payload, not as a
    /// call failure, since the daemon itself answered.
    fn health(&self) -> Result<Value, CallError> {
        let (associations, store_error) = match self.store.count() {
            Ok(count) => (Some(count), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Ok(serde_json::json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": env!("CARGO_PKG_VERSION"),
            "service": SERVICE_NAME,
            "object": OBJECT_PATH,
            "interface": INTERFACE_NAME,
            "db_path": self.store.db_path().display().to_string(),
            "associations": associations,
            "store_error": store_error,
        }))
    }
}
